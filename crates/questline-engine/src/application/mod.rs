//! Application services: save/load handlers and read-model queries.

pub mod command_handlers;
pub mod query_handlers;
