//! Domain model: the quest aggregate, its parts and their records.

pub mod activable;
pub mod env;
pub mod fault;
pub mod part;
pub mod parts;
pub mod quest;
pub mod record;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
