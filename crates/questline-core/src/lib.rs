//! Questline Core: shared abstractions for the quest engine.
//!
//! This crate defines the identifiers, value types and collaborator traits
//! that the engine, its driver and its test doubles all depend on. It
//! contains no quest logic and no infrastructure code.

pub mod aggregate;
pub mod directory;
pub mod dispatcher;
pub mod entity;
pub mod error;
pub mod identity;
pub mod notify;
pub mod repository;
pub mod rng;
pub mod signal;
pub mod world;
