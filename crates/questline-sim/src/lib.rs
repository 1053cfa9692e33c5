//! Questline sim: the reference driver for the quest engine.
//!
//! Owns every quest, queues and delivers signals, turns subquest requests
//! into quests and runs a small sandbox scenario against a grid world.

pub mod catalogue;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod manager;
pub mod notifier;
pub mod runner;
pub mod scenario;
pub mod world;
