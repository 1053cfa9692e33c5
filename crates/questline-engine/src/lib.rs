//! Questline: quest lifecycle and signal-dispatch engine.
//!
//! A [`domain::quest::Quest`] owns an ordered list of independently authored
//! behavior units ([`domain::part::QuestPart`]). The quest derives its
//! lifecycle state, fans ticks and signals out to its parts behind a
//! per-part fault boundary, and runs a one-shot cleanup pass followed by a
//! long-horizon garbage bound once it becomes historical.

pub mod application;
pub mod domain;
