//! The behavior-unit catalogue.
//!
//! Each part is a thin specialization of [`QuestPart`](super::part::QuestPart)
//! that overrides only the hooks it needs.

pub mod delay;
pub mod pawn_filter;
pub mod quest_end;
pub mod signal_relay;
pub mod spawn;
pub mod subquest_generator;
pub mod threats_generator;

pub use delay::DelayPart;
pub use pawn_filter::PawnFilterPart;
pub use quest_end::QuestEndPart;
pub use signal_relay::SignalRelayPart;
pub use spawn::SpawnPart;
pub use subquest_generator::SubquestGeneratorPart;
pub use threats_generator::{IncidentEvent, IncidentSchedule, ThreatParams, ThreatsGeneratorPart};

/// Signal argument naming the entity a signal is about.
pub const SUBJECT_ARG: &str = "SUBJECT";
