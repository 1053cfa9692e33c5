//! Persisted layout of quests and parts.
//!
//! Records hold raw fields and entity handles only. Loading is two-phase:
//! [`PersistentAggregate::from_record`](questline_core::aggregate::PersistentAggregate::from_record)
//! rebuilds the quest, then `resolve_references` checks every handle against
//! the live registry.

use std::collections::BTreeSet;

use questline_core::entity::EntityHandle;
use questline_core::error::DomainError;
use questline_core::identity::{PartId, QuestId};
use serde::{Deserialize, Serialize};

use super::part::QuestPart;
use super::parts::{
    DelayPart, PawnFilterPart, QuestEndPart, SignalRelayPart, SpawnPart, SubquestGeneratorPart,
    ThreatsGeneratorPart,
};
use super::state::EndOutcome;

/// Persisted form of a [`Quest`](super::quest::Quest).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct QuestRecord {
    pub version: u32,
    pub id: QuestId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub points: f32,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub script: Option<String>,
    pub appearance_tick: i64,
    pub acceptance_tick: i64,
    pub ticks_until_acceptance_expiry: i64,
    #[serde(default)]
    pub initially_accepted: bool,
    #[serde(default)]
    pub dismissed: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub hide_on_cleanup: bool,
    #[serde(default)]
    pub hidden_in_ui: bool,
    pub ended: bool,
    pub end_outcome: EndOutcome,
    pub cleaned_up: bool,
    pub cleanup_tick: i64,
    #[serde(default)]
    pub parent: Option<QuestId>,
    #[serde(default)]
    pub accepter: Option<EntityHandle>,
    #[serde(default)]
    pub accepter_label: Option<String>,
    #[serde(default)]
    pub added_signal_sent: bool,
    #[serde(default)]
    pub initiate_signal_sent: bool,
    #[serde(default)]
    pub pending_subquests: Vec<String>,
    /// Id the next attached part receives.
    #[serde(default)]
    pub next_part_id: u32,
    #[serde(default)]
    pub parts: Vec<PartSlot>,
}

/// One attached part together with the id it had when saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartSlot {
    pub id: PartId,
    pub part: PartRecord,
}

/// Persisted form of one part, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PartRecord {
    Delay(DelayPart),
    PawnFilter(PawnFilterPart),
    Spawn(SpawnPart),
    SubquestGenerator(SubquestGeneratorPart),
    SignalRelay(SignalRelayPart),
    ThreatsGenerator(ThreatsGeneratorPart),
    QuestEnd(QuestEndPart),
    /// A part kind defined outside this crate.
    Custom {
        /// Kind name understood by a [`CustomPartFactory`].
        name: String,
        /// Opaque part state.
        #[serde(default)]
        state: serde_json::Value,
    },
}

impl PartialEq for PartRecord {
    fn eq(&self, other: &Self) -> bool {
        serde_json::to_value(self).ok() == serde_json::to_value(other).ok()
    }
}

impl PartRecord {
    /// Rebuilds the part, detached.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Serialization` for a custom kind `factory`
    /// cannot build.
    pub fn into_part(
        self,
        factory: &dyn CustomPartFactory,
    ) -> Result<Box<dyn QuestPart>, DomainError> {
        let mut part: Box<dyn QuestPart> = match self {
            PartRecord::Delay(part) => Box::new(part),
            PartRecord::PawnFilter(part) => Box::new(part),
            PartRecord::Spawn(part) => Box::new(part),
            PartRecord::SubquestGenerator(part) => Box::new(part),
            PartRecord::SignalRelay(part) => Box::new(part),
            PartRecord::ThreatsGenerator(part) => Box::new(part),
            PartRecord::QuestEnd(part) => Box::new(part),
            PartRecord::Custom { name, state } => factory.build(&name, &state).ok_or_else(|| {
                DomainError::Serialization(format!("unknown custom part kind `{name}`"))
            })?,
        };
        part.base_mut().detach();
        Ok(part)
    }
}

/// Builds parts whose kinds live outside this crate.
pub trait CustomPartFactory {
    /// Builds the part named `name` from `state`, or `None` if unknown.
    fn build(&self, name: &str, state: &serde_json::Value) -> Option<Box<dyn QuestPart>>;
}

/// Factory that knows no custom kinds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCustomParts;

impl CustomPartFactory for NoCustomParts {
    fn build(&self, _name: &str, _state: &serde_json::Value) -> Option<Box<dyn QuestPart>> {
        None
    }
}
