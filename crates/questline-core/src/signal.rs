//! Signals: immutable tagged events with an ordered named argument bag.

use serde::{Deserialize, Serialize};

use crate::identity::QuestId;

/// A single named argument carried by a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalArg {
    /// Argument name, e.g. `SUBJECT`.
    pub name: String,
    /// Argument value.
    pub value: serde_json::Value,
}

/// Ordered, named argument bag. Insertion order is preserved and a name may
/// appear at most once; re-inserting a name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalArgs(Vec<SignalArg>);

impl SignalArgs {
    /// Creates an empty argument bag.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts or replaces an argument.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|arg| arg.name == name) {
            Some(existing) => existing.value = value,
            None => self.0.push(SignalArg { name, value }),
        }
    }

    /// Looks up an argument by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.iter().find(|arg| arg.name == name).map(|arg| &arg.value)
    }

    /// Iterates arguments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SignalArg> {
        self.0.iter()
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An immutable tagged event.
///
/// Global signals are offered to every quest. Scoped signals carry a tag of
/// the form `Quest{id}.{suffix}` and are only relevant to that quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    tag: String,
    args: SignalArgs,
    global: bool,
}

impl Signal {
    /// Creates a scoped (non-global) signal.
    #[must_use]
    pub fn new(tag: impl Into<String>, args: SignalArgs) -> Self {
        Self {
            tag: tag.into(),
            args,
            global: false,
        }
    }

    /// Creates a signal offered to every quest regardless of tag.
    #[must_use]
    pub fn global(tag: impl Into<String>, args: SignalArgs) -> Self {
        Self {
            tag: tag.into(),
            args,
            global: true,
        }
    }

    /// Creates an argument-less signal scoped to `quest_id`.
    #[must_use]
    pub fn for_quest(quest_id: QuestId, suffix: &str) -> Self {
        Self::new(quest_id.scoped_tag(suffix), SignalArgs::new())
    }

    /// The signal tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The argument bag.
    #[must_use]
    pub fn args(&self) -> &SignalArgs {
        &self.args
    }

    /// Whether the signal is offered to every quest.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.global
    }

    /// Whether this signal is relevant to `quest_id`: global, or tagged with
    /// that quest's scoped prefix.
    #[must_use]
    pub fn is_relevant_to(&self, quest_id: QuestId) -> bool {
        self.global || self.tag.starts_with(&quest_id.signal_prefix())
    }
}
