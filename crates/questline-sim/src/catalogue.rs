//! Named quest scripts the driver can instantiate as subquests.

use std::collections::BTreeMap;

use questline_core::error::DomainError;
use questline_core::identity::QuestId;
use questline_engine::domain::quest::Quest;

use crate::world::SandboxWorld;

/// Builds a quest with id `QuestId`, appearing at the given tick. The script
/// may register the entities it needs in the world.
pub type QuestScript = fn(QuestId, i64, &mut SandboxWorld) -> Result<Quest, DomainError>;

/// Registry of quest scripts by name.
#[derive(Debug, Default, Clone)]
pub struct ScriptCatalogue {
    scripts: BTreeMap<String, QuestScript>,
}

impl ScriptCatalogue {
    /// An empty catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `script` under `name`, replacing any earlier entry.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, script: QuestScript) -> Self {
        self.scripts.insert(name.into(), script);
        self
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }

    /// Runs the script `name` and stamps the result with it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an unknown script, or whatever
    /// the script itself returns.
    pub fn build(
        &self,
        name: &str,
        id: QuestId,
        tick: i64,
        world: &mut SandboxWorld,
    ) -> Result<Quest, DomainError> {
        let script = self
            .scripts
            .get(name)
            .ok_or_else(|| DomainError::Validation(format!("unknown quest script {name:?}")))?;
        Ok(script(id, tick, world)?.with_script(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errand(id: QuestId, tick: i64, _world: &mut SandboxWorld) -> Result<Quest, DomainError> {
        Ok(Quest::new(id, "Errand", tick))
    }

    #[test]
    fn test_build_stamps_script_name() {
        // Arrange
        let catalogue = ScriptCatalogue::new().with("errand", errand);
        let mut world = SandboxWorld::new(4, 4);

        // Act
        let quest = catalogue.build("errand", QuestId(5), 30, &mut world).unwrap();

        // Assert
        assert_eq!(quest.id(), QuestId(5));
        assert_eq!(quest.script(), Some("errand"));
        assert_eq!(quest.appearance_tick(), 30);
        assert_eq!(catalogue.names().collect::<Vec<_>>(), vec!["errand"]);
    }

    #[test]
    fn test_unknown_script_is_a_validation_error() {
        // Arrange
        let catalogue = ScriptCatalogue::new();
        let mut world = SandboxWorld::new(4, 4);

        // Act
        let result = catalogue.build("missing", QuestId(1), 0, &mut world);

        // Assert
        assert!(!catalogue.contains("missing"));
        match result {
            Err(DomainError::Validation(message)) => assert!(message.contains("missing")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
