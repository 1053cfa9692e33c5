//! Borrowed references to world entities.
//!
//! Quests and parts never own world entities. They hold an [`EntityHandle`]
//! that may stop resolving at any time; consumers must treat a missing
//! referent as `None`, never as an error.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a referenced entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A character.
    Pawn,
    /// A faction.
    Faction,
    /// A transport (shuttle, caravan, pod group).
    Transport,
    /// An object on the world map.
    WorldObject,
    /// Any other placeable thing.
    Thing,
}

/// Resolvable handle to a world entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityHandle {
    /// Entity category.
    pub kind: EntityKind,
    /// Identifier unique within the category.
    pub id: u64,
}

impl EntityHandle {
    /// Handle to a pawn.
    #[must_use]
    pub const fn pawn(id: u64) -> Self {
        Self {
            kind: EntityKind::Pawn,
            id,
        }
    }

    /// Handle to a faction.
    #[must_use]
    pub const fn faction(id: u64) -> Self {
        Self {
            kind: EntityKind::Faction,
            id,
        }
    }

    /// Handle to a transport.
    #[must_use]
    pub const fn transport(id: u64) -> Self {
        Self {
            kind: EntityKind::Transport,
            id,
        }
    }

    /// Handle to a world object.
    #[must_use]
    pub const fn world_object(id: u64) -> Self {
        Self {
            kind: EntityKind::WorldObject,
            id,
        }
    }

    /// Handle to a thing.
    #[must_use]
    pub const fn thing(id: u64) -> Self {
        Self {
            kind: EntityKind::Thing,
            id,
        }
    }

    /// Encodes the handle as a signal argument value.
    #[must_use]
    pub fn to_arg(self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Decodes a handle from a signal argument value.
    #[must_use]
    pub fn from_arg(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.kind, self.id)
    }
}

/// Live entity registry consulted when resolving handles after a load.
pub trait EntityRegistry {
    /// Whether the referent still exists.
    fn contains(&self, handle: EntityHandle) -> bool;
}

/// Phase-two reference resolver.
///
/// Substitutes `None` for handles whose referent is absent and logs each
/// missing handle once per load.
pub struct ReferenceResolver<'a> {
    registry: &'a dyn EntityRegistry,
    missing: BTreeSet<EntityHandle>,
}

impl fmt::Debug for ReferenceResolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceResolver")
            .field("missing", &self.missing)
            .finish_non_exhaustive()
    }
}

impl<'a> ReferenceResolver<'a> {
    /// Creates a resolver over `registry`.
    #[must_use]
    pub fn new(registry: &'a dyn EntityRegistry) -> Self {
        Self {
            registry,
            missing: BTreeSet::new(),
        }
    }

    /// Resolves a single handle.
    pub fn resolve(&mut self, handle: EntityHandle) -> Option<EntityHandle> {
        if self.registry.contains(handle) {
            return Some(handle);
        }
        if self.missing.insert(handle) {
            tracing::warn!(%handle, "referenced entity missing at load; substituting none");
        }
        None
    }

    /// Resolves an optional handle in place.
    pub fn resolve_opt(&mut self, slot: &mut Option<EntityHandle>) {
        if let Some(handle) = *slot {
            *slot = self.resolve(handle);
        }
    }

    /// Resolves a list of handles, dropping the missing ones.
    pub fn resolve_all(&mut self, handles: &mut Vec<EntityHandle>) {
        let registry = self.registry;
        let missing = &mut self.missing;
        handles.retain(|handle| {
            if registry.contains(*handle) {
                return true;
            }
            if missing.insert(*handle) {
                tracing::warn!(%handle, "referenced entity missing at load; dropping reference");
            }
            false
        });
    }

    /// Handles that failed to resolve, sorted.
    #[must_use]
    pub fn missing(&self) -> Vec<EntityHandle> {
        self.missing.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Only(Vec<EntityHandle>);

    impl EntityRegistry for Only {
        fn contains(&self, handle: EntityHandle) -> bool {
            self.0.contains(&handle)
        }
    }

    #[test]
    fn test_resolver_substitutes_none_for_missing_handles() {
        // Arrange
        let registry = Only(vec![EntityHandle::pawn(1)]);
        let mut resolver = ReferenceResolver::new(&registry);
        let mut present = Some(EntityHandle::pawn(1));
        let mut absent = Some(EntityHandle::pawn(2));

        // Act
        resolver.resolve_opt(&mut present);
        resolver.resolve_opt(&mut absent);

        // Assert
        assert_eq!(present, Some(EntityHandle::pawn(1)));
        assert_eq!(absent, None);
        assert_eq!(resolver.missing(), vec![EntityHandle::pawn(2)]);
    }

    #[test]
    fn test_resolver_records_each_missing_handle_once() {
        let registry = Only(vec![]);
        let mut resolver = ReferenceResolver::new(&registry);
        let mut handles = vec![EntityHandle::faction(3), EntityHandle::faction(3)];

        resolver.resolve_all(&mut handles);
        let again = resolver.resolve(EntityHandle::faction(3));

        assert!(handles.is_empty());
        assert!(again.is_none());
        assert_eq!(resolver.missing().len(), 1);
    }

    #[test]
    fn test_handle_round_trips_through_signal_arg() {
        let handle = EntityHandle::transport(9);

        assert_eq!(EntityHandle::from_arg(&handle.to_arg()), Some(handle));
        assert_eq!(EntityHandle::from_arg(&serde_json::json!("nope")), None);
    }
}
