//! Test world: an in-memory entity table with scripted placement answers.

use std::collections::BTreeMap;

use questline_core::entity::{EntityHandle, EntityRegistry};
use questline_core::world::{Cell, PlacementStrategy, WorldAccess};

#[derive(Debug, Clone)]
struct FakeEntity {
    label: String,
    capable: bool,
    contents: Vec<EntityHandle>,
}

/// A world holding a flat table of entities.
///
/// Placement answers are scripted per strategy with [`FakeWorld::offer`];
/// `Anywhere` resolves to the origin unless [`FakeWorld::without_fallback`]
/// was called.
#[derive(Debug, Clone)]
pub struct FakeWorld {
    entities: BTreeMap<EntityHandle, FakeEntity>,
    offers: Vec<(PlacementStrategy, Cell)>,
    fallback: Option<Cell>,
    /// Every successful placement, in order.
    pub placed: Vec<(EntityHandle, Cell)>,
    /// Every destroyed entity, in order.
    pub destroyed: Vec<EntityHandle>,
}

impl Default for FakeWorld {
    fn default() -> Self {
        Self {
            entities: BTreeMap::new(),
            offers: Vec::new(),
            fallback: Some(Cell::new(0, 0)),
            placed: Vec::new(),
            destroyed: Vec::new(),
        }
    }
}

impl FakeWorld {
    /// An empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity with the given label. Pawns start capable.
    pub fn insert(&mut self, entity: EntityHandle, label: impl Into<String>) {
        self.entities.insert(
            entity,
            FakeEntity {
                label: label.into(),
                capable: true,
                contents: Vec::new(),
            },
        );
    }

    /// Builder form of [`FakeWorld::insert`].
    #[must_use]
    pub fn with(mut self, entity: EntityHandle, label: impl Into<String>) -> Self {
        self.insert(entity, label);
        self
    }

    /// Removes an entity outright.
    pub fn remove(&mut self, entity: EntityHandle) {
        self.entities.remove(&entity);
    }

    /// Marks a pawn capable or incapable.
    pub fn set_capable(&mut self, pawn: EntityHandle, capable: bool) {
        if let Some(entry) = self.entities.get_mut(&pawn) {
            entry.capable = capable;
        }
    }

    /// Puts `inner` inside `container`.
    pub fn put_inside(&mut self, container: EntityHandle, inner: EntityHandle) {
        if let Some(entry) = self.entities.get_mut(&container) {
            entry.contents.push(inner);
        }
    }

    /// Answers `strategy` with `cell`.
    #[must_use]
    pub fn offer(mut self, strategy: PlacementStrategy, cell: Cell) -> Self {
        self.offers.push((strategy, cell));
        self
    }

    /// Makes the `Anywhere` fallback fail too.
    #[must_use]
    pub fn without_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }
}

impl WorldAccess for FakeWorld {
    fn exists(&self, entity: EntityHandle) -> bool {
        self.entities.contains_key(&entity)
    }

    fn label(&self, entity: EntityHandle) -> Option<String> {
        self.entities.get(&entity).map(|entry| entry.label.clone())
    }

    fn is_capable(&self, pawn: EntityHandle) -> bool {
        self.entities.get(&pawn).is_some_and(|entry| entry.capable)
    }

    fn contents(&self, container: EntityHandle) -> Vec<EntityHandle> {
        self.entities
            .get(&container)
            .map(|entry| entry.contents.clone())
            .unwrap_or_default()
    }

    fn destroy(&mut self, entity: EntityHandle) -> bool {
        let existed = self.entities.remove(&entity).is_some();
        if existed {
            self.destroyed.push(entity);
        }
        existed
    }

    fn find_cell(&self, strategy: &PlacementStrategy, _entity: EntityHandle) -> Option<Cell> {
        if *strategy == PlacementStrategy::Anywhere {
            return self.fallback;
        }
        self.offers
            .iter()
            .find(|(offered, _)| offered == strategy)
            .map(|(_, cell)| *cell)
    }

    fn place(&mut self, entity: EntityHandle, cell: Cell) -> bool {
        self.placed.push((entity, cell));
        true
    }
}

impl EntityRegistry for FakeWorld {
    fn contains(&self, handle: EntityHandle) -> bool {
        self.entities.contains_key(&handle)
    }
}
