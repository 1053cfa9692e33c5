//! A small grid world the simulation runs quests against.

use std::collections::BTreeMap;

use questline_core::entity::{EntityHandle, EntityKind, EntityRegistry};
use questline_core::world::{Cell, PlacementStrategy, WorldAccess};

/// How far `NearEntity` searches around its anchor.
const NEAR_RADIUS: i32 = 3;

#[derive(Debug, Clone)]
struct SandboxEntity {
    label: String,
    capable: bool,
    position: Option<Cell>,
    contents: Vec<EntityHandle>,
}

/// Rectangular map holding labelled entities, some of them placed on cells.
///
/// Only one placed entity may occupy a cell. Entities held inside a container
/// are never placed themselves. Destroyed entities are queued as discarded
/// so the manager can tell every quest about them.
#[derive(Debug, Clone)]
pub struct SandboxWorld {
    width: i32,
    height: i32,
    landing_zone: Option<Cell>,
    entities: BTreeMap<EntityHandle, SandboxEntity>,
    discarded: Vec<(EntityHandle, String)>,
}

impl SandboxWorld {
    /// An empty `width` by `height` map without a landing zone.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            landing_zone: None,
            entities: BTreeMap::new(),
            discarded: Vec::new(),
        }
    }

    /// Designates `cell` as the landing zone.
    #[must_use]
    pub fn with_landing_zone(mut self, cell: Cell) -> Self {
        self.landing_zone = Some(cell);
        self
    }

    /// Registers an unplaced entity. Pawns start capable. Re-adding a handle
    /// replaces its label and keeps everything else.
    pub fn add(&mut self, entity: EntityHandle, label: impl Into<String>) {
        let label = label.into();
        self.entities
            .entry(entity)
            .and_modify(|existing| existing.label.clone_from(&label))
            .or_insert_with(|| SandboxEntity {
                label,
                capable: entity.kind == EntityKind::Pawn,
                position: None,
                contents: Vec::new(),
            });
    }

    /// Registers `entity` and places it at `cell`. Returns whether placement
    /// succeeded.
    pub fn add_at(&mut self, entity: EntityHandle, label: impl Into<String>, cell: Cell) -> bool {
        self.add(entity, label);
        self.place(entity, cell)
    }

    /// Registers `inner` inside `container`.
    pub fn add_inside(
        &mut self,
        container: EntityHandle,
        inner: EntityHandle,
        label: impl Into<String>,
    ) {
        self.add(inner, label);
        if let Some(entry) = self
            .entities
            .get_mut(&container)
            .filter(|entry| !entry.contents.contains(&inner))
        {
            entry.contents.push(inner);
        }
    }

    /// Marks a pawn capable or incapable.
    pub fn set_capable(&mut self, pawn: EntityHandle, capable: bool) {
        if let Some(entry) = self.entities.get_mut(&pawn) {
            entry.capable = capable;
        }
    }

    /// Where `entity` stands, if placed.
    #[must_use]
    pub fn position(&self, entity: EntityHandle) -> Option<Cell> {
        self.entities.get(&entity).and_then(|entry| entry.position)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Drains the entities destroyed since the last call, with their labels.
    pub fn take_discarded(&mut self) -> Vec<(EntityHandle, String)> {
        std::mem::take(&mut self.discarded)
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        (0..self.width).contains(&cell.x) && (0..self.height).contains(&cell.z)
    }

    fn occupant(&self, cell: Cell) -> Option<EntityHandle> {
        self.entities
            .iter()
            .find(|(_, entry)| entry.position == Some(cell))
            .map(|(handle, _)| *handle)
    }

    fn is_free(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && self.occupant(cell).is_none()
    }

    fn ring(center: Cell, radius: i32) -> impl Iterator<Item = Cell> {
        (-radius..=radius).flat_map(move |dz| {
            (-radius..=radius)
                .filter(move |dx| dx.abs().max(dz.abs()) == radius)
                .map(move |dx| Cell::new(center.x + dx, center.z + dz))
        })
    }

    fn near(&self, anchor: Cell) -> Option<Cell> {
        (1..=NEAR_RADIUS)
            .flat_map(|radius| Self::ring(anchor, radius))
            .find(|cell| self.is_free(*cell))
    }

    /// Walks inward from the map edge, skipping the edge itself.
    fn safe_spot(&self) -> Option<Cell> {
        let depth = self.width.min(self.height) / 2;
        (1..depth).find_map(|inset| {
            (inset..self.height - inset)
                .flat_map(|z| (inset..self.width - inset).map(move |x| Cell::new(x, z)))
                .filter(|cell| {
                    let from_edge = cell
                        .x
                        .min(cell.z)
                        .min(self.width - 1 - cell.x)
                        .min(self.height - 1 - cell.z);
                    from_edge == inset
                })
                .find(|cell| self.is_free(*cell))
        })
    }

    fn anywhere(&self) -> Option<Cell> {
        (0..self.height)
            .flat_map(|z| (0..self.width).map(move |x| Cell::new(x, z)))
            .find(|cell| self.is_free(*cell))
    }
}

impl WorldAccess for SandboxWorld {
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
        let Some(entry) = self.entities.remove(&entity) else {
            return false;
        };
        for other in self.entities.values_mut() {
            other.contents.retain(|inner| *inner != entity);
        }
        tracing::debug!(%entity, label = %entry.label, "entity destroyed");
        self.discarded.push((entity, entry.label));
        true
    }

    fn find_cell(&self, strategy: &PlacementStrategy, _entity: EntityHandle) -> Option<Cell> {
        match strategy {
            PlacementStrategy::ExplicitCell { cell } => Some(*cell).filter(|c| self.is_free(*c)),
            PlacementStrategy::LandingZone => self.landing_zone.filter(|c| self.is_free(*c)),
            PlacementStrategy::NearEntity { anchor } => {
                self.position(*anchor).and_then(|at| self.near(at))
            }
            PlacementStrategy::SafeSpot => self.safe_spot(),
            PlacementStrategy::Anywhere => self.anywhere(),
        }
    }

    fn place(&mut self, entity: EntityHandle, cell: Cell) -> bool {
        if !self.in_bounds(cell) || self.occupant(cell).is_some_and(|other| other != entity) {
            return false;
        }
        // Unplaced quest entities may predate this world (a resumed save);
        // placing one registers it.
        let entry = self.entities.entry(entity).or_insert_with(|| SandboxEntity {
            label: entity.to_string(),
            capable: entity.kind == EntityKind::Pawn,
            position: None,
            contents: Vec::new(),
        });
        entry.position = Some(cell);
        true
    }
}

impl EntityRegistry for SandboxWorld {
    fn contains(&self, handle: EntityHandle) -> bool {
        self.entities.contains_key(&handle)
    }
}
