//! World query and placement boundary.
//!
//! The engine treats the world as opaque. Only behavior units that inspect
//! pawns or place things call into it.

use serde::{Deserialize, Serialize};

use crate::entity::EntityHandle;

/// A map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Column.
    pub x: i32,
    /// Row.
    pub z: i32,
}

impl Cell {
    /// Creates a cell.
    #[must_use]
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

/// One step of a placement fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// A cell chosen by the content author.
    ExplicitCell {
        /// The requested cell.
        cell: Cell,
    },
    /// The map's designated landing zone.
    LandingZone,
    /// Adjacent to another entity.
    NearEntity {
        /// The anchor entity.
        anchor: EntityHandle,
    },
    /// A safe-spot search from the map edge inwards.
    SafeSpot,
    /// Any standable cell; the unconditional last resort.
    Anywhere,
}

/// World services consumed by behavior units.
pub trait WorldAccess {
    /// Whether the entity still exists in the world.
    fn exists(&self, entity: EntityHandle) -> bool;

    /// Display label for an entity, if known.
    fn label(&self, entity: EntityHandle) -> Option<String>;

    /// Whether a pawn is alive, present and able to fight.
    fn is_capable(&self, pawn: EntityHandle) -> bool;

    /// Entities held inside a container, in storage order.
    fn contents(&self, container: EntityHandle) -> Vec<EntityHandle>;

    /// Removes an entity from the world. Returns whether anything was removed.
    fn destroy(&mut self, entity: EntityHandle) -> bool;

    /// Resolves a cell for `entity` using a single strategy.
    fn find_cell(&self, strategy: &PlacementStrategy, entity: EntityHandle) -> Option<Cell>;

    /// Places a pre-built entity at `cell`. Returns whether it was placed.
    fn place(&mut self, entity: EntityHandle, cell: Cell) -> bool;
}
