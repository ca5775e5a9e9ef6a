//! Spatial search over the tile grid
//!
//! Two interchangeable strategies answer "find up to N tiles matching a
//! predicate within an area around a point":
//! - [`SpiralSearch`] walks outward ring by ring over tiles (any grid)
//! - [`PartitionSearch`] scans only the per-bucket indexes of a [`BucketedGrid`]
//!
//! Both return coordinates sorted by Manhattan distance to the center.
//!
//! [`BucketedGrid`]: crate::game::bucketed::BucketedGrid

pub mod partition;
pub mod spiral;

pub use partition::PartitionSearch;
pub use spiral::{Spiral, SpiralSearch};

use crate::game::entity::{Entities, Sex};
use crate::game::grid::TileGrid;
use crate::game::tile::Tile;
use crate::util::coord::Coord;

/// Half extents of a search window.
///
/// The covered rectangle is `[x - rx, x + rx] x [y - ry, y + ry]`, clipped to
/// the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchArea {
    pub rx: i32,
    pub ry: i32,
}

impl SearchArea {
    pub const fn new(rx: i32, ry: i32) -> Self {
        Self { rx, ry }
    }

    /// Square window of half extent `radius`
    pub const fn square(radius: i32) -> Self {
        Self::new(radius, radius)
    }

    #[inline]
    pub fn contains(&self, center: Coord, coord: Coord) -> bool {
        coord.is_within(center, self.rx, self.ry)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rx < 0 || self.ry < 0
    }
}

/// What a search is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// A resource nobody is standing on
    Resource,
    /// A tile with neither occupant nor resource
    EmptySpace,
    /// An occupant of `sex` that is free to mate
    Mate { sex: Sex, maturity_age: u32 },
}

impl SearchKind {
    /// Predicate shared by every strategy
    #[inline]
    pub fn matches(&self, tile: &Tile, entities: &Entities) -> bool {
        match *self {
            SearchKind::Resource => tile.has_resource() && !tile.has_occupant(),
            SearchKind::EmptySpace => tile.is_empty(),
            SearchKind::Mate { sex, maturity_age } => tile
                .occupant()
                .and_then(|id| entities.get(&id))
                .is_some_and(|e| e.sex == sex && e.can_mate(maturity_age)),
        }
    }
}

/// A search strategy bound to a grid type
pub trait Search<G: TileGrid>: Send + Sync + 'static {
    /// Up to `max_find` matching coordinates within `area` of `center`,
    /// nearest (Manhattan) first. Never fails; no match is an empty `Vec`.
    fn query(
        &self,
        grid: &G,
        entities: &Entities,
        center: Coord,
        area: SearchArea,
        max_find: usize,
        kind: SearchKind,
    ) -> Vec<Coord>;
}
