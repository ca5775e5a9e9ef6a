//! Grid cells and the inert resources they hold

use serde::{Deserialize, Serialize};

use crate::game::entity::EntityId;

/// Resource identifier, unique per world
pub type ResourceId = u64;

/// Inert consumable (food) with an energy yield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub energy: i32,
}

impl Resource {
    pub fn new(id: ResourceId, energy: i32) -> Self {
        Self { id, energy }
    }

    /// Standard food item
    pub fn potato(id: ResourceId) -> Self {
        Self::new(id, crate::game::constants::resource::POTATO_ENERGY)
    }
}

/// A single grid cell: at most one occupant and at most one resource.
///
/// Tiles are owned by exactly one grid and only change through the grid's
/// insert/remove methods, which keep the occupant's cached position in sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tile {
    pub(crate) occupant: Option<EntityId>,
    pub(crate) resource: Option<Resource>,
}

impl Tile {
    #[inline]
    pub fn occupant(&self) -> Option<EntityId> {
        self.occupant
    }

    #[inline]
    pub fn resource(&self) -> Option<&Resource> {
        self.resource.as_ref()
    }

    #[inline]
    pub fn has_occupant(&self) -> bool {
        self.occupant.is_some()
    }

    #[inline]
    pub fn has_resource(&self) -> bool {
        self.resource.is_some()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occupant.is_none() && self.resource.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tile_is_empty() {
        let tile = Tile::default();
        assert!(tile.is_empty());
        assert!(!tile.has_occupant());
        assert!(!tile.has_resource());
    }

    #[test]
    fn test_tile_contents() {
        let tile = Tile {
            occupant: Some(7),
            resource: Some(Resource::potato(3)),
        };
        assert!(!tile.is_empty());
        assert_eq!(tile.occupant(), Some(7));
        assert_eq!(tile.resource().map(|r| r.id), Some(3));
        assert_eq!(
            tile.resource().map(|r| r.energy),
            Some(crate::game::constants::resource::POTATO_ENERGY)
        );
    }
}
