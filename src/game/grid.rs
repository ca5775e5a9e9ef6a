//! Tile grid abstraction shared by the dense and bucketed layouts

use crate::game::entity::Entity;
use crate::game::tile::{Resource, Tile};
use crate::util::coord::Coord;

/// A bounded `[0, width) x [0, height)` grid of tiles.
///
/// Mutations report failure with `false`/`None` instead of panicking:
/// contention between movers and out-of-bounds targets are normal outcomes.
pub trait TileGrid: Send + Sync + 'static {
    fn width(&self) -> i32;

    fn height(&self) -> i32;

    #[inline]
    fn contains(&self, coord: Coord) -> bool {
        coord.x >= 0 && coord.y >= 0 && coord.x < self.width() && coord.y < self.height()
    }

    /// Tile at `coord`, `None` when outside the grid
    fn tile(&self, coord: Coord) -> Option<&Tile>;

    /// Place `entity` on an empty occupant slot and update its cached position
    fn insert_occupant(&mut self, coord: Coord, entity: &mut Entity) -> bool;

    /// Clear the occupant slot at `coord`
    fn remove_occupant(&mut self, coord: Coord) -> bool;

    /// Place a resource on a tile with no resource
    fn insert_resource(&mut self, coord: Coord, resource: Resource) -> bool;

    /// Take the resource at `coord`
    fn remove_resource(&mut self, coord: Coord) -> Option<Resource>;

    /// Visit every tile in row-major order
    fn for_each_tile(&self, f: &mut dyn FnMut(Coord, &Tile));

    /// Total number of tiles
    fn tile_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Number of tiles holding a resource
    fn resource_count(&self) -> usize {
        let mut count = 0;
        self.for_each_tile(&mut |_, tile| {
            if tile.has_resource() {
                count += 1;
            }
        });
        count
    }
}

#[cfg(test)]
pub(crate) mod conformance {
    //! Behaviour every `TileGrid` implementation must share

    use super::*;
    use crate::game::entity::Sex;

    pub fn check_occupancy<G: TileGrid>(grid: &mut G) {
        let mut a = Entity::new(1, Sex::Male, 10);
        let mut b = Entity::new(2, Sex::Female, 10);
        let spot = Coord::new(2, 3);

        assert!(grid.insert_occupant(spot, &mut a));
        assert_eq!(a.position(), spot);
        assert_eq!(grid.tile(spot).and_then(|t| t.occupant()), Some(1));

        // Occupied slot rejects a second entity and leaves it untouched
        b.position = Coord::new(9, 9);
        assert!(!grid.insert_occupant(spot, &mut b));
        assert_eq!(b.position(), Coord::new(9, 9));

        assert!(grid.remove_occupant(spot));
        assert!(!grid.remove_occupant(spot));
        assert!(grid.insert_occupant(spot, &mut b));
        assert_eq!(grid.tile(spot).and_then(|t| t.occupant()), Some(2));
    }

    pub fn check_bounds<G: TileGrid>(grid: &mut G) {
        let mut e = Entity::new(1, Sex::Male, 10);
        let w = grid.width();
        let h = grid.height();
        for outside in [Coord::new(-1, 0), Coord::new(0, -1), Coord::new(w, 0), Coord::new(0, h)] {
            assert!(!grid.contains(outside));
            assert!(grid.tile(outside).is_none());
            assert!(!grid.insert_occupant(outside, &mut e));
            assert!(!grid.remove_occupant(outside));
            assert!(!grid.insert_resource(outside, Resource::potato(1)));
            assert!(grid.remove_resource(outside).is_none());
        }
        assert!(grid.contains(Coord::new(w - 1, h - 1)));
    }

    pub fn check_resources<G: TileGrid>(grid: &mut G) {
        let spot = Coord::new(1, 1);
        assert!(grid.insert_resource(spot, Resource::potato(5)));
        assert!(!grid.insert_resource(spot, Resource::potato(6)));
        assert_eq!(grid.resource_count(), 1);

        // A tile can hold an occupant and a resource at once
        let mut e = Entity::new(1, Sex::Male, 10);
        assert!(grid.insert_occupant(spot, &mut e));
        assert_eq!(grid.remove_resource(spot).map(|r| r.id), Some(5));
        assert!(grid.remove_resource(spot).is_none());
        assert_eq!(grid.resource_count(), 0);
        assert!(grid.tile(spot).is_some_and(|t| t.has_occupant()));
    }

    pub fn check_traversal<G: TileGrid>(grid: &G) {
        let mut visited = Vec::new();
        grid.for_each_tile(&mut |coord, _| visited.push(coord));
        assert_eq!(visited.len(), grid.tile_count());
        assert_eq!(visited.first(), Some(&Coord::new(0, 0)));
        assert_eq!(visited.get(1), Some(&Coord::new(1, 0)));
        assert_eq!(
            visited.last(),
            Some(&Coord::new(grid.width() - 1, grid.height() - 1))
        );
    }
}
