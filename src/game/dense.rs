//! Flat row-major tile grid

use crate::game::entity::Entity;
use crate::game::grid::TileGrid;
use crate::game::tile::{Resource, Tile};
use crate::util::coord::Coord;

/// Every tile in one contiguous `Vec`, indexed `y * width + x`
pub struct DenseGrid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl DenseGrid {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            tiles: vec![Tile::default(); width as usize * height as usize],
        }
    }

    #[inline]
    fn index(&self, coord: Coord) -> Option<usize> {
        self.contains(coord)
            .then(|| coord.y as usize * self.width as usize + coord.x as usize)
    }

    #[inline]
    fn tile_mut(&mut self, coord: Coord) -> Option<&mut Tile> {
        let index = self.index(coord)?;
        self.tiles.get_mut(index)
    }
}

impl TileGrid for DenseGrid {
    #[inline]
    fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    fn tile(&self, coord: Coord) -> Option<&Tile> {
        self.tiles.get(self.index(coord)?)
    }

    fn insert_occupant(&mut self, coord: Coord, entity: &mut Entity) -> bool {
        match self.tile_mut(coord) {
            Some(tile) if tile.occupant.is_none() => {
                tile.occupant = Some(entity.id);
                entity.position = coord;
                true
            }
            _ => false,
        }
    }

    fn remove_occupant(&mut self, coord: Coord) -> bool {
        self.tile_mut(coord)
            .and_then(|tile| tile.occupant.take())
            .is_some()
    }

    fn insert_resource(&mut self, coord: Coord, resource: Resource) -> bool {
        match self.tile_mut(coord) {
            Some(tile) if tile.resource.is_none() => {
                tile.resource = Some(resource);
                true
            }
            _ => false,
        }
    }

    fn remove_resource(&mut self, coord: Coord) -> Option<Resource> {
        self.tile_mut(coord)?.resource.take()
    }

    fn for_each_tile(&self, f: &mut dyn FnMut(Coord, &Tile)) {
        if self.width == 0 {
            return;
        }
        for (i, tile) in self.tiles.iter().enumerate() {
            let x = (i % self.width as usize) as i32;
            let y = (i / self.width as usize) as i32;
            f(Coord::new(x, y), tile);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::grid::conformance;

    #[test]
    fn test_dense_occupancy() {
        conformance::check_occupancy(&mut DenseGrid::new(10, 10));
    }

    #[test]
    fn test_dense_bounds() {
        conformance::check_bounds(&mut DenseGrid::new(7, 4));
    }

    #[test]
    fn test_dense_resources() {
        conformance::check_resources(&mut DenseGrid::new(5, 5));
    }

    #[test]
    fn test_dense_traversal() {
        conformance::check_traversal(&DenseGrid::new(6, 3));
    }

    #[test]
    fn test_dense_empty_grid() {
        let grid = DenseGrid::new(0, 0);
        assert_eq!(grid.tile_count(), 0);
        assert!(grid.tile(Coord::ZERO).is_none());
        let mut visits = 0;
        grid.for_each_tile(&mut |_, _| visits += 1);
        assert_eq!(visits, 0);
    }
}
