//! Expanding square spiral and the tile search built on it

use crate::game::entity::Entities;
use crate::game::grid::TileGrid;
use crate::game::search::{Search, SearchArea, SearchKind};
use crate::util::coord::{sort_by_nearest, Coord};

/// Lazy square spiral of offsets around `(0, 0)`.
///
/// Starts at the origin heading `(0, -1)` and turns when
/// `x == y || (x < 0 && x == -y) || (x > 0 && x == 1 - y)`. Only offsets
/// inside `(-W/2, W/2] x (-H/2, H/2]` are yielded, and the walk stops after
/// `max(W, H)^2` steps. For `Spiral::new(3, 3)`:
/// `(0,0) (1,0) (1,1) (0,1) (-1,1) (-1,0) (-1,-1) (0,-1) (1,-1)`.
#[derive(Debug, Clone)]
pub struct Spiral {
    width: i64,
    height: i64,
    x: i32,
    y: i32,
    dx: i32,
    dy: i32,
    remaining: u64,
}

impl Spiral {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0) as i64;
        let height = height.max(0) as i64;
        let side = width.max(height) as u64;
        Self {
            width,
            height,
            x: 0,
            y: 0,
            dx: 0,
            dy: -1,
            remaining: side * side,
        }
    }

    /// Spiral covering a search area, `(2rx + 1) x (2ry + 1)` offsets
    pub fn covering(area: SearchArea) -> Self {
        if area.is_empty() {
            return Self::new(0, 0);
        }
        Self::new(2 * area.rx + 1, 2 * area.ry + 1)
    }

    /// Compare doubled coordinates to keep the real-valued half bounds exact
    #[inline]
    fn inside(&self, x: i32, y: i32) -> bool {
        let (x2, y2) = (2 * x as i64, 2 * y as i64);
        -self.width < x2 && x2 <= self.width && -self.height < y2 && y2 <= self.height
    }
}

impl Iterator for Spiral {
    type Item = Coord;

    fn next(&mut self) -> Option<Coord> {
        while self.remaining > 0 {
            self.remaining -= 1;
            let (x, y) = (self.x, self.y);

            if x == y || (x < 0 && x == -y) || (x > 0 && x == 1 - y) {
                let dx = self.dx;
                self.dx = -self.dy;
                self.dy = dx;
            }
            self.x += self.dx;
            self.y += self.dy;

            if self.inside(x, y) {
                return Some(Coord::new(x, y));
            }
        }
        None
    }
}

/// Position of `offset` in the unbounded spiral walk.
///
/// Ring `k` (Chebyshev distance `k`) starts at `(k, 1 - k)` after the
/// `(2k - 1)^2` offsets of the inner rings and runs down, left, up, then right.
pub fn spiral_rank(offset: Coord) -> u64 {
    let k = offset.x.abs().max(offset.y.abs()) as i64;
    if k == 0 {
        return 0;
    }
    let (x, y) = (offset.x as i64, offset.y as i64);
    let along = if x == k && y > -k {
        y + k - 1
    } else if y == k {
        3 * k - 1 - x
    } else if x == -k {
        5 * k - 1 - y
    } else {
        7 * k - 1 + x
    };
    ((2 * k - 1) * (2 * k - 1) + along) as u64
}

/// Tile-by-tile spiral walk; works on any grid layout
#[derive(Debug, Clone, Copy, Default)]
pub struct SpiralSearch;

impl SpiralSearch {
    pub fn new() -> Self {
        Self
    }
}

impl<G: TileGrid> Search<G> for SpiralSearch {
    fn query(
        &self,
        grid: &G,
        entities: &Entities,
        center: Coord,
        area: SearchArea,
        max_find: usize,
        kind: SearchKind,
    ) -> Vec<Coord> {
        let mut found = Vec::new();
        if max_find == 0 {
            return found;
        }

        for offset in Spiral::covering(area) {
            let coord = center + offset;
            let Some(tile) = grid.tile(coord) else {
                continue;
            };
            if kind.matches(tile, entities) {
                found.push(coord);
                if found.len() >= max_find {
                    break;
                }
            }
        }

        sort_by_nearest(center, &mut found);
        found
    }
}
