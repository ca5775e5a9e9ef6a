use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Integer grid coordinate
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const ZERO: Coord = Coord { x: 0, y: 0 };
    pub const UP: Coord = Coord { x: 0, y: -1 };
    pub const DOWN: Coord = Coord { x: 0, y: 1 };
    pub const LEFT: Coord = Coord { x: -1, y: 0 };
    pub const RIGHT: Coord = Coord { x: 1, y: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate shifted by `(dx, dy)`
    #[inline]
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// |dx| + |dy|
    #[inline]
    pub fn manhattan(&self, other: Coord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// max(|dx|, |dy|) - the spiral ring a point belongs to
    #[inline]
    pub fn chebyshev(&self, other: Coord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// True when both axes are within the given distances
    #[inline]
    pub fn is_within(&self, other: Coord, max_dx: i32, max_dy: i32) -> bool {
        (self.x - other.x).abs() <= max_dx && (self.y - other.y).abs() <= max_dy
    }

    /// Single step (each axis in -1..=1) that moves this coordinate toward `target`.
    ///
    /// Returns `Coord::ZERO` once the target is reached.
    #[inline]
    pub fn step_toward(&self, target: Coord) -> Coord {
        Coord {
            x: (target.x - self.x).signum(),
            y: (target.y - self.y).signum(),
        }
    }

    /// Canonical 64-bit key, unique for every `i32` pair
    #[inline]
    pub fn key(&self) -> u64 {
        ((self.x as u32 as u64) << 32) | (self.y as u32 as u64)
    }

    /// Inverse of [`Coord::key`]
    #[inline]
    pub fn from_key(key: u64) -> Self {
        Self {
            x: (key >> 32) as u32 as i32,
            y: key as u32 as i32,
        }
    }
}

/// Sort coordinates by Manhattan distance to `center`.
///
/// The sort is stable: equally distant coordinates keep the order in which
/// they were discovered.
pub fn sort_by_nearest(center: Coord, coords: &mut [Coord]) {
    coords.sort_by_key(|c| c.manhattan(center));
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl Add for Coord {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Coord {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Neg for Coord {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl AddAssign for Coord {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Coord {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Coord::new(3, -2);
        let b = Coord::new(1, 5);
        assert_eq!(a + b, Coord::new(4, 3));
        assert_eq!(a - b, Coord::new(2, -7));
        assert_eq!(-a, Coord::new(-3, 2));

        let mut c = a;
        c += Coord::RIGHT;
        assert_eq!(c, Coord::new(4, -2));
        c -= Coord::DOWN;
        assert_eq!(c, Coord::new(4, -3));
    }

    #[test]
    fn test_distances() {
        let a = Coord::new(0, 0);
        let b = Coord::new(3, -4);
        assert_eq!(a.manhattan(b), 7);
        assert_eq!(a.chebyshev(b), 4);
        assert!(a.is_within(b, 3, 4));
        assert!(!a.is_within(b, 2, 4));
    }

    #[test]
    fn test_step_toward() {
        let from = Coord::new(5, 5);
        assert_eq!(from.step_toward(Coord::new(9, 5)), Coord::new(1, 0));
        assert_eq!(from.step_toward(Coord::new(1, 1)), Coord::new(-1, -1));
        assert_eq!(from.step_toward(Coord::new(5, 6)), Coord::new(0, 1));
        assert_eq!(from.step_toward(from), Coord::ZERO);
    }

    #[test]
    fn test_key_is_unique_and_reversible() {
        let coords = [
            Coord::new(0, 0),
            Coord::new(-1, 0),
            Coord::new(0, -1),
            Coord::new(2999, 2999),
            Coord::new(i32::MIN, i32::MAX),
        ];
        let keys: std::collections::HashSet<u64> = coords.iter().map(|c| c.key()).collect();
        assert_eq!(keys.len(), coords.len());
        for c in coords {
            assert_eq!(Coord::from_key(c.key()), c);
        }
    }

    #[test]
    fn test_sort_by_nearest_is_stable() {
        let center = Coord::new(0, 0);
        let mut coords = vec![
            Coord::new(3, 0),
            Coord::new(0, 1),
            Coord::new(-1, 0),
            Coord::new(1, 1),
            Coord::new(0, -1),
        ];
        sort_by_nearest(center, &mut coords);
        assert_eq!(
            coords,
            vec![
                Coord::new(0, 1),
                Coord::new(-1, 0),
                Coord::new(0, -1),
                Coord::new(1, 1),
                Coord::new(3, 0),
            ]
        );
    }
}
