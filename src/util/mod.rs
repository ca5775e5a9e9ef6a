pub mod coord;

pub use coord::{sort_by_nearest, Coord};
