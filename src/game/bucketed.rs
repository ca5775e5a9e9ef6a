//! Bucketed tile grid with per-bucket occupant and resource indexes
//!
//! The world is split into fixed-size buckets (edge buckets are clipped).
//! Each bucket owns its tiles plus two small hash indexes, so a partition
//! search only needs to look at the entries of the buckets it covers instead
//! of every tile in the search area.

use rustc_hash::FxHashMap;

use crate::game::entity::{Entity, EntityId};
use crate::game::grid::TileGrid;
use crate::game::tile::{Resource, ResourceId, Tile};
use crate::util::coord::Coord;

/// A rectangular block of tiles
pub struct Bucket {
    origin: Coord,
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    occupants: FxHashMap<EntityId, Coord>,
    resources: FxHashMap<ResourceId, Coord>,
}

impl Bucket {
    fn new(origin: Coord, width: i32, height: i32) -> Self {
        Self {
            origin,
            width,
            height,
            tiles: vec![Tile::default(); width as usize * height as usize],
            occupants: FxHashMap::default(),
            resources: FxHashMap::default(),
        }
    }

    #[inline]
    fn local_index(&self, coord: Coord) -> usize {
        let local = coord - self.origin;
        local.y as usize * self.width as usize + local.x as usize
    }

    /// Top-left world coordinate of the bucket
    pub fn origin(&self) -> Coord {
        self.origin
    }

    /// Occupants registered in this bucket
    pub fn occupants(&self) -> impl Iterator<Item = (EntityId, Coord)> + '_ {
        self.occupants.iter().map(|(id, coord)| (*id, *coord))
    }

    /// Resources registered in this bucket
    pub fn resources(&self) -> impl Iterator<Item = (ResourceId, Coord)> + '_ {
        self.resources.iter().map(|(id, coord)| (*id, *coord))
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants.len()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }
}

/// Tile grid partitioned into `bucket_width x bucket_height` buckets
pub struct BucketedGrid {
    width: i32,
    height: i32,
    bucket_width: i32,
    bucket_height: i32,
    buckets_x: i32,
    buckets_y: i32,
    buckets: Vec<Bucket>,
}

impl BucketedGrid {
    pub fn new(width: i32, height: i32, bucket_width: i32, bucket_height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let bucket_width = bucket_width.max(1);
        let bucket_height = bucket_height.max(1);
        let buckets_x = (width + bucket_width - 1) / bucket_width;
        let buckets_y = (height + bucket_height - 1) / bucket_height;

        let mut buckets = Vec::with_capacity(buckets_x as usize * buckets_y as usize);
        for by in 0..buckets_y {
            for bx in 0..buckets_x {
                let origin = Coord::new(bx * bucket_width, by * bucket_height);
                let w = bucket_width.min(width - origin.x);
                let h = bucket_height.min(height - origin.y);
                buckets.push(Bucket::new(origin, w, h));
            }
        }

        Self {
            width,
            height,
            bucket_width,
            bucket_height,
            buckets_x,
            buckets_y,
            buckets,
        }
    }

    pub fn bucket_width(&self) -> i32 {
        self.bucket_width
    }

    pub fn bucket_height(&self) -> i32 {
        self.bucket_height
    }

    /// Number of bucket columns and rows
    pub fn bucket_dimensions(&self) -> (i32, i32) {
        (self.buckets_x, self.buckets_y)
    }

    /// Bucket column and row containing `coord`.
    ///
    /// Defined for any coordinate; callers clamp to the grid first when they
    /// need an existing bucket.
    #[inline]
    pub fn bucket_of(&self, coord: Coord) -> (i32, i32) {
        (
            coord.x.div_euclid(self.bucket_width),
            coord.y.div_euclid(self.bucket_height),
        )
    }

    /// Bucket at column `bx`, row `by`
    #[inline]
    pub fn bucket(&self, bx: i32, by: i32) -> Option<&Bucket> {
        if bx < 0 || by < 0 || bx >= self.buckets_x || by >= self.buckets_y {
            return None;
        }
        self.buckets.get(by as usize * self.buckets_x as usize + bx as usize)
    }

    #[inline]
    fn bucket_index(&self, coord: Coord) -> Option<usize> {
        if !self.contains(coord) {
            return None;
        }
        let (bx, by) = self.bucket_of(coord);
        Some(by as usize * self.buckets_x as usize + bx as usize)
    }

    #[inline]
    fn bucket_mut(&mut self, coord: Coord) -> Option<&mut Bucket> {
        let index = self.bucket_index(coord)?;
        self.buckets.get_mut(index)
    }
}

impl TileGrid for BucketedGrid {
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
        let bucket = self.buckets.get(self.bucket_index(coord)?)?;
        bucket.tiles.get(bucket.local_index(coord))
    }

    fn insert_occupant(&mut self, coord: Coord, entity: &mut Entity) -> bool {
        let Some(bucket) = self.bucket_mut(coord) else {
            return false;
        };
        let index = bucket.local_index(coord);
        match bucket.tiles.get_mut(index) {
            Some(tile) if tile.occupant.is_none() => {
                tile.occupant = Some(entity.id);
                bucket.occupants.insert(entity.id, coord);
                entity.position = coord;
                true
            }
            _ => false,
        }
    }

    fn remove_occupant(&mut self, coord: Coord) -> bool {
        let Some(bucket) = self.bucket_mut(coord) else {
            return false;
        };
        let index = bucket.local_index(coord);
        match bucket.tiles.get_mut(index).and_then(|tile| tile.occupant.take()) {
            Some(id) => {
                // During a move inside one bucket the entry already points at the target
                if bucket.occupants.get(&id) == Some(&coord) {
                    bucket.occupants.remove(&id);
                }
                true
            }
            None => false,
        }
    }

    fn insert_resource(&mut self, coord: Coord, resource: Resource) -> bool {
        let Some(bucket) = self.bucket_mut(coord) else {
            return false;
        };
        let index = bucket.local_index(coord);
        match bucket.tiles.get_mut(index) {
            Some(tile) if tile.resource.is_none() => {
                tile.resource = Some(resource);
                bucket.resources.insert(resource.id, coord);
                true
            }
            _ => false,
        }
    }

    fn remove_resource(&mut self, coord: Coord) -> Option<Resource> {
        let bucket = self.bucket_mut(coord)?;
        let index = bucket.local_index(coord);
        let resource = bucket.tiles.get_mut(index)?.resource.take()?;
        bucket.resources.remove(&resource.id);
        Some(resource)
    }

    fn for_each_tile(&self, f: &mut dyn FnMut(Coord, &Tile)) {
        for y in 0..self.height {
            for x in 0..self.width {
                let coord = Coord::new(x, y);
                if let Some(tile) = self.tile(coord) {
                    f(coord, tile);
                }
            }
        }
    }

    fn resource_count(&self) -> usize {
        self.buckets.iter().map(Bucket::resource_count).sum()
    }
}
