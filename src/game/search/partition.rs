//! Bucket-index search over a [`BucketedGrid`]
//!
//! Instead of touching every tile in the search window, only the occupant or
//! resource index of each covered bucket is scanned. Buckets are visited ring
//! by ring around the center bucket so the scan can stop as soon as the
//! remaining rings cannot contain anything closer than what was already found.
//!
//! A bounded query therefore returns the `max_find` Manhattan-nearest matches
//! (ties in spiral order), not the first `max_find` the scan happens to meet.
//! Once `max_find` candidates are held, scanning continues only through rings
//! that could still hold a closer one.

use crate::game::bucketed::BucketedGrid;
use crate::game::entity::Entities;
use crate::game::grid::TileGrid;
use crate::game::search::spiral::spiral_rank;
use crate::game::search::{Search, SearchArea, SearchKind, SpiralSearch};
use crate::util::coord::Coord;

/// Candidate ordered by distance, ties broken by spiral walk order
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: i32,
    rank: u64,
    coord: Coord,
}

impl Candidate {
    fn new(center: Coord, coord: Coord) -> Self {
        Self {
            distance: coord.manhattan(center),
            rank: spiral_rank(coord - center),
            coord,
        }
    }

    #[inline]
    fn key(&self) -> (i32, u64) {
        (self.distance, self.rank)
    }
}

/// Partition search. Empty-space queries fall back to [`SpiralSearch`]
/// because empty tiles are not indexed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartitionSearch;

impl PartitionSearch {
    pub fn new() -> Self {
        Self
    }

    /// Smallest Manhattan distance from the center to any tile of a bucket
    /// `ring` buckets away from the center bucket
    #[inline]
    fn ring_lower_bound(grid: &BucketedGrid, ring: i32) -> i32 {
        if ring == 0 {
            return 0;
        }
        (ring - 1) * grid.bucket_width().min(grid.bucket_height()) + 1
    }
}

impl Search<BucketedGrid> for PartitionSearch {
    fn query(
        &self,
        grid: &BucketedGrid,
        entities: &Entities,
        center: Coord,
        area: SearchArea,
        max_find: usize,
        kind: SearchKind,
    ) -> Vec<Coord> {
        if kind == SearchKind::EmptySpace {
            return SpiralSearch.query(grid, entities, center, area, max_find, kind);
        }
        if max_find == 0 || area.is_empty() || grid.tile_count() == 0 {
            return Vec::new();
        }

        // World window clipped to the grid
        let min = Coord::new((center.x - area.rx).max(0), (center.y - area.ry).max(0));
        let max = Coord::new(
            (center.x + area.rx).min(grid.width() - 1),
            (center.y + area.ry).min(grid.height() - 1),
        );
        if min.x > max.x || min.y > max.y {
            return Vec::new();
        }

        let (bx_min, by_min) = grid.bucket_of(min);
        let (bx_max, by_max) = grid.bucket_of(max);
        let (cbx, cby) = grid.bucket_of(center);
        let cbx = cbx.clamp(bx_min, bx_max);
        let cby = cby.clamp(by_min, by_max);
        let last_ring = (cbx - bx_min)
            .max(bx_max - cbx)
            .max(cby - by_min)
            .max(by_max - cby);

        let mut found: Vec<Candidate> = Vec::new();

        for ring in 0..=last_ring {
            if found.len() >= max_find {
                found.sort_unstable_by_key(Candidate::key);
                found.truncate(max_find);
                let worst = found.last().map_or(i32::MAX, |c| c.distance);
                if Self::ring_lower_bound(grid, ring) > worst {
                    break;
                }
            }

            for by in (cby - ring).max(by_min)..=(cby + ring).min(by_max) {
                for bx in (cbx - ring).max(bx_min)..=(cbx + ring).min(bx_max) {
                    if (bx - cbx).abs().max((by - cby).abs()) != ring {
                        continue;
                    }
                    let Some(bucket) = grid.bucket(bx, by) else {
                        continue;
                    };

                    let mut consider = |coord: Coord| {
                        if !area.contains(center, coord) {
                            return;
                        }
                        if grid.tile(coord).is_some_and(|tile| kind.matches(tile, entities)) {
                            found.push(Candidate::new(center, coord));
                        }
                    };

                    match kind {
                        SearchKind::Resource => bucket.resources().for_each(|(_, coord)| consider(coord)),
                        SearchKind::Mate { .. } => bucket.occupants().for_each(|(_, coord)| consider(coord)),
                        SearchKind::EmptySpace => {}
                    }
                }
            }
        }

        found.sort_unstable_by_key(Candidate::key);
        found.truncate(max_find);
        found.into_iter().map(|c| c.coord).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::{Entity, Sex};
    use crate::game::tile::Resource;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    /// Random bucketed world with resources and entities of both sexes
    fn random_world(seed: u64, width: i32, height: i32, bucket: i32) -> (BucketedGrid, Entities) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut grid = BucketedGrid::new(width, height, bucket, bucket);
        let mut entities = Entities::new();

        for id in 0..(width * height / 4) as u64 {
            let coord = Coord::new(rng.gen_range(0..width), rng.gen_range(0..height));
            grid.insert_resource(coord, Resource::potato(id));
        }
        for id in 0..(width * height / 5) as u64 {
            let coord = Coord::new(rng.gen_range(0..width), rng.gen_range(0..height));
            let mut entity = Entity::new(id, Sex::random(&mut rng), 100);
            entity.mind.age = rng.gen_range(0..20);
            if grid.insert_occupant(coord, &mut entity) {
                entities.insert(id, entity);
            }
        }
        (grid, entities)
    }

    #[test]
    fn test_partition_matches_spiral_unbounded() {
        let kinds = [
            SearchKind::Resource,
            SearchKind::Mate {
                sex: Sex::Female,
                maturity_age: 10,
            },
            SearchKind::EmptySpace,
        ];
        for seed in 0..8 {
            let (grid, entities) = random_world(seed, 37, 29, 5);
            let mut rng = SmallRng::seed_from_u64(seed + 100);
            for _ in 0..25 {
                let center = Coord::new(rng.gen_range(0..37), rng.gen_range(0..29));
                let area = SearchArea::new(rng.gen_range(0..12), rng.gen_range(0..12));
                for kind in kinds {
                    let spiral = SpiralSearch.query(&grid, &entities, center, area, usize::MAX, kind);
                    let partition = PartitionSearch.query(&grid, &entities, center, area, usize::MAX, kind);
                    assert_eq!(spiral, partition, "center {} area {:?} kind {:?}", center, area, kind);
                }
            }
        }
    }

    #[test]
    fn test_partition_limit_keeps_nearest() {
        let (grid, entities) = random_world(3, 40, 40, 4);
        let center = Coord::new(20, 20);
        let area = SearchArea::square(15);

        let all = PartitionSearch.query(&grid, &entities, center, area, usize::MAX, SearchKind::Resource);
        let few = PartitionSearch.query(&grid, &entities, center, area, 5, SearchKind::Resource);
        assert_eq!(few.len(), 5.min(all.len()));
        assert_eq!(few[..], all[..few.len()]);
    }

    #[test]
    fn test_partition_clips_to_grid() {
        let mut grid = BucketedGrid::new(10, 10, 3, 3);
        let entities = Entities::new();
        grid.insert_resource(Coord::new(0, 0), Resource::potato(1));
        grid.insert_resource(Coord::new(9, 9), Resource::potato(2));

        let found = PartitionSearch.query(
            &grid,
            &entities,
            Coord::new(1, 1),
            SearchArea::square(4),
            usize::MAX,
            SearchKind::Resource,
        );
        assert_eq!(found, vec![Coord::new(0, 0)]);
    }

    #[test]
    fn test_partition_skips_covered_resources() {
        let mut grid = BucketedGrid::new(10, 10, 5, 5);
        let mut entities = Entities::new();
        grid.insert_resource(Coord::new(2, 2), Resource::potato(1));
        let mut e = Entity::new(1, Sex::Male, 10);
        grid.insert_occupant(Coord::new(2, 2), &mut e);
        entities.insert(1, e);

        let found = PartitionSearch.query(
            &grid,
            &entities,
            Coord::new(2, 2),
            SearchArea::square(3),
            usize::MAX,
            SearchKind::Resource,
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_ring_lower_bound() {
        let grid = BucketedGrid::new(30, 30, 5, 3);
        assert_eq!(PartitionSearch::ring_lower_bound(&grid, 0), 0);
        assert_eq!(PartitionSearch::ring_lower_bound(&grid, 1), 1);
        assert_eq!(PartitionSearch::ring_lower_bound(&grid, 3), 7);
    }
}
