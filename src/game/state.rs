//! World state: grid, entity arena, roster and statistics
//!
//! The world is read-only while entities decide and exclusively borrowed while
//! queued actions commit. Every mutation below is meant to run inside a
//! committed action (or during setup), never from a decide task.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::{BehaviorConfig, SimConfig};
use crate::game::entity::{Entities, Entity, EntityId, Mind};
use crate::game::grid::TileGrid;
use crate::game::search::{Search, SearchArea, SearchKind};
use crate::game::tile::{Resource, ResourceId};
use crate::util::coord::Coord;

/// World counters, updated as actions commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Live roster size after the last roster rebuild
    pub population: usize,
    /// Resources currently on the grid
    pub resources: usize,
    pub births: u64,
    pub deaths: u64,
    /// Moves that lost a contention or hit the edge
    pub failed_moves: u64,
    pub pickups: u64,
    /// Resources that regrew after a pick-up
    pub regrown: u64,
}

/// Broken grid/arena consistency found by [`World::verify_invariants`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("entity {id} caches position {cached} but occupies {actual}")]
    PositionMismatch { id: EntityId, cached: Coord, actual: Coord },
    #[error("tile {coord} holds unknown entity {id}")]
    UnknownOccupant { coord: Coord, id: EntityId },
    #[error("entity {id} occupies both {first} and {second}")]
    DuplicateOccupant { id: EntityId, first: Coord, second: Coord },
    #[error("entity {id} is not on the grid")]
    MissingFromGrid { id: EntityId },
    #[error("population {population} exceeds the cap of {max}")]
    OverPopulated { population: usize, max: usize },
    #[error("resource count {counted} does not match tracked {tracked}")]
    ResourceCount { counted: usize, tracked: usize },
}

/// Simulation world over grid `G`, searched with strategy `S`
pub struct World<G: TileGrid, S: Search<G>> {
    grid: G,
    strategy: S,
    entities: Entities,
    /// Entities that decide each tick, in id order
    roster: Vec<EntityId>,
    /// Spawned this tick, admitted to the roster when the tick ends
    newborns: Vec<EntityId>,
    behavior: BehaviorConfig,
    max_population: usize,
    next_entity_id: EntityId,
    next_resource_id: ResourceId,
    /// Commit-side randomness (setup, litters, regrowth)
    rng: SmallRng,
    seed: u64,
    tick: u64,
    selected: Option<EntityId>,
    stats: Statistics,
}

impl<G: TileGrid, S: Search<G>> World<G, S> {
    /// Empty world; call [`World::populate`] to scatter entities and food
    pub fn new(config: &SimConfig, grid: G, strategy: S) -> Self {
        Self {
            grid,
            strategy,
            entities: Entities::with_capacity(config.initial_population),
            roster: Vec::with_capacity(config.initial_population),
            newborns: Vec::new(),
            behavior: config.behavior,
            max_population: config.max_population,
            next_entity_id: 0,
            next_resource_id: 0,
            rng: SmallRng::seed_from_u64(config.seed),
            seed: config.seed,
            tick: 0,
            selected: None,
            stats: Statistics::default(),
        }
    }

    /// Place `population` entities and `food` resources on distinct random tiles
    pub fn populate(&mut self, population: usize, food: usize) {
        let tiles = self.grid.tile_count();
        let amount = (population + food).min(tiles);
        if amount == 0 {
            return;
        }
        let width = self.grid.width() as usize;
        let picks = rand::seq::index::sample(&mut self.rng, tiles, amount);

        let mut spawned = 0;
        let mut placed = 0;
        for (n, index) in picks.into_iter().enumerate() {
            let coord = Coord::new((index % width) as i32, (index / width) as i32);
            if n < population {
                if self.spawn(coord).is_some() {
                    spawned += 1;
                }
            } else if self.add_resource(coord) {
                placed += 1;
            }
        }
        self.admit_newborns();

        tracing::info!(
            "World populated: {} entities, {} resources on {}x{}",
            spawned,
            placed,
            self.grid.width(),
            self.grid.height()
        );
    }

    // ========================================================================
    // Read access (decide phase)
    // ========================================================================

    #[inline]
    pub fn grid(&self) -> &G {
        &self.grid
    }

    #[inline]
    pub fn entities(&self) -> &Entities {
        &self.entities
    }

    #[inline]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Mutable access for commit actions; the position stays grid-owned
    #[inline]
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Entities that decide next tick
    #[inline]
    pub fn roster(&self) -> &[EntityId] {
        &self.roster
    }

    #[inline]
    pub fn behavior(&self) -> &BehaviorConfig {
        &self.behavior
    }

    #[inline]
    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn max_population(&self) -> usize {
        self.max_population
    }

    /// Query the configured search strategy
    pub fn search(&self, center: Coord, area: SearchArea, max_find: usize, kind: SearchKind) -> Vec<Coord> {
        self.strategy
            .query(&self.grid, &self.entities, center, area, max_find, kind)
    }

    /// Per-entity RNG for the current tick, independent of thread scheduling
    pub fn decision_rng(&self, id: EntityId) -> SmallRng {
        let mixed = self.seed
            ^ self.tick.wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ id.wrapping_add(1).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
        SmallRng::seed_from_u64(mixed)
    }

    // ========================================================================
    // Mutations (commit phase)
    // ========================================================================

    /// Spawn a random entity at `coord` while the population is below the cap.
    ///
    /// The newborn joins the roster when the current tick ends.
    pub fn spawn(&mut self, coord: Coord) -> Option<EntityId> {
        if self.entities.len() >= self.max_population {
            return None;
        }
        let id = self.next_entity_id;
        let mut entity = Entity::random(id, &self.behavior, &mut self.rng);
        if !self.grid.insert_occupant(coord, &mut entity) {
            return None;
        }
        self.next_entity_id += 1;
        self.entities.insert(id, entity);
        self.newborns.push(id);
        Some(id)
    }

    /// Remove an entity from the grid and the arena
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entities.remove(&id) else {
            return false;
        };
        self.grid.remove_occupant(entity.position);
        self.stats.deaths += 1;
        if self.selected == Some(id) {
            self.selected = None;
        }
        true
    }

    /// Move an entity to `target`: insert there first, then leave the origin.
    ///
    /// Fails (and counts the failure) when the target is taken or off the grid.
    pub fn move_entity(&mut self, id: EntityId, target: Coord) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        let origin = entity.position;
        if self.grid.insert_occupant(target, entity) {
            self.grid.remove_occupant(origin);
            true
        } else {
            self.stats.failed_moves += 1;
            false
        }
    }

    /// Pick up the resource under an entity; regrows one nearby on success
    pub fn pick_up(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        if entity.mind.held.is_some() {
            return false;
        }
        let position = entity.position;
        let Some(resource) = self.grid.remove_resource(position) else {
            return false;
        };
        entity.mind.held = Some(resource);
        entity.mind.targets.clear();
        self.stats.resources -= 1;
        self.stats.pickups += 1;

        if self.regrow_near(position) {
            self.stats.regrown += 1;
        }
        true
    }

    /// Place a new resource at `coord` if the tile is empty
    pub fn add_resource(&mut self, coord: Coord) -> bool {
        if !self.grid.tile(coord).is_some_and(|tile| tile.is_empty()) {
            return false;
        }
        let resource = Resource::new(self.next_resource_id, self.behavior.food_energy);
        if !self.grid.insert_resource(coord, resource) {
            return false;
        }
        self.next_resource_id += 1;
        self.stats.resources += 1;
        true
    }

    /// Grow one resource on a random empty tile within `regrow_radius`
    fn regrow_near(&mut self, center: Coord) -> bool {
        let radius = self.behavior.regrow_radius;
        let mut xs: Vec<i32> = (-radius..=radius).collect();
        let mut ys: Vec<i32> = (-radius..=radius).collect();
        xs.shuffle(&mut self.rng);
        ys.shuffle(&mut self.rng);

        for &dx in &xs {
            for &dy in &ys {
                if self.add_resource(center.offset(dx, dy)) {
                    return true;
                }
            }
        }
        false
    }

    /// Mate `id` with the occupant at `mate_at`.
    ///
    /// Both parents must still be free to mate. The litter size is drawn from
    /// `0..birth_rate` and newborns are placed on empty tiles near the parent,
    /// up to the population cap. Returns the number of newborns.
    pub fn mate(&mut self, id: EntityId, mate_at: Coord) -> usize {
        let maturity = self.behavior.maturity_age;
        let Some(parent) = self.entities.get(&id) else {
            return 0;
        };
        if !parent.can_mate(maturity) {
            return 0;
        }
        let (position, sex) = (parent.position, parent.sex);

        let Some(mate_id) = self.grid.tile(mate_at).and_then(|tile| tile.occupant()) else {
            return 0;
        };
        let mate_ready = self
            .entities
            .get(&mate_id)
            .is_some_and(|mate| mate.sex == sex.opposite() && mate.can_mate(maturity));
        if mate_id == id || !mate_ready {
            return 0;
        }

        let litter = if self.behavior.birth_rate > 0 {
            self.rng.gen_range(0..self.behavior.birth_rate) as usize
        } else {
            0
        };
        let spaces = self.search(
            position,
            SearchArea::square(self.behavior.litter_radius),
            litter,
            SearchKind::EmptySpace,
        );

        let mut born = 0;
        for coord in spaces {
            if self.spawn(coord).is_none() {
                break;
            }
            born += 1;
        }
        self.stats.births += born as u64;

        let cooldown = self.behavior.mating_cooldown;
        for parent in [id, mate_id] {
            if let Some(entity) = self.entities.get_mut(&parent) {
                entity.mind.mating_cooldown = cooldown;
            }
        }

        if born > 0 {
            tracing::debug!(parent = id, mate = mate_id, born, "Litter born");
        }
        born
    }

    // ========================================================================
    // Tick bookkeeping (scheduler)
    // ========================================================================

    /// Store the private state returned by decide tasks
    pub(crate) fn apply_minds(&mut self, minds: Vec<(EntityId, Mind)>) {
        for (id, mind) in minds {
            if let Some(entity) = self.entities.get_mut(&id) {
                entity.mind = mind;
            }
        }
    }

    /// Drop removed entities from the roster and admit this tick's newborns
    pub(crate) fn rebuild_roster(&mut self) {
        let entities = &self.entities;
        self.roster.retain(|id| entities.contains_key(id));
        self.admit_newborns();
    }

    fn admit_newborns(&mut self) {
        let entities = &self.entities;
        self.roster
            .extend(self.newborns.drain(..).filter(|id| entities.contains_key(id)));
        self.stats.population = self.roster.len();
    }

    pub(crate) fn advance_tick(&mut self) {
        self.tick += 1;
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Select the entity standing on `coord`
    pub fn select_at(&mut self, coord: Coord) -> Option<EntityId> {
        let id = self.grid.tile(coord).and_then(|tile| tile.occupant())?;
        self.selected = Some(id);
        Some(id)
    }

    pub fn select_random(&mut self) -> Option<EntityId> {
        self.selected = self.roster.choose(&mut self.rng).copied();
        self.selected
    }

    pub fn unselect(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Entity> {
        self.selected.and_then(|id| self.entities.get(&id))
    }

    /// Move the selection on when the selected entity has decayed or is gone
    pub(crate) fn refresh_selection(&mut self) {
        let Some(id) = self.selected else {
            return;
        };
        let gone = self
            .entities
            .get(&id)
            .map_or(true, |entity| entity.is_decayed(&self.behavior));
        if gone {
            self.select_random();
        }
    }

    // ========================================================================
    // Verification
    // ========================================================================

    /// Check occupancy exclusivity and position sync between grid and arena
    pub fn verify_invariants(&self) -> Result<(), InvariantViolation> {
        if self.entities.len() > self.max_population {
            return Err(InvariantViolation::OverPopulated {
                population: self.entities.len(),
                max: self.max_population,
            });
        }

        let mut seen: hashbrown::HashMap<EntityId, Coord> =
            hashbrown::HashMap::with_capacity(self.entities.len());
        let mut resources = 0;
        let mut violation = None;

        self.grid.for_each_tile(&mut |coord, tile| {
            if tile.has_resource() {
                resources += 1;
            }
            if violation.is_some() {
                return;
            }
            let Some(id) = tile.occupant() else {
                return;
            };
            let Some(entity) = self.entities.get(&id) else {
                violation = Some(InvariantViolation::UnknownOccupant { coord, id });
                return;
            };
            if entity.position != coord {
                violation = Some(InvariantViolation::PositionMismatch {
                    id,
                    cached: entity.position,
                    actual: coord,
                });
                return;
            }
            if let Some(first) = seen.insert(id, coord) {
                violation = Some(InvariantViolation::DuplicateOccupant {
                    id,
                    first,
                    second: coord,
                });
            }
        });

        if let Some(violation) = violation {
            return Err(violation);
        }
        if let Some(id) = self.entities.keys().find(|id| !seen.contains_key(*id)) {
            return Err(InvariantViolation::MissingFromGrid { id: *id });
        }
        if resources != self.stats.resources {
            return Err(InvariantViolation::ResourceCount {
                counted: resources,
                tracked: self.stats.resources,
            });
        }
        Ok(())
    }
}
