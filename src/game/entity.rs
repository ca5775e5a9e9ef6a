//! Mobile entities (foragers) and their private per-tick state

use hashbrown::HashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::BehaviorConfig;
use crate::game::constants::forager;
use crate::game::tile::Resource;
use crate::util::coord::Coord;

/// Entity identifier, unique per world and never reused
pub type EntityId = u64;

/// Entity arena, keyed by id
pub type Entities = HashMap<EntityId, Entity>;

/// Cached search results (nearest first)
pub type Targets = SmallVec<[Coord; forager::MAX_TARGETS]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn opposite(self) -> Self {
        match self {
            Sex::Male => Sex::Female,
            Sex::Female => Sex::Male,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Sex::Male
        } else {
            Sex::Female
        }
    }
}

/// State only the owning entity writes.
///
/// The decide task works on a copy and hands the new value back to the
/// scheduler, which stores it at the start of the commit phase. Commit
/// actions (mating cooldown, eating the picked-up item) may then adjust it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mind {
    /// Energy level; the entity dies when it reaches zero
    pub hunger: i32,
    /// Ticks lived
    pub age: u32,
    /// Ticks spent dead on the grid
    pub decay: u32,
    pub dead: bool,
    /// Ticks until the entity looks for a mate again
    pub mating_cooldown: u32,
    /// Picked-up resource waiting to be eaten
    pub held: Option<Resource>,
    /// Cached search results, nearest first
    pub targets: Targets,
}

impl Mind {
    pub fn new(hunger: i32) -> Self {
        Self {
            hunger,
            age: 0,
            decay: 0,
            dead: false,
            mating_cooldown: 0,
            held: None,
            targets: Targets::new(),
        }
    }

    /// Eat the held resource, if any
    pub fn eat(&mut self) -> bool {
        match self.held.take() {
            Some(resource) => {
                self.hunger += resource.energy;
                true
            }
            None => false,
        }
    }

    /// Age by one tick and burn hunger; flags death at the end of life
    pub fn advance(&mut self, behavior: &BehaviorConfig) {
        if self.dead {
            return;
        }
        self.age += 1;
        self.hunger -= behavior.hunger_per_tick;
        self.mating_cooldown = self.mating_cooldown.saturating_sub(1);
        if self.age >= behavior.lifespan || self.hunger <= 0 {
            self.dead = true;
        }
    }
}

/// A forager on the grid
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    /// Cached grid position. Only grid insert/remove changes it.
    pub(crate) position: Coord,
    pub sex: Sex,
    pub mind: Mind,
}

impl Entity {
    pub fn new(id: EntityId, sex: Sex, hunger: i32) -> Self {
        Self {
            id,
            position: Coord::ZERO,
            sex,
            mind: Mind::new(hunger),
        }
    }

    /// Entity with random sex and starting hunger in `1..=initial_hunger_max`
    pub fn random<R: Rng + ?Sized>(id: EntityId, behavior: &BehaviorConfig, rng: &mut R) -> Self {
        let hunger = rng.gen_range(1..=behavior.initial_hunger_max.max(1));
        Self::new(id, Sex::random(rng), hunger)
    }

    #[inline]
    pub fn position(&self) -> Coord {
        self.position
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.mind.dead
    }

    /// Dead long enough to be removed from the grid
    #[inline]
    pub fn is_decayed(&self, behavior: &BehaviorConfig) -> bool {
        self.mind.dead && self.mind.decay >= behavior.decay_ticks
    }

    #[inline]
    pub fn is_hungry(&self, behavior: &BehaviorConfig) -> bool {
        self.mind.hunger <= behavior.hunger_threshold
    }

    #[inline]
    pub fn is_seeking_mate(&self, behavior: &BehaviorConfig) -> bool {
        self.can_mate(behavior.maturity_age)
    }

    /// Alive, older than `maturity_age` and off cooldown
    #[inline]
    pub fn can_mate(&self, maturity_age: u32) -> bool {
        !self.mind.dead && self.mind.age > maturity_age && self.mind.mating_cooldown == 0
    }
}
