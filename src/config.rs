use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::game::action_queue::CommitOrder;
use crate::game::constants::{forager, queue, reproduction, resource, world};

/// Configuration errors caught by [`SimConfig::validate`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("world must be at least 1x1, got {width}x{height}")]
    EmptyWorld { width: i32, height: i32 },
    #[error("{requested} entities and resources do not fit on {tiles} tiles")]
    Overcrowded { requested: usize, tiles: usize },
    #[error("initial population {initial} exceeds max population {max}")]
    PopulationCap { initial: usize, max: usize },
    #[error("bucket size must be positive, got {width}x{height}")]
    InvalidBucket { width: i32, height: i32 },
    #[error("invalid behavior setting: {0}")]
    InvalidBehavior(&'static str),
}

/// Which grid (and therefore which search strategy) the world is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridKind {
    /// One flat tile array, searched with the expanding spiral
    Dense,
    /// Bucketed tiles with per-bucket indexes, searched by partition
    Bucketed,
}

impl FromStr for GridKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dense" | "spiral" => Ok(GridKind::Dense),
            "bucketed" | "partition" => Ok(GridKind::Bucketed),
            other => Err(format!("unknown grid kind '{}'", other)),
        }
    }
}

/// Forager tunables. Defaults come from `game::constants`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorConfig {
    pub hunger_per_tick: i32,
    pub hunger_threshold: i32,
    pub initial_hunger_max: i32,
    pub lifespan: u32,
    pub decay_ticks: u32,
    pub maturity_age: u32,
    pub mating_cooldown: u32,
    pub search_radius: i32,
    pub max_targets: usize,
    pub food_energy: i32,
    pub regrow_radius: i32,
    pub birth_rate: u32,
    pub litter_radius: i32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            hunger_per_tick: forager::HUNGER_PER_TICK,
            hunger_threshold: forager::HUNGER_THRESHOLD,
            initial_hunger_max: forager::INITIAL_HUNGER_MAX,
            lifespan: forager::LIFESPAN,
            decay_ticks: forager::DECAY_TICKS,
            maturity_age: forager::MATURITY_AGE,
            mating_cooldown: forager::MATING_COOLDOWN,
            search_radius: forager::SEARCH_RADIUS,
            max_targets: forager::MAX_TARGETS,
            food_energy: resource::POTATO_ENERGY,
            regrow_radius: resource::REGROW_RADIUS,
            birth_rate: reproduction::BIRTH_RATE,
            litter_radius: reproduction::LITTER_RADIUS,
        }
    }
}

impl BehaviorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_hunger_max < 1 {
            return Err(ConfigError::InvalidBehavior("initial_hunger_max must be at least 1"));
        }
        if self.search_radius < 0 || self.regrow_radius < 0 || self.litter_radius < 0 {
            return Err(ConfigError::InvalidBehavior("search radii cannot be negative"));
        }
        if self.max_targets == 0 {
            return Err(ConfigError::InvalidBehavior("max_targets must be at least 1"));
        }
        Ok(())
    }
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// World width in tiles
    pub width: i32,
    /// World height in tiles
    pub height: i32,
    /// Entities placed at setup
    pub initial_population: usize,
    /// Upper bound on the live roster
    pub max_population: usize,
    /// Resources placed at setup
    pub initial_food: usize,
    /// Grid layout (selects the search strategy)
    pub grid: GridKind,
    /// Bucket width for the bucketed grid
    pub bucket_width: i32,
    /// Bucket height for the bucketed grid
    pub bucket_height: i32,
    /// Seed for setup and per-entity decision randomness
    pub seed: u64,
    /// Ordering applied to queued actions before commit
    pub commit_order: CommitOrder,
    /// Decide tasks not started within this budget are skipped and run first next tick
    pub decide_deadline: Option<Duration>,
    /// Minimum wall-clock duration of one tick in the runner
    pub min_tick_duration: Option<Duration>,
    /// Stop the runner after this many ticks
    pub max_ticks: Option<u64>,
    /// Forager tunables
    pub behavior: BehaviorConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: world::WIDTH,
            height: world::HEIGHT,
            initial_population: world::INITIAL_POPULATION,
            max_population: world::MAX_POPULATION,
            initial_food: world::INITIAL_FOOD,
            grid: GridKind::Bucketed,
            bucket_width: world::BUCKET_SIZE,
            bucket_height: world::BUCKET_SIZE,
            seed: world::DEFAULT_SEED,
            commit_order: CommitOrder::Arrival,
            decide_deadline: None,
            min_tick_duration: None,
            max_ticks: None,
            behavior: BehaviorConfig::default(),
        }
    }
}

/// Parse an environment variable, warning (and returning None) when it is malformed
fn read_env<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            None
        }
    }
}

impl SimConfig {
    /// Small world used by tests and examples
    pub fn small(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            initial_population: 0,
            max_population: (width.max(0) as usize) * (height.max(0) as usize),
            initial_food: 0,
            ..Self::default()
        }
    }

    /// Load config from `GRIDLIFE_*` environment variables or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Some(width) = read_env::<i32>("GRIDLIFE_WIDTH") {
            config.width = width;
        }
        if let Some(height) = read_env::<i32>("GRIDLIFE_HEIGHT") {
            config.height = height;
        }
        if let Some(population) = read_env::<usize>("GRIDLIFE_POPULATION") {
            config.initial_population = population;
        }
        if let Some(max) = read_env::<usize>("GRIDLIFE_MAX_POPULATION") {
            config.max_population = max;
        }
        if let Some(food) = read_env::<usize>("GRIDLIFE_FOOD") {
            config.initial_food = food;
        }
        if let Some(birth_rate) = read_env::<u32>("GRIDLIFE_BIRTH_RATE") {
            config.behavior.birth_rate = birth_rate;
        }
        if let Some(grid) = read_env::<GridKind>("GRIDLIFE_GRID") {
            config.grid = grid;
        }
        if let Some(width) = read_env::<i32>("GRIDLIFE_BUCKET_WIDTH") {
            config.bucket_width = width;
        }
        if let Some(height) = read_env::<i32>("GRIDLIFE_BUCKET_HEIGHT") {
            config.bucket_height = height;
        }
        if let Some(seed) = read_env::<u64>("GRIDLIFE_SEED") {
            config.seed = seed;
        }
        if let Some(order) = read_env::<CommitOrder>("GRIDLIFE_COMMIT_ORDER") {
            config.commit_order = order;
        }
        if let Some(ms) = read_env::<u64>("GRIDLIFE_DECIDE_DEADLINE_MS") {
            config.decide_deadline = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(ms) = read_env::<u64>("GRIDLIFE_MIN_TICK_MS") {
            config.min_tick_duration = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(ticks) = read_env::<u64>("GRIDLIFE_TICKS") {
            config.max_ticks = (ticks > 0).then_some(ticks);
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(ConfigError::EmptyWorld {
                width: self.width,
                height: self.height,
            });
        }
        let tiles = self.tile_count();
        let requested = self.initial_population + self.initial_food;
        if requested > tiles {
            return Err(ConfigError::Overcrowded { requested, tiles });
        }
        if self.initial_population > self.max_population {
            return Err(ConfigError::PopulationCap {
                initial: self.initial_population,
                max: self.max_population,
            });
        }
        if self.bucket_width <= 0 || self.bucket_height <= 0 {
            return Err(ConfigError::InvalidBucket {
                width: self.bucket_width,
                height: self.bucket_height,
            });
        }
        self.behavior.validate()
    }

    /// Number of tiles in the world
    pub fn tile_count(&self) -> usize {
        self.width.max(0) as usize * self.height.max(0) as usize
    }

    /// Action queue capacity: two slots per possible entity plus input headroom
    pub fn queue_capacity(&self) -> usize {
        self.max_population * queue::SLOTS_PER_ENTITY + queue::EXTERNAL_HEADROOM
    }
}
