/// World defaults (a 3000x3000 world sized for large populations)
pub mod world {
    /// Default world width in tiles
    pub const WIDTH: i32 = 3000;
    /// Default world height in tiles
    pub const HEIGHT: i32 = 3000;
    /// Entities placed at setup
    pub const INITIAL_POPULATION: usize = 5_000;
    /// Hard cap on the live roster (reproduction stops here)
    pub const MAX_POPULATION: usize = 100_000;
    /// Resources scattered at setup
    pub const INITIAL_FOOD: usize = 50_000;
    /// Bucket edge length used by the bucketed grid
    pub const BUCKET_SIZE: i32 = 5;
    /// Seed used when none is configured
    pub const DEFAULT_SEED: u64 = 0x6c69_6665_6772_6964;
}

/// Action queue sizing
pub mod queue {
    /// Queue slots reserved per member of the population cap
    pub const SLOTS_PER_ENTITY: usize = 2;
    /// Extra slots for input handlers (clicks, key presses)
    pub const EXTERNAL_HEADROOM: usize = 1024;
}

/// Forager lifecycle constants
pub mod forager {
    /// Hunger lost every tick while alive
    pub const HUNGER_PER_TICK: i32 = 2;
    /// At or below this level the forager looks for food
    pub const HUNGER_THRESHOLD: i32 = 250;
    /// New entities start with hunger drawn from 1..=INITIAL_HUNGER_MAX
    pub const INITIAL_HUNGER_MAX: i32 = 100;
    /// Age (ticks) at which an entity dies of old age
    pub const LIFESPAN: u32 = 5_000;
    /// Ticks a dead entity stays on the grid before removal
    pub const DECAY_TICKS: u32 = 1;
    /// Minimum age before looking for a mate
    pub const MATURITY_AGE: u32 = 150;
    /// Ticks after mating before looking for a mate again
    pub const MATING_COOLDOWN: u32 = 300;
    /// Half-extent of the food/mate search area
    pub const SEARCH_RADIUS: i32 = 15;
    /// Number of search results cached as targets
    pub const MAX_TARGETS: usize = 8;
}

/// Resource (food) constants
pub mod resource {
    /// Energy restored by eating one potato
    pub const POTATO_ENERGY: i32 = 50;
    /// Half-extent of the window a picked-up resource regrows in
    pub const REGROW_RADIUS: i32 = 25;
}

/// Reproduction constants
pub mod reproduction {
    /// Litter size is drawn from 0..BIRTH_RATE
    pub const BIRTH_RATE: u32 = 7;
    /// Half-extent of the empty-space search around the parents
    pub const LITTER_RADIUS: i32 = 5;
}
