//! Entity behaviours run during the decide phase

pub mod forager;

pub use forager::Forager;

use crate::game::action_queue::ActionSender;
use crate::game::entity::{Entity, Mind};
use crate::game::grid::TileGrid;
use crate::game::search::Search;
use crate::game::state::World;

/// Per-entity decision logic.
///
/// `decide` runs in parallel for every live entity against the start-of-tick
/// world. It may queue at most one action through `actions` and returns the
/// entity's updated private state, which the scheduler stores before the
/// queued actions commit.
pub trait Behavior<G: TileGrid, S: Search<G>>: Send + Sync {
    fn decide(&self, entity: &Entity, world: &World<G, S>, actions: &ActionSender<World<G, S>>) -> Mind;
}
