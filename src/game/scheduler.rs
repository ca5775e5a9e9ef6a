//! Two-phase tick scheduler
//!
//! Each tick:
//! 1. **Decide**: every rostered entity runs its behaviour in parallel (rayon)
//!    against the untouched start-of-tick world. Behaviours only read the
//!    world and queue at most one action each.
//! 2. **Commit**: after the implicit rayon join, the decided private state is
//!    stored and the action queue is drained on this thread with exclusive
//!    access to the world. Then decayed entities leave the roster and
//!    newborns join it.

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::config::SimConfig;
use crate::game::action_queue::{ActionQueue, ActionSender, Origin, QueueError};
use crate::game::diagnostics::{Diagnostics, DiagnosticsSummary};
use crate::game::entity::{EntityId, Mind, Sex};
use crate::game::grid::TileGrid;
use crate::game::search::Search;
use crate::game::state::{Statistics, World};
use crate::game::systems::Behavior;
use crate::util::coord::Coord;

/// Serializable status for overlays and logs
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub tick: u64,
    pub paused: bool,
    pub statistics: Statistics,
    pub diagnostics: DiagnosticsSummary,
    pub selected: Option<SelectedEntity>,
}

/// The currently selected entity
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SelectedEntity {
    pub id: EntityId,
    pub position: Coord,
    pub sex: Sex,
    pub hunger: i32,
    pub age: u32,
    pub dead: bool,
}

/// Tick scheduler over a world and a behaviour
pub struct Scheduler<G: TileGrid, S: Search<G>, B: Behavior<G, S>> {
    world: World<G, S>,
    behavior: B,
    queue: ActionQueue<World<G, S>>,
    diagnostics: Diagnostics,
    decide_deadline: Option<Duration>,
    /// Entities skipped by the last deadline, decided first next tick
    deferred: Vec<EntityId>,
    paused: bool,
}

impl<G: TileGrid, S: Search<G>, B: Behavior<G, S>> Scheduler<G, S, B> {
    pub fn new(config: &SimConfig, world: World<G, S>, behavior: B) -> Self {
        Self {
            world,
            behavior,
            queue: ActionQueue::new(config.queue_capacity(), config.commit_order),
            diagnostics: Diagnostics::new(),
            decide_deadline: config.decide_deadline,
            deferred: Vec::new(),
            paused: false,
        }
    }

    /// Build a world from `config` and scatter its initial population and food
    pub fn populated(config: &SimConfig, grid: G, strategy: S, behavior: B) -> Self {
        let mut world = World::new(config, grid, strategy);
        world.populate(config.initial_population, config.initial_food);
        Self::new(config, world, behavior)
    }

    /// Run one tick.
    ///
    /// Returns `false` when paused or when no entity is left; queued external
    /// actions still commit in both cases.
    pub fn tick(&mut self) -> bool {
        self.world.refresh_selection();

        if self.paused || self.world.roster().is_empty() {
            let ran = self.queue.drain(&mut self.world);
            self.diagnostics.actions_committed += ran as u64;
            self.world.rebuild_roster();
            return false;
        }

        self.diagnostics.tick.start();

        // Decide
        self.diagnostics.decide.start();
        let (minds, deferred) = self.decide();
        self.diagnostics.decide.stop();

        // Commit
        self.diagnostics.commit.start();
        self.world.apply_minds(minds);
        let ran = self.queue.drain(&mut self.world);
        self.world.rebuild_roster();
        self.world.advance_tick();
        self.diagnostics.commit.stop();

        self.diagnostics.actions_committed += ran as u64;
        self.diagnostics.deferred_decisions += deferred as u64;
        self.diagnostics.tick.stop();

        if deferred > 0 {
            tracing::warn!(
                "Decide deadline passed: {} of {} entities deferred at tick {}",
                deferred,
                self.world.roster().len(),
                self.world.tick()
            );
        }

        if self.world.roster().is_empty() {
            tracing::info!("Population extinct at tick {}", self.world.tick());
        }

        true
    }

    /// Parallel decide phase.
    ///
    /// Entities whose task had not started when the deadline passed are
    /// skipped this tick and go to the front of the next tick's order, so a
    /// deadline delays entities but never starves the same ones.
    fn decide(&mut self) -> (Vec<(EntityId, Mind)>, usize) {
        let Some(budget) = self.decide_deadline else {
            let sender = self.queue.sender();
            let (world, behavior) = (&self.world, &self.behavior);
            let minds = world
                .roster()
                .par_iter()
                .filter_map(|&id| {
                    let entity = world.entity(id)?;
                    Some((id, behavior.decide(entity, world, &sender)))
                })
                .collect();
            return (minds, 0);
        };

        let order = self.decide_order();
        let deadline = Instant::now() + budget;
        let sender = self.queue.sender();
        let (world, behavior) = (&self.world, &self.behavior);

        let outcomes: Vec<(EntityId, Option<Mind>)> = order
            .par_iter()
            .filter_map(|&id| {
                if Instant::now() >= deadline {
                    return Some((id, None));
                }
                let entity = world.entity(id)?;
                Some((id, Some(behavior.decide(entity, world, &sender))))
            })
            .collect();

        let mut minds = Vec::with_capacity(outcomes.len());
        for (id, mind) in outcomes {
            match mind {
                Some(mind) => minds.push((id, mind)),
                None => self.deferred.push(id),
            }
        }
        let deferred = self.deferred.len();
        (minds, deferred)
    }

    /// Last tick's deferred entities that still exist, then the rest of the roster
    fn decide_order(&mut self) -> Vec<EntityId> {
        let previous = std::mem::take(&mut self.deferred);
        if previous.is_empty() {
            return self.world.roster().to_vec();
        }

        let waiting: FxHashSet<EntityId> = previous.iter().copied().collect();
        let mut order = Vec::with_capacity(self.world.roster().len());
        order.extend(previous.into_iter().filter(|&id| self.world.entity(id).is_some()));
        order.extend(self.world.roster().iter().copied().filter(|id| !waiting.contains(id)));
        order
    }

    /// Queue an input-handler action for the next commit; panics when full
    pub fn enqueue_external_action(&self, action: impl FnOnce(&mut World<G, S>) + Send + 'static) {
        self.queue.enqueue(Origin::External, action);
    }

    pub fn try_enqueue_external_action(
        &self,
        action: impl FnOnce(&mut World<G, S>) + Send + 'static,
    ) -> Result<(), QueueError> {
        self.queue.try_enqueue(Origin::External, action)
    }

    /// Sender for input handlers living on other threads
    pub fn action_sender(&self) -> ActionSender<World<G, S>> {
        self.queue.sender()
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        tracing::info!("Simulation {}", if self.paused { "paused" } else { "resumed" });
        self.paused
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn world(&self) -> &World<G, S> {
        &self.world
    }

    /// Direct world access between ticks (setup, selection)
    #[inline]
    pub fn world_mut(&mut self) -> &mut World<G, S> {
        &mut self.world
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            tick: self.world.tick(),
            paused: self.paused,
            statistics: self.world.statistics(),
            diagnostics: self.diagnostics.summary(),
            selected: self.world.selected().map(|entity| SelectedEntity {
                id: entity.id,
                position: entity.position(),
                sex: entity.sex,
                hunger: entity.mind.hunger,
                age: entity.mind.age,
                dead: entity.mind.dead,
            }),
        }
    }
}
