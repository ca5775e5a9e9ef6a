//! Forager behaviour: eat, find food, find a mate, wander, die

use rand::Rng;

use crate::game::action_queue::{ActionSender, Origin};
use crate::game::entity::{Entity, EntityId, Mind, Sex};
use crate::game::grid::TileGrid;
use crate::game::search::{Search, SearchArea, SearchKind};
use crate::game::state::World;
use crate::game::systems::Behavior;
use crate::util::coord::Coord;

/// Default entity behaviour.
///
/// Per tick, in priority order:
/// 1. dead: decay, and despawn once fully decayed
/// 2. hungry: eat held food, else walk to (and pick up) the nearest food
/// 3. mature male off cooldown: walk to the nearest free female and mate
/// 4. otherwise wander one step
///
/// Living foragers then age by one tick and burn hunger.
#[derive(Debug, Clone, Copy, Default)]
pub struct Forager;

fn queue_move<G: TileGrid, S: Search<G>>(
    actions: &ActionSender<World<G, S>>,
    id: EntityId,
    position: Coord,
    delta: Coord,
) {
    if delta == Coord::ZERO {
        return;
    }
    let target = position + delta;
    actions.enqueue(Origin::Entity(id), move |world: &mut World<G, S>| {
        world.move_entity(id, target);
    });
}

impl Forager {
    fn seek_food<G: TileGrid, S: Search<G>>(
        &self,
        entity: &Entity,
        mind: &mut Mind,
        world: &World<G, S>,
        actions: &ActionSender<World<G, S>>,
    ) {
        let (id, position) = (entity.id, entity.position());

        if mind.eat() {
            return;
        }

        // Forget targets somebody else already ate
        mind.targets
            .retain(|target| world.grid().tile(*target).is_some_and(|tile| tile.has_resource()));

        if mind.targets.is_empty() {
            let behavior = world.behavior();
            mind.targets = world
                .search(
                    position,
                    SearchArea::square(behavior.search_radius),
                    behavior.max_targets,
                    SearchKind::Resource,
                )
                .into_iter()
                .collect();
        }

        match mind.targets.first().copied() {
            Some(target) if target == position => {
                mind.targets.clear();
                actions.enqueue(Origin::Entity(id), move |world: &mut World<G, S>| {
                    world.pick_up(id);
                });
            }
            Some(target) => queue_move(actions, id, position, position.step_toward(target)),
            None => self.wander(entity, world, actions),
        }
    }

    fn seek_mate<G: TileGrid, S: Search<G>>(
        &self,
        entity: &Entity,
        world: &World<G, S>,
        actions: &ActionSender<World<G, S>>,
    ) {
        let (id, position) = (entity.id, entity.position());
        let behavior = world.behavior();
        let kind = SearchKind::Mate {
            sex: entity.sex.opposite(),
            maturity_age: behavior.maturity_age,
        };
        let mates = world.search(position, SearchArea::square(behavior.search_radius), 1, kind);

        match mates.first().copied() {
            Some(mate) if position.chebyshev(mate) <= 1 => {
                actions.enqueue(Origin::Entity(id), move |world: &mut World<G, S>| {
                    world.mate(id, mate);
                });
            }
            Some(mate) => queue_move(actions, id, position, position.step_toward(mate)),
            None => self.wander(entity, world, actions),
        }
    }

    fn wander<G: TileGrid, S: Search<G>>(
        &self,
        entity: &Entity,
        world: &World<G, S>,
        actions: &ActionSender<World<G, S>>,
    ) {
        let mut rng = world.decision_rng(entity.id);
        let delta = Coord::new(rng.gen_range(-1..=1), rng.gen_range(-1..=1));
        queue_move(actions, entity.id, entity.position(), delta);
    }
}

impl<G: TileGrid, S: Search<G>> Behavior<G, S> for Forager {
    fn decide(&self, entity: &Entity, world: &World<G, S>, actions: &ActionSender<World<G, S>>) -> Mind {
        let behavior = world.behavior();
        let mut mind = entity.mind.clone();

        if mind.dead {
            mind.decay += 1;
            if mind.decay >= behavior.decay_ticks {
                let id = entity.id;
                actions.enqueue(Origin::Entity(id), move |world: &mut World<G, S>| {
                    world.despawn(id);
                });
            }
            return mind;
        }

        if entity.is_hungry(behavior) {
            self.seek_food(entity, &mut mind, world, actions);
        } else if entity.sex == Sex::Male && entity.is_seeking_mate(behavior) {
            self.seek_mate(entity, world, actions);
        } else {
            self.wander(entity, world, actions);
        }

        mind.advance(behavior);
        mind
    }
}
