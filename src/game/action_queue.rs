//! Deferred action queue
//!
//! Decide tasks cannot touch the world, so they describe their mutation as a
//! closure and push it here. The commit phase drains the queue on one thread,
//! running every closure against the exclusively borrowed world.
//!
//! Uses crossbeam-channel for lock-free MPSC submission from the rayon pool.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::game::entity::EntityId;

/// Mutation to run during commit
pub type Action<C> = Box<dyn FnOnce(&mut C) + Send>;

/// Who queued an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
    /// Input handlers (clicks, key presses)
    External,
    /// An entity's decide task
    Entity(EntityId),
}

/// Order in which a drain runs queued actions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitOrder {
    /// Arrival order (depends on thread scheduling)
    #[default]
    Arrival,
    /// External actions first, then by entity id; arrival order within an origin
    ByEntity,
}

impl FromStr for CommitOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "arrival" | "fifo" => Ok(CommitOrder::Arrival),
            "entity" | "by_entity" => Ok(CommitOrder::ByEntity),
            other => Err(format!("unknown commit order '{}'", other)),
        }
    }
}

/// Action queue errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("action queue is full ({capacity} slots)")]
    Full { capacity: usize },
    #[error("action queue receiver was dropped")]
    Disconnected,
}

struct Queued<C> {
    origin: Origin,
    action: Action<C>,
}

/// Bounded FIFO of actions against a context `C` (the world)
pub struct ActionQueue<C> {
    sender: ActionSender<C>,
    receiver: Receiver<Queued<C>>,
    order: CommitOrder,
}

impl<C> ActionQueue<C> {
    pub fn new(capacity: usize, order: CommitOrder) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            sender: ActionSender { sender, capacity },
            receiver,
            order,
        }
    }

    /// Clonable submission handle
    pub fn sender(&self) -> ActionSender<C> {
        self.sender.clone()
    }

    /// Queue an action; panics when the queue is full
    pub fn enqueue(&self, origin: Origin, action: impl FnOnce(&mut C) + Send + 'static) {
        self.sender.enqueue(origin, action);
    }

    pub fn try_enqueue(
        &self,
        origin: Origin,
        action: impl FnOnce(&mut C) + Send + 'static,
    ) -> Result<(), QueueError> {
        self.sender.try_enqueue(origin, action)
    }

    /// Run every action queued before the drain started, exactly once.
    ///
    /// Actions queued by the running actions stay for the next drain.
    /// Returns the number of actions run.
    pub fn drain(&self, context: &mut C) -> usize {
        let pending = self.receiver.len();
        match self.order {
            CommitOrder::Arrival => {
                let mut ran = 0;
                while ran < pending {
                    let Ok(queued) = self.receiver.try_recv() else {
                        break;
                    };
                    (queued.action)(context);
                    ran += 1;
                }
                ran
            }
            CommitOrder::ByEntity => {
                let mut batch: Vec<Queued<C>> = self.receiver.try_iter().take(pending).collect();
                // Stable: keeps arrival order within one origin
                batch.sort_by_key(|queued| queued.origin);
                let ran = batch.len();
                for queued in batch {
                    (queued.action)(context);
                }
                ran
            }
        }
    }

    /// Drop every queued action without running it
    pub fn clear(&self) -> usize {
        self.receiver.try_iter().count()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.sender.capacity
    }

    #[inline]
    pub fn order(&self) -> CommitOrder {
        self.order
    }
}

/// Clonable sender handle given to decide tasks and input handlers
pub struct ActionSender<C> {
    sender: Sender<Queued<C>>,
    capacity: usize,
}

impl<C> Clone for ActionSender<C> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            capacity: self.capacity,
        }
    }
}

impl<C> ActionSender<C> {
    /// Queue an action; panics when the queue is full.
    ///
    /// Capacity is sized from the population cap, so overflow means the
    /// configuration is wrong.
    pub fn enqueue(&self, origin: Origin, action: impl FnOnce(&mut C) + Send + 'static) {
        if let Err(err) = self.try_enqueue(origin, action) {
            tracing::error!(?origin, "Action queue overflow: {}", err);
            panic!("action queue overflow: {}", err);
        }
    }

    #[inline]
    pub fn try_enqueue(
        &self,
        origin: Origin,
        action: impl FnOnce(&mut C) + Send + 'static,
    ) -> Result<(), QueueError> {
        self.sender
            .try_send(Queued {
                origin,
                action: Box::new(action),
            })
            .map_err(|e| match e {
                TrySendError::Full(_) => QueueError::Full {
                    capacity: self.capacity,
                },
                TrySendError::Disconnected(_) => QueueError::Disconnected,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_drain_runs_fifo() {
        let queue: ActionQueue<Vec<u32>> = ActionQueue::new(10, CommitOrder::Arrival);
        for i in 0..5 {
            queue.enqueue(Origin::External, move |log: &mut Vec<u32>| log.push(i));
        }
        let mut log = Vec::new();
        assert_eq!(queue.drain(&mut log), 5);
        assert_eq!(log, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_reset_after_drain() {
        let queue: ActionQueue<Vec<u32>> = ActionQueue::new(4, CommitOrder::Arrival);
        for round in 0..3 {
            for i in 0..4 {
                queue.enqueue(Origin::Entity(i), move |log: &mut Vec<u32>| log.push(round));
            }
            let mut log = Vec::new();
            assert_eq!(queue.drain(&mut log), 4);
            assert_eq!(queue.len(), 0);
        }
        // Drain of an empty queue is a no-op
        assert_eq!(queue.drain(&mut Vec::new()), 0);
    }

    #[test]
    fn test_try_enqueue_full() {
        let queue: ActionQueue<()> = ActionQueue::new(2, CommitOrder::Arrival);
        assert!(queue.try_enqueue(Origin::External, |_| {}).is_ok());
        assert!(queue.try_enqueue(Origin::External, |_| {}).is_ok());
        assert_eq!(
            queue.try_enqueue(Origin::External, |_| {}),
            Err(QueueError::Full { capacity: 2 })
        );
        assert_eq!(queue.clear(), 2);
        assert!(queue.try_enqueue(Origin::External, |_| {}).is_ok());
    }

    #[test]
    #[should_panic(expected = "action queue overflow")]
    fn test_enqueue_overflow_panics() {
        let queue: ActionQueue<()> = ActionQueue::new(1, CommitOrder::Arrival);
        queue.enqueue(Origin::External, |_| {});
        queue.enqueue(Origin::External, |_| {});
    }

    #[test]
    fn test_actions_queued_during_drain_wait() {
        let queue: ActionQueue<Vec<u32>> = ActionQueue::new(10, CommitOrder::Arrival);
        let sender = queue.sender();
        queue.enqueue(Origin::External, move |log: &mut Vec<u32>| {
            log.push(1);
            sender.enqueue(Origin::External, |log: &mut Vec<u32>| log.push(2));
        });

        let mut log = Vec::new();
        assert_eq!(queue.drain(&mut log), 1);
        assert_eq!(log, vec![1]);
        assert_eq!(queue.drain(&mut log), 1);
        assert_eq!(log, vec![1, 2]);
    }

    #[test]
    fn test_per_origin_order_under_parallel_submission() {
        let queue: ActionQueue<Vec<(u64, u32)>> = ActionQueue::new(4000, CommitOrder::Arrival);
        let sender = queue.sender();
        (0..1000u64).into_par_iter().for_each(|id| {
            for step in 0..3u32 {
                sender.enqueue(Origin::Entity(id), move |log: &mut Vec<(u64, u32)>| {
                    log.push((id, step))
                });
            }
        });

        let mut log = Vec::new();
        assert_eq!(queue.drain(&mut log), 3000);
        let mut last_step = std::collections::HashMap::new();
        for (id, step) in log {
            let previous = last_step.insert(id, step);
            assert_eq!(previous.map_or(0, |p| p + 1), step, "entity {} out of order", id);
        }
    }

    #[test]
    fn test_by_entity_order() {
        let queue: ActionQueue<Vec<&'static str>> = ActionQueue::new(10, CommitOrder::ByEntity);
        queue.enqueue(Origin::Entity(9), |log: &mut Vec<&'static str>| log.push("e9"));
        queue.enqueue(Origin::Entity(2), |log: &mut Vec<&'static str>| log.push("e2a"));
        queue.enqueue(Origin::External, |log: &mut Vec<&'static str>| log.push("ext"));
        queue.enqueue(Origin::Entity(2), |log: &mut Vec<&'static str>| log.push("e2b"));

        let mut log = Vec::new();
        queue.drain(&mut log);
        assert_eq!(log, vec!["ext", "e2a", "e2b", "e9"]);
    }

    #[test]
    fn test_commit_order_parse() {
        assert_eq!("entity".parse::<CommitOrder>(), Ok(CommitOrder::ByEntity));
        assert_eq!("ARRIVAL".parse::<CommitOrder>(), Ok(CommitOrder::Arrival));
        assert!("random".parse::<CommitOrder>().is_err());
    }
}
