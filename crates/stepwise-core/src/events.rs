//! Step change notifications.
//!
//! Events fan out over a tokio broadcast channel. They exist so readers can
//! invalidate cached views; the store stays the source of truth and nothing in
//! the engine reads state from an event.

use log::warn;
use tokio::sync::broadcast;

use crate::models::StepStatus;

/// Default number of undelivered events a slow subscriber may fall behind by.
pub const DEFAULT_CAPACITY: usize = 256;

/// A change to a goal's steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEvent {
    StepCreated {
        goal_id: u64,
        step_id: u64,
    },
    StatusChanged {
        goal_id: u64,
        step_id: u64,
        status: StepStatus,
    },
    SubstepChanged {
        goal_id: u64,
        step_id: u64,
        substep_id: u64,
    },
}

impl StepEvent {
    pub fn goal_id(&self) -> u64 {
        match self {
            StepEvent::StepCreated { goal_id, .. }
            | StepEvent::StatusChanged { goal_id, .. }
            | StepEvent::SubstepChanged { goal_id, .. } => *goal_id,
        }
    }
}

/// Publisher side of the step change channel.
#[derive(Debug, Clone)]
pub struct StepEvents {
    tx: broadcast::Sender<StepEvent>,
}

impl StepEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Send an event to every live subscriber. Having none is fine.
    pub fn publish(&self, event: StepEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to the events of one goal.
    pub fn subscribe(&self, goal_id: u64) -> GoalSubscription {
        GoalSubscription {
            goal_id,
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for StepEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Receiver filtered to a single goal.
#[derive(Debug)]
pub struct GoalSubscription {
    goal_id: u64,
    rx: broadcast::Receiver<StepEvent>,
}

impl GoalSubscription {
    pub fn goal_id(&self) -> u64 {
        self.goal_id
    }

    /// Next event for this goal, or `None` once the publisher is gone.
    ///
    /// A subscriber that fell behind skips the events it missed; it should
    /// treat that as "anything may have changed".
    pub async fn recv(&mut self) -> Option<StepEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.goal_id() == self.goal_id => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(
                        "Subscriber for goal {} missed {missed} step event(s)",
                        self.goal_id
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next event for this goal that is already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<StepEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if event.goal_id() == self.goal_id => return Some(event),
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => return None,
            }
        }
    }
}
