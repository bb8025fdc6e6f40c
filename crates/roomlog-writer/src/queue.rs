//! Bounded multi-producer, single-consumer intent queue.
//!
//! Unlike a plain channel, a full queue can evict its oldest entry to admit a
//! new one, so the policy is applied here under one lock rather than in every
//! producer.

use crate::{WriteError, WriteIntent, WriteResult};
use parking_lot::Mutex;
use roomlog_config::BackpressurePolicy;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::warn;

struct State {
    items: VecDeque<WriteIntent>,
    senders: usize,
    receiver_alive: bool,
    dropped: u64,
}

struct Shared {
    state: Mutex<State>,
    capacity: usize,
    policy: BackpressurePolicy,
    /// Signalled when an item is pushed or the last sender goes away.
    item_available: Notify,
    /// Signalled when an item is popped or the receiver goes away.
    space_available: Notify,
}

impl Shared {
    fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    fn dropped(&self) -> u64 {
        self.state.lock().dropped
    }
}

/// Constructor for the queue halves.
pub struct IntentQueue;

impl IntentQueue {
    /// Create a queue holding at most `capacity` intents (minimum 1).
    pub fn bounded(capacity: usize, policy: BackpressurePolicy) -> (IntentSender, IntentReceiver) {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity.min(1024)),
                senders: 1,
                receiver_alive: true,
                dropped: 0,
            }),
            capacity: capacity.max(1),
            policy,
            item_available: Notify::new(),
            space_available: Notify::new(),
        });

        (
            IntentSender {
                shared: shared.clone(),
            },
            IntentReceiver { shared },
        )
    }
}

/// Producer half. Clone one per worker.
pub struct IntentSender {
    shared: Arc<Shared>,
}

impl IntentSender {
    /// Queue an intent, applying the backpressure policy when full.
    pub async fn push(&self, intent: WriteIntent) -> WriteResult<()> {
        let shared = &self.shared;
        loop {
            // Register interest before checking state so a pop between the
            // check and the await is not missed.
            let notified = shared.space_available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = shared.state.lock();
                if !state.receiver_alive {
                    return Err(WriteError::QueueClosed);
                }

                if state.items.len() < shared.capacity {
                    state.items.push_back(intent);
                    drop(state);
                    shared.item_available.notify_one();
                    return Ok(());
                }

                match shared.policy {
                    BackpressurePolicy::Reject => {
                        return Err(WriteError::QueueFull {
                            capacity: shared.capacity,
                        });
                    }
                    BackpressurePolicy::DropOldest => {
                        let evicted = state.items.pop_front();
                        state.items.push_back(intent);
                        state.dropped += 1;
                        let dropped = state.dropped;
                        drop(state);

                        if let Some(evicted) = evicted {
                            warn!(
                                statement = %evicted.statement(),
                                rows = evicted.row_count(),
                                dropped_total = dropped,
                                "Write queue full, dropped oldest intent"
                            );
                        }
                        shared.item_available.notify_one();
                        return Ok(());
                    }
                    BackpressurePolicy::Block => {}
                }
            }

            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn policy(&self) -> BackpressurePolicy {
        self.shared.policy
    }

    /// True once the receiver is gone; every push fails from then on.
    pub fn is_closed(&self) -> bool {
        !self.shared.state.lock().receiver_alive
    }
}

impl Clone for IntentSender {
    fn clone(&self) -> Self {
        self.shared.state.lock().senders += 1;
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl Drop for IntentSender {
    fn drop(&mut self) {
        let last = {
            let mut state = self.shared.state.lock();
            state.senders -= 1;
            state.senders == 0
        };
        if last {
            self.shared.item_available.notify_one();
        }
    }
}

/// Consumer half, owned by the writer.
pub struct IntentReceiver {
    shared: Arc<Shared>,
}

impl IntentReceiver {
    /// Next intent in FIFO order.
    ///
    /// Returns `None` once every sender has been dropped and the queue is
    /// empty.
    pub async fn recv(&mut self) -> Option<WriteIntent> {
        let shared = &self.shared;
        loop {
            let notified = shared.item_available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = shared.state.lock();
                if let Some(intent) = state.items.pop_front() {
                    drop(state);
                    shared.space_available.notify_one();
                    return Some(intent);
                }
                if state.senders == 0 {
                    return None;
                }
            }

            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// True once every sender is gone. Queued items may remain.
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().senders == 0
    }

    /// Intents evicted under `drop-oldest` so far.
    pub fn dropped(&self) -> u64 {
        self.shared.dropped()
    }
}

impl Drop for IntentReceiver {
    fn drop(&mut self) {
        self.shared.state.lock().receiver_alive = false;
        self.shared.space_available.notify_waiters();
    }
}
