//! The single writer.
//!
//! Owns the only mutating connection. Intents are applied one at a time in
//! dequeue order; a failing intent is logged and counted, and the loop moves
//! on to the next one.

use crate::execute::{execute_intent, Applied};
use crate::{IntentQueue, IntentReceiver, IntentSender, RetryPolicy};
use roomlog_config::BackpressurePolicy;
use roomlog_store::AsyncDatabase;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Counters kept by the writer over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Intents committed.
    pub committed: u64,
    /// Intents rejected as duplicates.
    pub duplicates: u64,
    /// Intents that failed for any other reason.
    pub failed: u64,
    /// Rows changed by committed intents.
    pub rows: u64,
    /// Intents evicted by the queue before reaching the writer.
    pub dropped: u64,
}

pub struct WriterActor {
    db: AsyncDatabase,
    receiver: IntentReceiver,
    retry: RetryPolicy,
    stats: WriterStats,
}

impl WriterActor {
    pub fn new(db: AsyncDatabase, receiver: IntentReceiver, retry: RetryPolicy) -> Self {
        Self {
            db,
            receiver,
            retry,
            stats: WriterStats::default(),
        }
    }

    /// Build the queue and the actor that drains it.
    pub fn with_queue(
        db: AsyncDatabase,
        capacity: usize,
        policy: BackpressurePolicy,
        retry: RetryPolicy,
    ) -> (Self, IntentSender) {
        let (sender, receiver) = IntentQueue::bounded(capacity, policy);
        (Self::new(db, receiver, retry), sender)
    }

    /// Drain the queue until every sender is dropped, then return the stats.
    ///
    /// The database handle is not closed here; the caller still owns clones.
    pub async fn run(mut self) -> WriterStats {
        info!(
            capacity = self.receiver.capacity(),
            path = %self.db.path().display(),
            "Writer started"
        );

        while let Some(intent) = self.receiver.recv().await {
            let intent = Arc::new(intent);
            match execute_intent(&self.db, intent.clone(), &self.retry).await {
                Ok(Applied::Committed(rows)) => {
                    self.stats.committed += 1;
                    self.stats.rows += rows as u64;
                }
                Ok(Applied::Duplicate) => {
                    self.stats.duplicates += 1;
                    debug!(
                        rows = intent.row_count(),
                        queued = self.receiver.len(),
                        "Duplicate write ignored"
                    );
                }
                Err(err) => {
                    self.stats.failed += 1;
                    error!(
                        error = %err,
                        intent = %intent.to_wire_string(),
                        "Write failed"
                    );
                }
            }
        }

        self.stats.dropped = self.receiver.dropped();
        info!(
            committed = self.stats.committed,
            duplicates = self.stats.duplicates,
            failed = self.stats.failed,
            rows = self.stats.rows,
            dropped = self.stats.dropped,
            "Writer drained"
        );
        self.stats
    }
}
