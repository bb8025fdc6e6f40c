//! Producer-facing write handles.

use crate::execute::{execute_intent, Applied};
use crate::{IntentSender, RetryPolicy, WriteIntent, WriteResult};
use async_trait::async_trait;
use roomlog_store::AsyncDatabase;
use std::sync::Arc;
use tracing::debug;

/// What happened to a submitted intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Written and committed. `rows` counts changed rows.
    Committed { rows: usize },
    /// Rejected by a uniqueness constraint. Nothing was written.
    Duplicate,
    /// Accepted by the writer queue; the writer commits it later.
    Enqueued,
}

impl From<Applied> for WriteOutcome {
    fn from(applied: Applied) -> Self {
        match applied {
            Applied::Committed(rows) => WriteOutcome::Committed { rows },
            Applied::Duplicate => WriteOutcome::Duplicate,
        }
    }
}

/// Anything a worker can hand write intents to.
///
/// Implementors:
/// - [`IntentSender`]: fleet mode, queue for the shared writer.
/// - [`DirectWriter`]: standalone mode, commit before returning.
#[async_trait]
pub trait IntentSink: Send + Sync {
    async fn submit(&self, intent: WriteIntent) -> WriteResult<WriteOutcome>;
}

/// Handle injected into every worker.
pub type WriteHandle = Arc<dyn IntentSink>;

#[async_trait]
impl IntentSink for IntentSender {
    async fn submit(&self, intent: WriteIntent) -> WriteResult<WriteOutcome> {
        self.push(intent).await?;
        Ok(WriteOutcome::Enqueued)
    }
}

/// Writes straight to the store on the caller's task.
///
/// Only valid when nothing else writes to the same file.
#[derive(Clone)]
pub struct DirectWriter {
    db: AsyncDatabase,
    retry: RetryPolicy,
}

impl DirectWriter {
    pub fn new(db: AsyncDatabase, retry: RetryPolicy) -> Self {
        Self { db, retry }
    }

    pub fn database(&self) -> &AsyncDatabase {
        &self.db
    }
}

#[async_trait]
impl IntentSink for DirectWriter {
    async fn submit(&self, intent: WriteIntent) -> WriteResult<WriteOutcome> {
        let rows = intent.row_count();
        let applied = execute_intent(&self.db, Arc::new(intent), &self.retry).await?;
        if applied == Applied::Duplicate {
            debug!(rows, "Duplicate write ignored");
        }
        Ok(applied.into())
    }
}
