//! Applying one intent to the store.

use crate::disposition::{disposition, Disposition};
use crate::{RetryPolicy, WriteIntent};
use roomlog_store::{apply, AsyncDatabase, StoreResult};
use std::sync::Arc;

/// Result of applying an intent that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Applied {
    Committed(usize),
    Duplicate,
}

/// Apply `intent` on the writer connection.
///
/// Busy/locked errors are retried under `retry`; a constraint violation
/// becomes [`Applied::Duplicate`]; anything else is returned.
pub(crate) async fn execute_intent(
    db: &AsyncDatabase,
    intent: Arc<WriteIntent>,
    retry: &RetryPolicy,
) -> StoreResult<Applied> {
    let result = retry
        .run(|_| {
            let intent = intent.clone();
            db.call(move |conn| apply(conn, intent.statement(), intent.values()))
        })
        .await;

    match result {
        Ok(rows) => Ok(Applied::Committed(rows)),
        Err(err) if disposition(&err) == Disposition::Ignore => Ok(Applied::Duplicate),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomlog_store::{queries, StoredMessage};
    use tempfile::tempdir;

    fn message(id: &str) -> StoredMessage {
        StoredMessage::new("r", id, None, "agent:1", "Tester", "hi", 1.0)
    }

    #[tokio::test]
    async fn test_duplicate_is_ignored() {
        let dir = tempdir().unwrap();
        let db = AsyncDatabase::open(&dir.path().join("store.sqlite"))
            .await
            .unwrap();
        let retry = RetryPolicy::default();
        let intent = Arc::new(WriteIntent::insert_message(&message("m1")));

        let first = execute_intent(&db, intent.clone(), &retry).await.unwrap();
        let second = execute_intent(&db, intent, &retry).await.unwrap();

        assert_eq!(first, Applied::Committed(1));
        assert_eq!(second, Applied::Duplicate);
        let count = db
            .call(|conn| queries::count_global_id(conn, "rm1"))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_bad_statement_is_returned() {
        let dir = tempdir().unwrap();
        let db = AsyncDatabase::open(&dir.path().join("store.sqlite"))
            .await
            .unwrap();
        let intent = Arc::new(WriteIntent::single("INSERT INTO nowhere VALUES(1)", vec![]));

        let result = execute_intent(&db, intent, &RetryPolicy::default()).await;
        assert!(result.is_err());
    }
}
