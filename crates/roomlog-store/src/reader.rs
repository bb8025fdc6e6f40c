//! Short-lived read-only connections.
//!
//! Workers never touch the writer connection. Each read opens its own
//! connection on the blocking pool, runs one query, and closes it. In WAL mode
//! this never blocks the writer; a read may miss intents still queued.

use crate::{queries, RoomSummary, StoreError, StoreResult, StoredMessage};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Read-side handle to the store file. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StoreReader {
    path: PathBuf,
}

impl StoreReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` on a fresh read-only connection off the async runtime.
    pub async fn with_connection<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = open_read_only(&path)?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Connection(format!("read task failed: {}", e)))?
    }

    pub async fn latest_global_id(&self, room: &str) -> StoreResult<Option<String>> {
        let room = room.to_string();
        self.with_connection(move |conn| queries::latest_global_id(conn, &room))
            .await
    }

    pub async fn count_room(&self, room: &str) -> StoreResult<i64> {
        let room = room.to_string();
        self.with_connection(move |conn| queries::count_room(conn, &room))
            .await
    }

    pub async fn count_global_id(&self, global_id: &str) -> StoreResult<i64> {
        let global_id = global_id.to_string();
        self.with_connection(move |conn| queries::count_global_id(conn, &global_id))
            .await
    }

    pub async fn get_message(&self, global_id: &str) -> StoreResult<Option<StoredMessage>> {
        let global_id = global_id.to_string();
        self.with_connection(move |conn| queries::get_message(conn, &global_id))
            .await
    }

    pub async fn room_summary(&self, room: &str) -> StoreResult<RoomSummary> {
        let room = room.to_string();
        self.with_connection(move |conn| queries::room_summary(conn, &room))
            .await
    }

    pub async fn room_summaries(&self) -> StoreResult<Vec<RoomSummary>> {
        self.with_connection(queries::room_summaries).await
    }
}

fn open_read_only(path: &Path) -> StoreResult<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{apply, AsyncDatabase, BoundValues, StoredMessage, INSERT_MESSAGE};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_reader_sees_committed_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.sqlite");
        let db = AsyncDatabase::open(&path).await.unwrap();
        let reader = StoreReader::new(&path);

        assert_eq!(reader.latest_global_id("r").await.unwrap(), None);

        let msg = StoredMessage::new("r", "m1", None, "agent:1", "Tester", "hi", 1.0);
        let values = BoundValues::Single(msg.to_row());
        let expected = msg.clone();
        db.call(move |conn| apply(conn, INSERT_MESSAGE, &values))
            .await
            .unwrap();

        assert_eq!(
            reader.latest_global_id("r").await.unwrap().as_deref(),
            Some("rm1")
        );
        assert_eq!(reader.count_room("r").await.unwrap(), 1);
        assert_eq!(reader.count_global_id("rm1").await.unwrap(), 1);
        assert_eq!(reader.room_summaries().await.unwrap().len(), 1);
        assert_eq!(reader.get_message("rm1").await.unwrap(), Some(expected));
    }

    #[tokio::test]
    async fn test_reader_cannot_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.sqlite");
        let _db = AsyncDatabase::open(&path).await.unwrap();
        let reader = StoreReader::new(&path);

        let result = reader
            .with_connection(|conn| {
                conn.execute("DELETE FROM messages", [])?;
                Ok(())
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let reader = StoreReader::new(dir.path().join("absent.sqlite"));
        assert!(reader.count_room("r").await.is_err());
    }
}
