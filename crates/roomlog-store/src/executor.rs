//! Async SQLite executor using a dedicated background thread.
//!
//! This is the only connection in the process that mutates the store:
//! - All SQLite work runs on one dedicated thread
//! - Callers send closures through a channel and await the result
//! - Closures execute in FIFO order, so writes never overlap
//!
//! Only SQL and lightweight row mapping belong inside `call()`. Anything
//! slow blocks every other write queued behind it.
//!
//! # Example
//!
//! ```ignore
//! let db = AsyncDatabase::open(path).await?;
//!
//! let rows = db
//!     .call(move |conn| apply(conn, INSERT_MESSAGE, &values))
//!     .await?;
//! ```

use crate::{migrations, StoreError, StoreResult};
use std::path::{Path, PathBuf};
use tokio_rusqlite::Connection;
use tracing::{debug, info, warn};

/// Convert a tokio_rusqlite::Error to StoreError.
fn from_tokio_rusqlite(e: tokio_rusqlite::Error) -> StoreError {
    match e {
        tokio_rusqlite::Error::Rusqlite(e) => StoreError::Sqlite(e),
        tokio_rusqlite::Error::Close(_) => StoreError::Connection("Connection closed".to_string()),
        other => StoreError::Connection(other.to_string()),
    }
}

/// Async SQLite database with a dedicated executor thread.
#[derive(Clone)]
pub struct AsyncDatabase {
    conn: Connection,
    path: PathBuf,
}

impl AsyncDatabase {
    /// Open the store at the given path.
    ///
    /// This will:
    /// - Create the database file and its parent directory if needed
    /// - Enable WAL mode and verify SQLite accepted it
    /// - Run any pending migrations
    pub async fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!(path = %path.display(), "Opening store");

        let conn = Connection::open(path)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let journal_mode = conn
            .call(|conn| {
                conn.execute_batch(
                    "
                    PRAGMA synchronous = NORMAL;
                    PRAGMA cache_size = -64000;
                    PRAGMA temp_store = MEMORY;
                    PRAGMA busy_timeout = 5000;
                    ",
                )?;
                let mode: String =
                    conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
                Ok(mode)
            })
            .await
            .map_err(from_tokio_rusqlite)?;

        if !journal_mode.eq_ignore_ascii_case("wal") {
            warn!(
                path = %path.display(),
                journal_mode = %journal_mode,
                "Store is not in WAL mode; readers may block the writer"
            );
        }

        conn.call(|conn| {
            migrations::run_migrations(conn)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            Ok(())
        })
        .await
        .map_err(from_tokio_rusqlite)?;

        info!(path = %path.display(), journal_mode = %journal_mode, "Store initialized");

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Execute a closure on the writer connection.
    ///
    /// The closure runs on the dedicated SQLite thread. The caller's task is
    /// parked, not blocked, until the result is ready. A mutable connection is
    /// handed out so the closure can open a transaction.
    pub async fn call<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut rusqlite::Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        // Our result rides inside tokio_rusqlite's Ok so StoreError survives intact.
        let outer_result = self.conn.call(move |conn| Ok(f(conn))).await;

        match outer_result {
            Ok(inner) => inner,
            Err(e) => Err(from_tokio_rusqlite(e)),
        }
    }

    /// Execute a closure that returns a rusqlite::Result.
    pub async fn call_sqlite<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.conn
            .call(move |conn| Ok(f(conn)?))
            .await
            .map_err(from_tokio_rusqlite)
    }

    /// Get the database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check the connection by executing a trivial query.
    pub async fn health_check(&self) -> StoreResult<()> {
        self.call_sqlite(|conn| conn.execute_batch("SELECT 1"))
            .await?;
        debug!("Store health check passed");
        Ok(())
    }

    /// Close the connection after pending operations finish.
    pub async fn close(self) -> StoreResult<()> {
        self.conn
            .close()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to close store: {:?}", e)))?;
        info!(path = %self.path.display(), "Store closed");
        Ok(())
    }
}
