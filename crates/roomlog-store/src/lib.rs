//! SQLite store for room messages.
//!
//! This crate provides:
//! - Async SQLite executor with a dedicated thread, used by the only writer
//! - Short-lived read-only connections for lookups from any task
//! - Schema migrations
//! - Message and alias model types
//! - Typed bound values and the statement runner shared by every write path
//!
//! # Architecture
//!
//! One `AsyncDatabase` owns the mutating connection for the whole fleet.
//! Everything else reads through a `StoreReader`, which opens its own
//! connection per request on the blocking pool.
//!
//! ```ignore
//! let db = AsyncDatabase::open(path).await?;
//! let rows = db.call(move |conn| apply(conn, INSERT_MESSAGE, &values)).await?;
//!
//! let reader = StoreReader::new(path);
//! let latest = reader.latest_global_id("xkcd").await?;
//! ```

mod error;
mod executor;
mod migrations;
mod models;
pub mod queries;
mod reader;
mod statements;
mod values;

pub use error::{ErrorClass, StoreError, StoreResult};
pub use executor::AsyncDatabase;
pub use migrations::{run_migrations, CURRENT_VERSION};
pub use models::{global_id, normalize_name, RoomSummary, StoredMessage};
pub use reader::StoreReader;
pub use statements::INSERT_MESSAGE;
pub use values::{apply, BoundValues, ExecutionMode, SqlValue};
