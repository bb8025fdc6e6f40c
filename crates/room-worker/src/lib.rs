//! # room-worker
//!
//! One worker per monitored room. Each session runs:
//!
//! ```text
//! connect ──▶ backfill ──▶ live ──▶ (error) ──▶ wait ──▶ connect ...
//!                │
//!                └──▶ stop (backfill-only)
//! ```
//!
//! Backfill pages backward through the room's history until it reaches
//! messages already stored; live ingestion then records every new message as
//! it arrives. Both paths submit through the injected
//! [`WriteHandle`](roomlog_writer::WriteHandle) and rely on the store's unique
//! global id, so replaying a session after a reconnect never duplicates rows.

mod backfill;
mod error;
mod live;
mod message;
mod worker;

#[cfg(test)]
mod tests;

pub use backfill::{plan_page, run_backfill, BackfillReport, Completion, PagePlan, PAGE_SIZE};
pub use error::{WorkerError, WorkerResult};
pub use live::{ingest_live, run_live};
pub use message::{preview, to_stored};
pub use worker::{RoomWorker, WorkerConfig};
