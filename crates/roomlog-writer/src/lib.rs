//! # roomlog-writer
//!
//! The single write path into the store.
//!
//! ```text
//! RoomWorker ──┐
//! RoomWorker ──┼──▶ IntentQueue ──▶ WriterActor ──▶ AsyncDatabase
//! RoomWorker ──┘    (bounded)       (one task)      (one thread)
//! ```
//!
//! Producers hold a [`WriteHandle`] and call [`IntentSink::submit`]. In fleet
//! mode the handle is an [`IntentSender`] and every write is committed later
//! by the [`WriterActor`]. A standalone worker gets a [`DirectWriter`] that
//! commits before returning. Either way the producer sees a typed
//! [`WriteOutcome`] or a typed [`WriteError`] and never waits on an
//! acknowledgement from the other side of the queue.
//!
//! Store failures are sorted by the table in [`disposition`]: duplicates are
//! ignored, busy/locked errors are retried with backoff, everything else is
//! reported.

mod actor;
pub mod disposition;
mod error;
mod execute;
mod intent;
mod queue;
mod retry;
mod sink;
mod wire;

pub use actor::{WriterActor, WriterStats};
pub use disposition::Disposition;
pub use error::{IntentError, IntentResult, WriteError, WriteResult};
pub use intent::WriteIntent;
pub use queue::{IntentQueue, IntentReceiver, IntentSender};
pub use retry::RetryPolicy;
pub use sink::{DirectWriter, IntentSink, WriteHandle, WriteOutcome};
pub use wire::{mode_from_wire, mode_to_wire};

pub use roomlog_config::BackpressurePolicy;
