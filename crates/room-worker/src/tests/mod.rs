//! Scenario tests for room workers.
//!
//! Rules covered, by file:
//!
//! - `backfill.rs`  - Rules 1-8 (History reconciliation)
//! - `live.rs`      - Rules 9-12 (Live ingestion)
//! - `fleet.rs`     - Rules 13-15 (Shared writer)
//! - `reconnect.rs` - Rules 16-20 (Session lifecycle)
//!
//! Every scenario runs against a [`ScriptedGateway`](room_gateway::ScriptedGateway)
//! and a real store in a temporary directory.


use room_gateway::RemoteMessage;
use roomlog_store::{AsyncDatabase, StoreReader, StoredMessage};
use roomlog_writer::{DirectWriter, IntentSink, RetryPolicy, WriteIntent};
use std::path::Path;

/// Same shape as `ScriptedGateway::with_numbered_history`.
pub(crate) fn numbered(prefix: &str, range: std::ops::RangeInclusive<usize>) -> Vec<RemoteMessage> {
    range
        .map(|n| {
            RemoteMessage::new(
                &format!("{prefix}{n}"),
                1_500_000_000.0 + n as f64,
                "Tester",
                &format!("message {n}"),
            )
        })
        .collect()
}

pub(crate) async fn open_store(dir: &Path) -> (DirectWriter, StoreReader) {
    let path = dir.join("roomlog.sqlite");
    let db = AsyncDatabase::open(&path).await.unwrap();
    (
        DirectWriter::new(db, RetryPolicy::default()),
        StoreReader::new(path),
    )
}

/// Store `messages` for `room` as if a previous run had recorded them.
pub(crate) async fn seed(writer: &DirectWriter, room: &str, messages: &[RemoteMessage]) {
    let rows: Vec<StoredMessage> = messages
        .iter()
        .map(|m| crate::to_stored(room, m))
        .collect();
    writer
        .submit(WriteIntent::insert_messages(&rows))
        .await
        .unwrap();
}
