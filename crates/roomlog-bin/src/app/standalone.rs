//! Standalone mode: one room, writing on the worker's own task.

use super::{gateway_for, worker_config};
use room_worker::RoomWorker;
use roomlog_config::{Config, Paths};
use roomlog_store::{AsyncDatabase, StoreReader};
use roomlog_writer::{DirectWriter, RetryPolicy};
use std::sync::Arc;
use tracing::info;

/// Monitor `room` until Ctrl-C, a terminal error, or (with `backfill_only`)
/// until its history is reconciled.
///
/// Must not share a store with a running fleet: the direct writer assumes it
/// is the only one.
pub async fn run_watch(
    config: Config,
    paths: Paths,
    room: String,
    backfill_only: bool,
    stealth: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    paths.ensure_dirs()?;
    let db = AsyncDatabase::open(&paths.database_file()).await?;
    let reader = StoreReader::new(paths.database_file());
    let writer = Arc::new(DirectWriter::new(db.clone(), RetryPolicy::from_config(&config)));

    let gateway = gateway_for(&config, &room, stealth)?;
    let worker = RoomWorker::new(gateway, writer, reader.clone(), worker_config(&config, backfill_only));

    let result = tokio::select! {
        result = worker.run() => Some(result),
        _ = tokio::signal::ctrl_c() => {
            info!(room = %room, "Shutdown requested");
            None
        }
    };

    if let Some(result) = result {
        let report = result?;
        let stored = reader.count_room(&room).await?;
        println!(
            "{}: {:?} after {} page(s), {} new, {} stored",
            room, report.completion, report.pages, report.rows_submitted, stored
        );
    }

    db.close().await?;
    Ok(())
}
