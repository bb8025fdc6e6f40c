//! Fleet mode: many rooms, one writer.

use super::{gateway_for, unique_rooms, worker_config};
use room_worker::RoomWorker;
use roomlog_config::{Config, Paths};
use roomlog_store::{AsyncDatabase, StoreReader};
use roomlog_writer::{RetryPolicy, WriteHandle, WriterActor};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Run one worker per room until Ctrl-C or every worker has stopped.
///
/// On shutdown the workers are cancelled first; the writer then drains
/// whatever they had already queued before the store is closed.
pub async fn run_fleet(
    config: Config,
    paths: Paths,
    rooms: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let requested = if rooms.is_empty() {
        config.rooms.clone()
    } else {
        rooms
    };
    let rooms = unique_rooms(requested);
    if rooms.is_empty() {
        return Err("no rooms to monitor: pass room names or set `rooms` in config.json".into());
    }

    paths.ensure_dirs()?;
    let db = AsyncDatabase::open(&paths.database_file()).await?;
    let reader = StoreReader::new(paths.database_file());

    let (actor, sender) = WriterActor::with_queue(
        db.clone(),
        config.queue_capacity,
        config.backpressure,
        RetryPolicy::from_config(&config),
    );
    let writer_task = tokio::spawn(actor.run());

    let mut workers = JoinSet::new();
    for room in &rooms {
        let gateway = gateway_for(&config, room, false)?;
        let handle: WriteHandle = Arc::new(sender.clone());
        let worker = RoomWorker::new(gateway, handle, reader.clone(), worker_config(&config, false));
        let room = room.clone();
        workers.spawn(async move { (room, worker.run().await) });
    }
    // Workers hold the only remaining senders.
    drop(sender);

    info!(
        rooms = rooms.len(),
        store = %paths.database_file().display(),
        backpressure = ?config.backpressure,
        "Fleet started"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                if let Err(e) = signal {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                info!("Shutdown requested, stopping workers");
                workers.abort_all();
                break;
            }
            joined = workers.join_next() => match joined {
                Some(Ok((room, Ok(_)))) => info!(room = %room, "Worker exited"),
                Some(Ok((room, Err(e)))) => error!(room = %room, error = %e, "Worker stopped"),
                Some(Err(e)) => error!(error = %e, "Worker task failed"),
                None => {
                    warn!("Every worker has stopped");
                    break;
                }
            },
        }
    }

    while workers.join_next().await.is_some() {}

    let stats = writer_task.await?;
    info!(
        committed = stats.committed,
        duplicates = stats.duplicates,
        failed = stats.failed,
        rows = stats.rows,
        dropped = stats.dropped,
        "Writer drained"
    );

    db.close().await?;
    info!("Fleet stopped");
    Ok(())
}
