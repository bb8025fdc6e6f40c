//! Per-room session driver.

use crate::backfill::{run_backfill, BackfillReport};
use crate::live::run_live;
use crate::WorkerResult;
use room_gateway::ChatGateway;
use roomlog_store::StoreReader;
use roomlog_writer::WriteHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How a worker runs its sessions.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Stop after the first completed backfill instead of staying live.
    pub backfill_only: bool,
    /// Pause before reconnecting after a failed session.
    pub reconnect_delay: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            backfill_only: false,
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

/// Monitors one room: backfill, then live ingestion, reconnecting on failure.
pub struct RoomWorker<G> {
    gateway: G,
    writer: WriteHandle,
    reader: StoreReader,
    config: WorkerConfig,
    /// Newest global id this worker handed to the writer.
    ///
    /// Used instead of the store's latest id while it is still queued.
    cursor: Option<String>,
}

impl<G: ChatGateway> RoomWorker<G> {
    pub fn new(gateway: G, writer: WriteHandle, reader: StoreReader, config: WorkerConfig) -> Self {
        Self {
            gateway,
            writer,
            reader,
            config,
            cursor: None,
        }
    }

    pub fn room(&self) -> &str {
        self.gateway.room()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// One connect, backfill, live cycle.
    ///
    /// Returns the backfill report in backfill-only mode. Otherwise it only
    /// returns when the session fails.
    pub async fn run_session(&mut self) -> WorkerResult<BackfillReport> {
        self.gateway.connect().await?;

        let room = self.gateway.room().to_string();
        let stored = self.reader.latest_global_id(&room).await?;
        // A cursor the store has not seen yet is still queued for the writer.
        let pending = match &self.cursor {
            Some(cursor) => self.reader.count_global_id(cursor).await? == 0,
            None => false,
        };
        let latest = if pending { self.cursor.clone() } else { stored };
        debug!(room = %room, latest = ?latest, pending, "Reconciling from");

        let report = run_backfill(&mut self.gateway, self.writer.as_ref(), latest.as_deref()).await?;
        if report.newest_global_id.is_some() {
            self.cursor = report.newest_global_id.clone();
        }

        if self.config.backfill_only {
            return Ok(report);
        }

        run_live(&mut self.gateway, self.writer.as_ref(), &mut self.cursor).await?;
        Ok(report)
    }

    /// Run sessions until backfill-only completes or a terminal error occurs.
    pub async fn run(mut self) -> WorkerResult<BackfillReport> {
        let room = self.gateway.room().to_string();
        info!(room = %room, backfill_only = self.config.backfill_only, "Worker started");

        loop {
            let result = self.run_session().await;

            if let Err(e) = self.gateway.disconnect().await {
                debug!(room = %room, error = %e, "Disconnect failed");
            }

            match result {
                Ok(report) => {
                    info!(room = %room, "Worker finished");
                    return Ok(report);
                }
                Err(e) if e.is_terminal() => {
                    error!(room = %room, error = %e, "Worker stopped");
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        room = %room,
                        error = %e,
                        delay_ms = self.config.reconnect_delay.as_millis() as u64,
                        "Session ended, reconnecting"
                    );
                    tokio::time::sleep(self.config.reconnect_delay).await;
                }
            }
        }
    }
}

