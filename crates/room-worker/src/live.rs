//! Live ingestion.

use crate::message::to_stored;
use crate::WorkerResult;
use room_gateway::{ChatGateway, GatewayEvent, RemoteMessage};
use roomlog_writer::{IntentSink, WriteIntent, WriteOutcome};
use tracing::{debug, trace};

/// Store one message as it arrives.
///
/// A message already stored (seen during backfill or a previous session) is
/// reported as [`WriteOutcome::Duplicate`], not an error.
pub async fn ingest_live(
    writer: &dyn IntentSink,
    room: &str,
    message: &RemoteMessage,
) -> WorkerResult<WriteOutcome> {
    let stored = to_stored(room, message);
    let outcome = writer.submit(WriteIntent::insert_message(&stored)).await?;

    if outcome == WriteOutcome::Duplicate {
        debug!(room = %room, global_id = %stored.global_id, "Live message already stored");
    } else {
        trace!(room = %room, global_id = %stored.global_id, "Live message submitted");
    }
    Ok(outcome)
}

/// Ingest send events until the session fails.
///
/// `cursor` tracks the newest global id handed to the writer. Log replies
/// that arrive late from the backfill are ignored.
pub async fn run_live<G>(
    gateway: &mut G,
    writer: &dyn IntentSink,
    cursor: &mut Option<String>,
) -> WorkerResult<()>
where
    G: ChatGateway + ?Sized,
{
    let room = gateway.room().to_string();
    debug!(room = %room, "Live ingestion started");

    loop {
        match gateway.receive().await? {
            GatewayEvent::SendEvent(message) | GatewayEvent::SendReply(message) => {
                ingest_live(writer, &room, &message).await?;
                *cursor = Some(roomlog_store::global_id(&room, &message.id));
            }
            GatewayEvent::LogReply { log, before } => {
                trace!(room = %room, messages = log.len(), before = ?before, "Ignoring late log reply");
            }
            GatewayEvent::Other(kind) => {
                trace!(room = %room, kind = %kind, "Ignoring packet");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomlog_store::AsyncDatabase;
    use roomlog_writer::{DirectWriter, RetryPolicy};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_ingest_live_is_idempotent() {
        let dir = tempdir().unwrap();
        let db = AsyncDatabase::open(&dir.path().join("store.sqlite"))
            .await
            .unwrap();
        let writer = DirectWriter::new(db, RetryPolicy::default());
        let message = RemoteMessage::new("m1", 1.0, "Tester", "hello");

        let first = ingest_live(&writer, "r", &message).await.unwrap();
        let second = ingest_live(&writer, "r", &message).await.unwrap();

        assert_eq!(first, WriteOutcome::Committed { rows: 1 });
        assert_eq!(second, WriteOutcome::Duplicate);
    }
}
