//! History reconciliation.
//!
//! The remote log can only be read backwards: "up to N messages before X".
//! Backfill starts from the newest message and walks back one page at a time
//! until a page tells it there is nothing older left to store:
//!
//! | Page                                   | Result       |
//! |----------------------------------------|--------------|
//! | empty                                  | `Empty`      |
//! | write rejected as duplicate            | `Collision`  |
//! | contains the newest stored message     | `Overlap`    |
//! | fewer than `PAGE_SIZE` messages        | `ShortPage`  |
//! | full                                   | next page    |
//!
//! A full page triggers the request for the next one before the page is
//! written, so the server is already working while the store catches up.

use crate::live::ingest_live;
use crate::message::{preview, to_stored};
use crate::WorkerResult;
use room_gateway::{ChatGateway, GatewayEvent, Outgoing, RemoteMessage};
use roomlog_store::StoredMessage;
use roomlog_writer::{IntentSink, WriteIntent, WriteOutcome};
use std::collections::HashSet;
use tracing::{debug, info, trace};

/// Messages requested per history page.
pub const PAGE_SIZE: usize = 1000;

/// Why a backfill stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The server had no (more) history.
    Empty,
    /// The last page was not full, so it reached the start of the room.
    ShortPage,
    /// A page reached the newest message already stored.
    Overlap,
    /// The store rejected a page as duplicate.
    Collision,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillReport {
    /// Pages received.
    pub pages: usize,
    /// History requests sent, including one still in flight.
    pub requests: usize,
    /// Rows handed to the writer.
    pub rows_submitted: usize,
    /// Live messages ingested while waiting for pages.
    pub live_ingested: usize,
    /// Global id of the newest message handed to the writer, by time.
    /// Includes live messages ingested while a page was outstanding.
    pub newest_global_id: Option<String>,
    pub completion: Completion,
}

/// What to do with one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    /// Messages to store, oldest first.
    pub to_write: Vec<StoredMessage>,
    /// The page contains the newest stored message.
    pub overlap: bool,
    /// Cursor for the next request when the page was full.
    pub next_before: Option<String>,
}

/// Decide what to store from `page` (ordered oldest to newest).
///
/// When `latest_known` appears in the page, only messages after it are
/// written; everything up to and including it is already stored.
pub fn plan_page(room: &str, page: &[RemoteMessage], latest_known: Option<&str>) -> PagePlan {
    let stored: Vec<StoredMessage> = page.iter().map(|m| to_stored(room, m)).collect();

    let overlap_at = latest_known.and_then(|latest| stored.iter().position(|m| m.global_id == latest));

    let to_write = match overlap_at {
        Some(index) => stored[index + 1..].to_vec(),
        None => stored,
    };

    let next_before = if page.len() >= PAGE_SIZE {
        page.first().map(|m| m.id.clone())
    } else {
        None
    };

    PagePlan {
        to_write,
        overlap: overlap_at.is_some(),
        next_before,
    }
}

/// Newest message by time among pages and live events.
#[derive(Default)]
struct NewestSeen {
    time: f64,
    global_id: Option<String>,
}

impl NewestSeen {
    fn observe(&mut self, room: &str, message: &RemoteMessage) {
        if self.global_id.is_none() || message.time >= self.time {
            self.time = message.time;
            self.global_id = Some(roomlog_store::global_id(room, &message.id));
        }
    }
}

/// Whether the page just handled ends the backfill.
fn completion_after(page_len: usize, plan: &PagePlan, outcome: Option<WriteOutcome>) -> Option<Completion> {
    if page_len == 0 {
        Some(Completion::Empty)
    } else if outcome == Some(WriteOutcome::Duplicate) {
        Some(Completion::Collision)
    } else if plan.overlap {
        Some(Completion::Overlap)
    } else if plan.next_before.is_none() {
        Some(Completion::ShortPage)
    } else {
        None
    }
}

/// Page backward through `gateway` until reaching stored history.
///
/// The gateway must be connected. Live messages that arrive while a page is
/// outstanding are ingested immediately.
pub async fn run_backfill<G>(
    gateway: &mut G,
    writer: &dyn IntentSink,
    latest_known: Option<&str>,
) -> WorkerResult<BackfillReport>
where
    G: ChatGateway + ?Sized,
{
    let room = gateway.room().to_string();
    let mut report = BackfillReport {
        pages: 0,
        requests: 0,
        rows_submitted: 0,
        live_ingested: 0,
        newest_global_id: None,
        completion: Completion::Empty,
    };

    info!(room = %room, latest_known = ?latest_known, "Backfill started");

    gateway
        .send(Outgoing::Log {
            n: PAGE_SIZE,
            before: None,
        })
        .await?;
    report.requests += 1;

    let mut newest = NewestSeen::default();
    // Live messages already stored; a page containing them must not collide.
    let mut ingested_live: HashSet<String> = HashSet::new();

    let completion = loop {
        let page = match gateway.receive().await? {
            GatewayEvent::LogReply { log, .. } => log,
            GatewayEvent::SendEvent(message) | GatewayEvent::SendReply(message) => {
                ingest_live(writer, &room, &message).await?;
                newest.observe(&room, &message);
                ingested_live.insert(roomlog_store::global_id(&room, &message.id));
                report.live_ingested += 1;
                continue;
            }
            GatewayEvent::Other(kind) => {
                trace!(room = %room, kind = %kind, "Ignoring packet during backfill");
                continue;
            }
        };
        report.pages += 1;

        let mut plan = plan_page(&room, &page, latest_known);
        if !ingested_live.is_empty() {
            plan.to_write.retain(|m| !ingested_live.contains(&m.global_id));
        }

        if let Some(last) = page.last() {
            newest.observe(&room, last);
        }

        if let Some(before) = &plan.next_before {
            gateway
                .send(Outgoing::Log {
                    n: PAGE_SIZE,
                    before: Some(before.clone()),
                })
                .await?;
            report.requests += 1;
            if let Some(first) = page.first() {
                debug!(room = %room, page = report.pages, "{}", preview(first));
            }
        }

        let outcome = if plan.to_write.is_empty() {
            None
        } else {
            let outcome = writer
                .submit(WriteIntent::insert_messages(&plan.to_write))
                .await?;
            if outcome != WriteOutcome::Duplicate {
                report.rows_submitted += plan.to_write.len();
            }
            Some(outcome)
        };

        if let Some(done) = completion_after(page.len(), &plan, outcome) {
            break done;
        }
    };

    report.completion = completion;
    report.newest_global_id = newest.global_id;
    info!(
        room = %room,
        completion = ?report.completion,
        pages = report.pages,
        requests = report.requests,
        rows = report.rows_submitted,
        live = report.live_ingested,
        "Backfill finished"
    );
    Ok(report)
}
