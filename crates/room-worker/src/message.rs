//! Remote message conversion and display.

use chrono::{DateTime, Utc};
use room_gateway::RemoteMessage;
use roomlog_store::StoredMessage;

const PREVIEW_WIDTH: usize = 80;

/// Store row for a message seen in `room`.
pub fn to_stored(room: &str, message: &RemoteMessage) -> StoredMessage {
    StoredMessage::new(
        room,
        &message.id,
        message.parent.as_deref(),
        &message.sender.id,
        &message.sender.name,
        &message.content,
        message.time,
    )
}

/// One-line summary: `YYYY-MM-DD HH:MM [sender] first line of content`.
///
/// Only the first line is kept, cut to 80 characters.
pub fn preview(message: &RemoteMessage) -> String {
    let when = DateTime::<Utc>::from_timestamp(message.time as i64, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "????-??-?? ??:??".to_string());
    let first_line: String = message
        .content
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(PREVIEW_WIDTH)
        .collect();
    format!("{when} [{}] {first_line}", message.sender.name)
}
