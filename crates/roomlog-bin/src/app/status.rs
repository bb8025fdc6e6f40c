//! Store status.

use chrono::{DateTime, Utc};
use roomlog_config::Paths;
use roomlog_store::{RoomSummary, StoreReader, StoredMessage};

/// Print per-room message counts. A single room also shows its newest message.
pub async fn check_status(
    paths: &Paths,
    room: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = paths.database_file();
    if !path.exists() {
        println!("No store at {}", path.display());
        return Ok(());
    }

    let reader = StoreReader::new(path.clone());
    let summaries = match room {
        Some(room) => vec![reader.room_summary(room).await?],
        None => reader.room_summaries().await?,
    };

    println!("Store: {}", path.display());
    if summaries.is_empty() {
        println!("  (no messages)");
    }
    for summary in &summaries {
        println!("  {}", format_summary(summary));
    }

    let newest = match room {
        Some(_) => summaries.first().and_then(|s| s.latest_global_id.as_deref()),
        None => None,
    };
    if let Some(global_id) = newest {
        if let Some(message) = reader.get_message(global_id).await? {
            println!("  {}", format_message(&message));
        }
    }
    Ok(())
}

fn format_message(message: &StoredMessage) -> String {
    let content: String = message.content.chars().take(60).collect();
    format!("[{}] {}", message.sender_name, content.replace('\n', " "))
}

fn format_summary(summary: &RoomSummary) -> String {
    let latest = summary
        .latest_time
        .and_then(|time| DateTime::<Utc>::from_timestamp(time as i64, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<20} {:>10} messages  latest {} ({})",
        summary.room,
        summary.messages,
        latest,
        summary.latest_global_id.as_deref().unwrap_or("-")
    )
}
