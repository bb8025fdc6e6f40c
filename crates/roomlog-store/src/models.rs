//! Store model types.

use crate::SqlValue;
use serde::{Deserialize, Serialize};

/// Fleet-wide deduplication key: room name followed directly by the in-room id.
///
/// In-room ids repeat across rooms, so they are never unique on their own.
pub fn global_id(room: &str, id: &str) -> String {
    let mut gid = String::with_capacity(room.len() + id.len());
    gid.push_str(room);
    gid.push_str(id);
    gid
}

/// Stable grouping key for a display name.
///
/// Code points outside the Basic Multilingual Plane become U+FFFD, whitespace
/// is removed, and the rest is lowercased.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| if u32::from(c) > 0xFFFF { '\u{FFFD}' } else { c })
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// A message row. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub content: String,
    pub id: String,
    /// Empty string for top-level messages.
    pub parent: String,
    pub sender_id: String,
    pub sender_name: String,
    pub norm_name: String,
    /// Seconds since the Unix epoch.
    pub time: f64,
    pub room: String,
    pub global_id: String,
}

impl StoredMessage {
    /// Build a row, deriving the normalized name and global id.
    pub fn new(
        room: &str,
        id: &str,
        parent: Option<&str>,
        sender_id: &str,
        sender_name: &str,
        content: &str,
        time: f64,
    ) -> Self {
        Self {
            content: content.to_string(),
            id: id.to_string(),
            parent: parent.unwrap_or_default().to_string(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            norm_name: normalize_name(sender_name),
            time,
            room: room.to_string(),
            global_id: global_id(room, id),
        }
    }

    /// Bound values in `messages` column order.
    pub fn to_row(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::from(self.content.as_str()),
            SqlValue::from(self.id.as_str()),
            SqlValue::from(self.parent.as_str()),
            SqlValue::from(self.sender_id.as_str()),
            SqlValue::from(self.sender_name.as_str()),
            SqlValue::from(self.norm_name.as_str()),
            SqlValue::Real(self.time),
            SqlValue::from(self.room.as_str()),
            SqlValue::from(self.global_id.as_str()),
        ]
    }

    /// Map a `SELECT *` row from `messages`.
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            content: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
            id: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            parent: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            sender_id: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            sender_name: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            norm_name: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            time: row.get::<_, Option<f64>>(6)?.unwrap_or_default(),
            room: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
            global_id: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        })
    }
}

/// Per-room totals for status output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub room: String,
    pub messages: i64,
    pub latest_global_id: Option<String>,
    pub latest_time: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_id_concatenates_without_separator() {
        assert_eq!(global_id("xkcd", "abc"), "xkcdabc");
        assert_eq!(global_id("r", "m1"), "rm1");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Pouncy Silverkitten"), "pouncysilverkitten");
        assert_eq!(normalize_name("  Tab\tAnd\nNewline "), "tabandnewline");
        assert_eq!(normalize_name("ÉLAN"), "élan");
    }

    #[test]
    fn test_normalize_name_replaces_non_bmp() {
        assert_eq!(normalize_name("Cat 🐱"), "cat\u{FFFD}");
        // BMP symbols survive untouched.
        assert_eq!(normalize_name("☃ Snow"), "☃snow");
    }

    #[test]
    fn test_new_message_defaults_parent() {
        let msg = StoredMessage::new("xkcd", "abc", None, "agent:1", "Some One", "hi", 1.5);
        assert_eq!(msg.parent, "");
        assert_eq!(msg.global_id, "xkcdabc");
        assert_eq!(msg.norm_name, "someone");

        let reply = StoredMessage::new("xkcd", "abd", Some("abc"), "agent:1", "Some One", "yo", 2.0);
        assert_eq!(reply.parent, "abc");
    }

    #[test]
    fn test_row_order_matches_columns() {
        let msg = StoredMessage::new("r", "m1", None, "s", "Name", "hi", 10.0);
        let row = msg.to_row();
        assert_eq!(row.len(), 9);
        assert_eq!(row[0], SqlValue::Text("hi".into()));
        assert_eq!(row[6], SqlValue::Real(10.0));
        assert_eq!(row[8], SqlValue::Text("rm1".into()));
    }
}
