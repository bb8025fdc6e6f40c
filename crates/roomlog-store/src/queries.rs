//! Standalone read queries that work with any Connection.

use crate::{RoomSummary, StoreResult, StoredMessage};
use rusqlite::{params, Connection, OptionalExtension};

/// Global id of the room's most recently stored message.
///
/// Ties on `time` fall back to insertion order. `None` for a room with no
/// stored messages.
pub fn latest_global_id(conn: &Connection, room: &str) -> StoreResult<Option<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT globalid FROM messages WHERE room = ?1 ORDER BY time DESC, rowid DESC LIMIT 1",
    )?;
    Ok(stmt.query_row(params![room], |row| row.get(0)).optional()?)
}

/// Number of stored messages in a room.
pub fn count_room(conn: &Connection, room: &str) -> StoreResult<i64> {
    let mut stmt = conn.prepare_cached("SELECT COUNT(*) FROM messages WHERE room = ?1")?;
    Ok(stmt.query_row(params![room], |row| row.get(0))?)
}

/// Number of rows carrying a global id. Always 0 or 1.
pub fn count_global_id(conn: &Connection, global_id: &str) -> StoreResult<i64> {
    let mut stmt = conn.prepare_cached("SELECT COUNT(*) FROM messages WHERE globalid = ?1")?;
    Ok(stmt.query_row(params![global_id], |row| row.get(0))?)
}

/// Fetch one message by global id.
pub fn get_message(conn: &Connection, global_id: &str) -> StoreResult<Option<StoredMessage>> {
    let mut stmt = conn.prepare_cached(
        "SELECT content, id, parent, senderid, sendername, normname, time, room, globalid
         FROM messages WHERE globalid = ?1",
    )?;
    Ok(stmt
        .query_row(params![global_id], StoredMessage::from_row)
        .optional()?)
}

/// Totals for one room.
pub fn room_summary(conn: &Connection, room: &str) -> StoreResult<RoomSummary> {
    let latest = latest_global_id(conn, room)?;
    let latest_time = match &latest {
        Some(gid) => {
            let mut stmt = conn.prepare_cached("SELECT time FROM messages WHERE globalid = ?1")?;
            stmt.query_row(params![gid], |row| row.get::<_, Option<f64>>(0))
                .optional()?
                .flatten()
        }
        None => None,
    };

    Ok(RoomSummary {
        room: room.to_string(),
        messages: count_room(conn, room)?,
        latest_global_id: latest,
        latest_time,
    })
}

/// Totals for every room that has at least one message, ordered by room name.
pub fn room_summaries(conn: &Connection) -> StoreResult<Vec<RoomSummary>> {
    let mut stmt =
        conn.prepare_cached("SELECT DISTINCT room FROM messages WHERE room IS NOT NULL ORDER BY room")?;
    let rooms = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    rooms
        .iter()
        .map(|room| room_summary(conn, room))
        .collect()
}
