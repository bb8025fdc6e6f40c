//! Store migrations.
//!
//! Migrations run in order and are tracked in the `migrations` table.
//! The `messages` and `aliases` layouts are shared with existing read-side
//! tooling, so their columns and index names must not change.

use crate::StoreResult;
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM migrations",
        [],
        |row| row.get(0),
    )?;

    info!(current_version, target_version = CURRENT_VERSION, "Running migrations");

    if current_version < 1 {
        migrate_v1_initial_schema(conn)?;
    }

    Ok(())
}

fn record_migration(conn: &Connection, version: i32, name: &str) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
        rusqlite::params![version, name],
    )?;
    debug!(version, name, "Migration applied");
    Ok(())
}

/// V1: messages and aliases.
///
/// `IF NOT EXISTS` lets this adopt a store created before migrations were
/// tracked.
fn migrate_v1_initial_schema(conn: &Connection) -> StoreResult<()> {
    info!("Applying migration v1: initial schema");

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS messages(
            content TEXT,
            id TEXT,
            parent TEXT,
            senderid TEXT,
            sendername TEXT,
            normname TEXT,
            time REAL,
            room TEXT,
            globalid TEXT
        );
        CREATE UNIQUE INDEX IF NOT EXISTS globalid ON messages(globalid);

        CREATE TABLE IF NOT EXISTS aliases(
            master TEXT,
            alias TEXT,
            normalias TEXT
        );
        CREATE UNIQUE INDEX IF NOT EXISTS normalias ON aliases(normalias);
        ",
    )?;

    record_migration(conn, 1, "initial_schema")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_names(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .unwrap();
        stmt.query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_schema_layout() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(
            column_names(&conn, "messages"),
            vec![
                "content",
                "id",
                "parent",
                "senderid",
                "sendername",
                "normname",
                "time",
                "room",
                "globalid"
            ]
        );
        assert_eq!(
            column_names(&conn, "aliases"),
            vec!["master", "alias", "normalias"]
        );

        let unique_indexes: Vec<String> = conn
            .prepare(
                "SELECT name FROM sqlite_master WHERE type = 'index' AND sql LIKE 'CREATE UNIQUE%' ORDER BY name",
            )
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(unique_indexes, vec!["globalid", "normalias"]);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let recorded: i64 = conn
            .query_row("SELECT COUNT(*) FROM migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(recorded, 1);
    }

    #[test]
    fn test_adopts_untracked_store() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE messages(content TEXT, id TEXT, parent TEXT, senderid TEXT,
                 sendername TEXT, normname TEXT, time REAL, room TEXT, globalid TEXT);
             CREATE UNIQUE INDEX globalid ON messages(globalid);
             INSERT INTO messages (id, room, globalid) VALUES ('m1', 'r', 'rm1');",
        )
        .unwrap();

        run_migrations(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
