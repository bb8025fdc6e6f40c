//! Typed bound values and the statement runner.
//!
//! Every mutation in the system goes through [`apply`], whether it came off
//! the writer queue or from a standalone worker.

use crate::StoreResult;
use rusqlite::types::{ToSql, ToSqlOutput, Value};
use rusqlite::{params_from_iter, Connection};

/// One scalar bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SqlValue::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
            SqlValue::Text(v) => ToSqlOutput::Borrowed(v.as_str().into()),
        })
    }
}

/// How a statement is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Run once with one row of values.
    Single,
    /// Run once per row, all rows in one transaction.
    Batch,
}

/// Values bound to a statement. The variant fixes the execution mode.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValues {
    Single(Vec<SqlValue>),
    Batch(Vec<Vec<SqlValue>>),
}

impl BoundValues {
    pub fn mode(&self) -> ExecutionMode {
        match self {
            BoundValues::Single(_) => ExecutionMode::Single,
            BoundValues::Batch(_) => ExecutionMode::Batch,
        }
    }

    /// Number of rows the statement runs for.
    pub fn row_count(&self) -> usize {
        match self {
            BoundValues::Single(_) => 1,
            BoundValues::Batch(rows) => rows.len(),
        }
    }
}

/// Run `statement` with `values` and return the number of changed rows.
///
/// A batch runs inside one transaction: if any row fails, no row of the
/// batch is kept.
pub fn apply(conn: &mut Connection, statement: &str, values: &BoundValues) -> StoreResult<usize> {
    match values {
        BoundValues::Single(row) => {
            let mut stmt = conn.prepare_cached(statement)?;
            Ok(stmt.execute(params_from_iter(row.iter()))?)
        }
        BoundValues::Batch(rows) => {
            let tx = conn.transaction()?;
            let mut changed = 0;
            {
                let mut stmt = tx.prepare_cached(statement)?;
                for row in rows {
                    changed += stmt.execute(params_from_iter(row.iter()))?;
                }
            }
            tx.commit()?;
            Ok(changed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{run_migrations, ErrorClass, StoredMessage, INSERT_MESSAGE};

    fn store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .unwrap()
    }

    fn message(id: &str) -> StoredMessage {
        StoredMessage::new("r", id, None, "agent:1", "Tester", "hi", 1.0)
    }

    #[test]
    fn test_duplicate_single_is_constraint_violation() {
        let mut conn = store();
        let values = BoundValues::Single(message("m1").to_row());

        assert_eq!(apply(&mut conn, INSERT_MESSAGE, &values).unwrap(), 1);
        let err = apply(&mut conn, INSERT_MESSAGE, &values).unwrap_err();

        assert_eq!(err.class(), ErrorClass::ConstraintViolation);
        let rm1: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM messages WHERE globalid = 'rm1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(rm1, 1);
    }

    #[test]
    fn test_batch_commits_all_rows() {
        let mut conn = store();
        let values = BoundValues::Batch(vec![
            message("m1").to_row(),
            message("m2").to_row(),
            message("m3").to_row(),
        ]);

        assert_eq!(apply(&mut conn, INSERT_MESSAGE, &values).unwrap(), 3);
        assert_eq!(count(&conn), 3);
    }

    #[test]
    fn test_batch_with_duplicate_is_rolled_back() {
        let mut conn = store();
        apply(
            &mut conn,
            INSERT_MESSAGE,
            &BoundValues::Single(message("m2").to_row()),
        )
        .unwrap();

        let values = BoundValues::Batch(vec![
            message("m1").to_row(),
            message("m2").to_row(),
            message("m3").to_row(),
        ]);
        let err = apply(&mut conn, INSERT_MESSAGE, &values).unwrap_err();

        assert_eq!(err.class(), ErrorClass::ConstraintViolation);
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn test_null_and_integer_values_bind() {
        let mut conn = store();
        let row = vec![
            SqlValue::Null,
            SqlValue::from("m1"),
            SqlValue::from(None::<String>),
            SqlValue::Integer(7),
            SqlValue::from("n"),
            SqlValue::from("n"),
            SqlValue::Real(2.5),
            SqlValue::from("r"),
            SqlValue::from("rm1"),
        ];
        apply(&mut conn, INSERT_MESSAGE, &BoundValues::Single(row)).unwrap();

        let (content, sender): (Option<String>, i64) = conn
            .query_row("SELECT content, senderid FROM messages", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(content, None);
        assert_eq!(sender, 7);
    }

    #[test]
    fn test_values_report_mode() {
        assert_eq!(BoundValues::Single(vec![]).mode(), ExecutionMode::Single);
        let batch = BoundValues::Batch(vec![vec![], vec![]]);
        assert_eq!(batch.mode(), ExecutionMode::Batch);
        assert_eq!(batch.row_count(), 2);
    }
}
