//! Write intents.

use roomlog_store::{BoundValues, ExecutionMode, SqlValue, StoredMessage, INSERT_MESSAGE};

/// One store mutation: a statement template plus its bound values.
///
/// The execution mode follows from the values, so an intent built in memory
/// always has a consistent mode.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteIntent {
    statement: String,
    values: BoundValues,
}

impl WriteIntent {
    pub fn new(statement: impl Into<String>, values: BoundValues) -> Self {
        Self {
            statement: statement.into(),
            values,
        }
    }

    /// Run `statement` once with `row`.
    pub fn single(statement: impl Into<String>, row: Vec<SqlValue>) -> Self {
        Self::new(statement, BoundValues::Single(row))
    }

    /// Run `statement` once per row, all-or-nothing.
    pub fn batch(statement: impl Into<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self::new(statement, BoundValues::Batch(rows))
    }

    pub fn insert_message(message: &StoredMessage) -> Self {
        Self::single(INSERT_MESSAGE, message.to_row())
    }

    pub fn insert_messages(messages: &[StoredMessage]) -> Self {
        Self::batch(
            INSERT_MESSAGE,
            messages.iter().map(StoredMessage::to_row).collect(),
        )
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn values(&self) -> &BoundValues {
        &self.values
    }

    pub fn mode(&self) -> ExecutionMode {
        self.values.mode()
    }

    pub fn row_count(&self) -> usize {
        self.values.row_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str) -> StoredMessage {
        StoredMessage::new("r", id, None, "agent:1", "Tester", "hi", 1.0)
    }

    #[test]
    fn test_mode_follows_values() {
        let single = WriteIntent::insert_message(&message("m1"));
        assert_eq!(single.mode(), ExecutionMode::Single);
        assert_eq!(single.statement(), INSERT_MESSAGE);
        assert_eq!(single.row_count(), 1);

        let batch = WriteIntent::insert_messages(&[message("m1"), message("m2")]);
        assert_eq!(batch.mode(), ExecutionMode::Batch);
        assert_eq!(batch.row_count(), 2);
    }

    #[test]
    fn test_single_message_binds_one_row() {
        let intent = WriteIntent::insert_message(&message("m1"));
        let BoundValues::Single(row) = intent.values() else {
            panic!("expected a single row");
        };
        assert_eq!(row[1], SqlValue::from("m1"));
        assert_eq!(row[7], SqlValue::from("r"));
        assert_eq!(row.last(), Some(&SqlValue::from("rm1")));
    }
}
