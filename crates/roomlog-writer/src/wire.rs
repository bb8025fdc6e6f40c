//! Wire shape of a write intent: `[statement, values, mode]`.
//!
//! `mode` is `"execute"` with one array of scalars, or `"executemany"` with
//! an array of such arrays. Decoding never guesses: an unknown mode or a
//! values shape that does not fit the mode is an error.

use crate::{IntentError, IntentResult, WriteIntent};
use roomlog_store::{BoundValues, ExecutionMode, SqlValue};
use serde_json::{json, Value};

const EXECUTE: &str = "execute";
const EXECUTE_MANY: &str = "executemany";

pub fn mode_to_wire(mode: ExecutionMode) -> &'static str {
    match mode {
        ExecutionMode::Single => EXECUTE,
        ExecutionMode::Batch => EXECUTE_MANY,
    }
}

pub fn mode_from_wire(name: &str) -> IntentResult<ExecutionMode> {
    match name {
        EXECUTE => Ok(ExecutionMode::Single),
        EXECUTE_MANY => Ok(ExecutionMode::Batch),
        other => Err(IntentError::UnknownMode(other.to_string())),
    }
}

impl WriteIntent {
    pub fn to_wire(&self) -> Value {
        let values = match self.values() {
            BoundValues::Single(row) => encode_row(row),
            BoundValues::Batch(rows) => Value::Array(rows.iter().map(|r| encode_row(r)).collect()),
        };
        json!([self.statement(), values, mode_to_wire(self.mode())])
    }

    pub fn from_wire(value: &Value) -> IntentResult<Self> {
        let parts = value
            .as_array()
            .filter(|parts| parts.len() == 3)
            .ok_or_else(|| IntentError::Malformed("expected [statement, values, mode]".into()))?;

        let statement = parts[0]
            .as_str()
            .ok_or_else(|| IntentError::Malformed("statement must be a string".into()))?;
        let mode_name = parts[2]
            .as_str()
            .ok_or_else(|| IntentError::Malformed("mode must be a string".into()))?;
        let mode = mode_from_wire(mode_name)?;

        let values = match mode {
            ExecutionMode::Single => BoundValues::Single(decode_row(&parts[1], mode)?),
            ExecutionMode::Batch => {
                let rows = parts[1].as_array().ok_or_else(|| shape(mode, "values must be an array of rows"))?;
                BoundValues::Batch(
                    rows.iter()
                        .map(|row| decode_row(row, mode))
                        .collect::<IntentResult<Vec<_>>>()?,
                )
            }
        };

        Ok(WriteIntent::new(statement, values))
    }

    pub fn to_wire_string(&self) -> String {
        self.to_wire().to_string()
    }

    pub fn from_wire_str(text: &str) -> IntentResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_wire(&value)
    }
}

fn shape(mode: ExecutionMode, detail: &str) -> IntentError {
    IntentError::ShapeMismatch {
        mode: mode_to_wire(mode),
        detail: detail.to_string(),
    }
}

fn encode_row(row: &[SqlValue]) -> Value {
    Value::Array(
        row.iter()
            .map(|value| match value {
                SqlValue::Null => Value::Null,
                SqlValue::Integer(v) => json!(v),
                SqlValue::Real(v) => json!(v),
                SqlValue::Text(v) => json!(v),
            })
            .collect(),
    )
}

fn decode_row(value: &Value, mode: ExecutionMode) -> IntentResult<Vec<SqlValue>> {
    let items = value
        .as_array()
        .ok_or_else(|| shape(mode, "a row must be an array of scalars"))?;
    items
        .iter()
        .map(|item| match item {
            Value::Null => Ok(SqlValue::Null),
            Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
            Value::Number(n) => n
                .as_i64()
                .map(SqlValue::Integer)
                .or_else(|| n.as_f64().map(SqlValue::Real))
                .ok_or_else(|| shape(mode, "number out of range")),
            Value::String(s) => Ok(SqlValue::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => Err(shape(mode, "a row must be an array of scalars")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomlog_store::{StoredMessage, INSERT_MESSAGE};

    #[test]
    fn test_single_wire_shape() {
        let intent = WriteIntent::single("INSERT INTO t VALUES(?1, ?2)", vec![
            SqlValue::from("a"),
            SqlValue::Integer(3),
        ]);
        assert_eq!(
            intent.to_wire(),
            json!(["INSERT INTO t VALUES(?1, ?2)", ["a", 3], "execute"])
        );
    }

    #[test]
    fn test_batch_wire_shape() {
        let msg = StoredMessage::new("r", "m1", None, "s", "N", "hi", 2.5);
        let intent = WriteIntent::insert_messages(&[msg]);
        let wire = intent.to_wire();

        assert_eq!(wire[0], json!(INSERT_MESSAGE));
        assert_eq!(wire[1][0][6], json!(2.5));
        assert_eq!(wire[2], json!("executemany"));
        assert_eq!(WriteIntent::from_wire(&wire).unwrap(), intent);
    }

    #[test]
    fn test_unknown_mode_fails() {
        let err = WriteIntent::from_wire(&json!(["DELETE FROM t", [], "executescript"])).unwrap_err();
        assert!(matches!(err, IntentError::UnknownMode(ref m) if m == "executescript"));
    }

    #[test]
    fn test_shape_mismatch_fails() {
        let err = WriteIntent::from_wire(&json!(["X", ["a", "b"], "executemany"])).unwrap_err();
        assert!(matches!(err, IntentError::ShapeMismatch { mode: "executemany", .. }));

        let err = WriteIntent::from_wire(&json!(["X", [["a"]], "execute"])).unwrap_err();
        assert!(matches!(err, IntentError::ShapeMismatch { mode: "execute", .. }));

        let err = WriteIntent::from_wire(&json!(["X", "a", "execute"])).unwrap_err();
        assert!(matches!(err, IntentError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_malformed_envelope_fails() {
        assert!(matches!(
            WriteIntent::from_wire(&json!({"statement": "X"})),
            Err(IntentError::Malformed(_))
        ));
        assert!(matches!(
            WriteIntent::from_wire(&json!(["X", []])),
            Err(IntentError::Malformed(_))
        ));
        assert!(matches!(
            WriteIntent::from_wire_str("not json"),
            Err(IntentError::Json(_))
        ));
    }

    #[test]
    fn test_decodes_scalars() {
        let intent =
            WriteIntent::from_wire_str(r#"["X", [null, 1, 1.5, "s", true], "execute"]"#).unwrap();
        assert_eq!(
            intent.values(),
            &BoundValues::Single(vec![
                SqlValue::Null,
                SqlValue::Integer(1),
                SqlValue::Real(1.5),
                SqlValue::Text("s".into()),
                SqlValue::Integer(1),
            ])
        );
    }
}
