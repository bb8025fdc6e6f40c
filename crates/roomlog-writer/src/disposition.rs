//! What the writer does with each kind of store failure.
//!
//! | Class                 | Disposition                                  |
//! |-----------------------|----------------------------------------------|
//! | `ConstraintViolation` | `Ignore`: the row is already stored           |
//! | `Transient`           | `Retry` with backoff, then `Fatal`           |
//! | `Fatal`               | `Fatal`: reported to the producer or logged  |
//!
//! Decode errors never reach this table; they are returned to the caller as
//! [`IntentError`](crate::IntentError) before anything touches the store.

use roomlog_store::{ErrorClass, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ignore,
    Retry,
    Fatal,
}

pub fn disposition(err: &StoreError) -> Disposition {
    match err.class() {
        ErrorClass::ConstraintViolation => Disposition::Ignore,
        ErrorClass::Transient => Disposition::Retry,
        ErrorClass::Fatal => Disposition::Fatal,
    }
}
