//! Statement templates accepted by the writer.

/// Insert one message. Fails on a duplicate global id.
pub const INSERT_MESSAGE: &str = "INSERT OR FAIL INTO messages VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";
