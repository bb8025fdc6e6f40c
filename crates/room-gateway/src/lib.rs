//! Chat room gateway.
//!
//! A [`ChatGateway`] is one session with one room: connect, ask for history
//! pages ("N messages before X"), and receive live traffic. Keep-alive pings
//! are answered inside `receive`, so callers only ever see room events.
//!
//! - [`WebSocketGateway`]: the real JSON-over-websocket protocol.
//! - [`ScriptedGateway`]: an in-memory room for tests, with real pagination
//!   and a record of every request.

mod client;
mod error;
mod gateway;
mod protocol;
mod scripted;

pub use client::{WebSocketGateway, DEFAULT_RECEIVE_TIMEOUT};
pub use error::{GatewayError, GatewayResult};
pub use gateway::ChatGateway;
pub use protocol::{GatewayEvent, Outgoing, RemoteMessage, RemoteSender};
pub use scripted::{ScriptHandle, ScriptedGateway};
