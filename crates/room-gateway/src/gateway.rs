//! The gateway seam.

use crate::{GatewayEvent, GatewayResult, Outgoing};
use async_trait::async_trait;

/// One session with one chat room.
///
/// A worker owns its gateway exclusively, so every method takes `&mut self`.
#[async_trait]
pub trait ChatGateway: Send {
    /// Room this gateway talks to.
    fn room(&self) -> &str;

    /// Open a session. Calling it on an open session starts a fresh one.
    async fn connect(&mut self) -> GatewayResult<()>;

    /// Close the session. Harmless when already closed.
    async fn disconnect(&mut self) -> GatewayResult<()>;

    async fn send(&mut self, packet: Outgoing) -> GatewayResult<()>;

    /// Wait for the next room event.
    async fn receive(&mut self) -> GatewayResult<GatewayEvent>;
}
