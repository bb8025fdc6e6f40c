//! In-memory room for tests.
//!
//! Serves a fixed history through real "N before X" pagination and records
//! every packet sent, so tests can check exactly which pages were requested.

use crate::{ChatGateway, GatewayError, GatewayEvent, GatewayResult, Outgoing, RemoteMessage};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Default)]
struct Script {
    /// Remote history, oldest first.
    history: Vec<RemoteMessage>,
    /// Pending inbound events, delivered in order.
    inbox: VecDeque<GatewayEvent>,
    /// Every packet sent, across all sessions.
    sent: Vec<Outgoing>,
    connects: usize,
    /// Fail this many upcoming connect attempts.
    failing_connects: usize,
}

/// Shared view of a [`ScriptedGateway`] that stays usable after the gateway
/// has been moved into a worker.
#[derive(Clone, Default)]
pub struct ScriptHandle {
    script: Arc<Mutex<Script>>,
}

impl ScriptHandle {
    /// Queue a live message, delivered after anything already pending.
    pub fn push_live(&self, message: RemoteMessage) {
        self.script
            .lock()
            .inbox
            .push_back(GatewayEvent::SendEvent(message));
    }

    /// Append to the remote history, as if posted while nobody was listening.
    pub fn extend_history(&self, messages: impl IntoIterator<Item = RemoteMessage>) {
        self.script.lock().history.extend(messages);
    }

    pub fn push_event(&self, event: GatewayEvent) {
        self.script.lock().inbox.push_back(event);
    }

    /// Every packet sent so far.
    pub fn sent(&self) -> Vec<Outgoing> {
        self.script.lock().sent.clone()
    }

    /// `(n, before)` of every history request, in order.
    pub fn log_requests(&self) -> Vec<(usize, Option<String>)> {
        self.script
            .lock()
            .sent
            .iter()
            .filter_map(|packet| match packet {
                Outgoing::Log { n, before } => Some((*n, before.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn connects(&self) -> usize {
        self.script.lock().connects
    }

    /// Make the next `count` connect attempts fail with `Disconnected`.
    pub fn fail_next_connects(&self, count: usize) {
        self.script.lock().failing_connects = count;
    }
}

/// Test gateway backed by a scripted history (oldest first).
///
/// When nothing is pending, `receive` reports [`GatewayError::Disconnected`],
/// so a worker's live phase ends once the script runs dry.
pub struct ScriptedGateway {
    room: String,
    connected: bool,
    handle: ScriptHandle,
}

impl ScriptedGateway {
    pub fn new(room: impl Into<String>, history: Vec<RemoteMessage>) -> Self {
        let handle = ScriptHandle::default();
        handle.extend_history(history);
        Self {
            room: room.into(),
            connected: false,
            handle,
        }
    }

    /// A room whose history is `count` messages with ids `{prefix}1..={prefix}{count}`.
    pub fn with_numbered_history(room: impl Into<String>, prefix: &str, count: usize) -> Self {
        let history = (1..=count)
            .map(|n| {
                RemoteMessage::new(
                    &format!("{prefix}{n}"),
                    1_500_000_000.0 + n as f64,
                    "Tester",
                    &format!("message {n}"),
                )
            })
            .collect();
        Self::new(room, history)
    }

    pub fn handle(&self) -> ScriptHandle {
        self.handle.clone()
    }
}

impl Script {
    /// Up to `n` messages strictly older than `before` (newest when unset).
    fn page(&self, n: usize, before: Option<&str>) -> Vec<RemoteMessage> {
        let end = match before {
            None => self.history.len(),
            Some(id) => self.history.iter().position(|m| m.id == id).unwrap_or(0),
        };
        let start = end.saturating_sub(n);
        self.history[start..end].to_vec()
    }
}

#[async_trait]
impl ChatGateway for ScriptedGateway {
    fn room(&self) -> &str {
        &self.room
    }

    async fn connect(&mut self) -> GatewayResult<()> {
        let mut script = self.handle.script.lock();
        script.connects += 1;
        if script.failing_connects > 0 {
            script.failing_connects -= 1;
            return Err(GatewayError::Disconnected);
        }
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> GatewayResult<()> {
        self.connected = false;
        Ok(())
    }

    async fn send(&mut self, packet: Outgoing) -> GatewayResult<()> {
        if !self.connected {
            return Err(GatewayError::NotConnected);
        }

        let mut script = self.handle.script.lock();
        if let Outgoing::Log { n, before } = &packet {
            let reply = GatewayEvent::LogReply {
                log: script.page(*n, before.as_deref()),
                before: before.clone(),
            };
            script.inbox.push_back(reply);
        }
        script.sent.push(packet);
        Ok(())
    }

    async fn receive(&mut self) -> GatewayResult<GatewayEvent> {
        if !self.connected {
            return Err(GatewayError::NotConnected);
        }
        self.handle
            .script
            .lock()
            .inbox
            .pop_front()
            .ok_or(GatewayError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn request(gw: &mut ScriptedGateway, n: usize, before: Option<&str>) -> Vec<String> {
        gw.send(Outgoing::Log {
            n,
            before: before.map(str::to_string),
        })
        .await
        .unwrap();
        match gw.receive().await.unwrap() {
            GatewayEvent::LogReply { log, .. } => log.into_iter().map(|m| m.id).collect(),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pages_backwards() {
        let mut gw = ScriptedGateway::with_numbered_history("r", "m", 5);
        gw.connect().await.unwrap();

        assert_eq!(request(&mut gw, 2, None).await, vec!["m4", "m5"]);
        assert_eq!(request(&mut gw, 2, Some("m4")).await, vec!["m2", "m3"]);
        assert_eq!(request(&mut gw, 2, Some("m2")).await, vec!["m1"]);
        assert!(request(&mut gw, 2, Some("m1")).await.is_empty());

        let handle = gw.handle();
        assert_eq!(handle.log_requests().len(), 4);
        assert_eq!(handle.log_requests()[1], (2, Some("m4".to_string())));
    }

    #[tokio::test]
    async fn test_history_grows_between_sessions() {
        let mut gw = ScriptedGateway::with_numbered_history("r", "m", 2);
        let handle = gw.handle();
        gw.connect().await.unwrap();
        assert_eq!(request(&mut gw, 10, None).await, vec!["m1", "m2"]);

        handle.extend_history([RemoteMessage::new("m3", 3.0, "Tester", "late")]);
        assert_eq!(request(&mut gw, 2, None).await, vec!["m2", "m3"]);
    }

    #[tokio::test]
    async fn test_live_events_then_disconnect() {
        let mut gw = ScriptedGateway::new("r", Vec::new());
        let handle = gw.handle();
        handle.push_live(RemoteMessage::new("x1", 1.0, "A", "hi"));
        gw.connect().await.unwrap();

        assert!(matches!(
            gw.receive().await.unwrap(),
            GatewayEvent::SendEvent(ref m) if m.id == "x1"
        ));
        assert!(matches!(gw.receive().await, Err(GatewayError::Disconnected)));
    }

    #[tokio::test]
    async fn test_failing_connects() {
        let mut gw = ScriptedGateway::new("r", Vec::new());
        let handle = gw.handle();
        handle.fail_next_connects(1);

        assert!(gw.connect().await.is_err());
        assert!(gw.connect().await.is_ok());
        assert_eq!(handle.connects(), 2);
    }

    #[tokio::test]
    async fn test_requires_connection() {
        let mut gw = ScriptedGateway::new("r", Vec::new());
        assert!(matches!(
            gw.send(Outgoing::Nick { name: "n".into() }).await,
            Err(GatewayError::NotConnected)
        ));
    }
}
