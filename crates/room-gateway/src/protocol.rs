//! Room protocol packets.
//!
//! Every frame is a JSON object `{"type": ..., "data": ...}`, optionally with
//! an `error` string when the server rejects a request.

use crate::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Author of a remote message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RemoteSender {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A message as the room server reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteMessage {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sender: RemoteSender,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub time: f64,
}

impl RemoteMessage {
    pub fn new(id: &str, time: f64, sender_name: &str, content: &str) -> Self {
        Self {
            id: id.to_string(),
            parent: None,
            content: content.to_string(),
            sender: RemoteSender {
                id: format!("agent:{}", sender_name.to_lowercase()),
                name: sender_name.to_string(),
            },
            time,
        }
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }
}

/// Inbound traffic a worker cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// A history page, ordered oldest to newest.
    LogReply {
        log: Vec<RemoteMessage>,
        before: Option<String>,
    },
    /// Someone else posted.
    SendEvent(RemoteMessage),
    /// Our own post, echoed back.
    SendReply(RemoteMessage),
    /// Anything else, by packet type.
    Other(String),
}

/// Packets a worker sends.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    /// Request up to `n` messages before `before` (most recent when unset).
    Log { n: usize, before: Option<String> },
    Nick { name: String },
    PingReply { time: i64 },
}

impl Outgoing {
    pub fn kind(&self) -> &'static str {
        match self {
            Outgoing::Log { .. } => "log",
            Outgoing::Nick { .. } => "nick",
            Outgoing::PingReply { .. } => "ping-reply",
        }
    }

    pub fn to_packet(&self) -> Value {
        let data = match self {
            Outgoing::Log { n, before: Some(before) } => json!({ "n": n, "before": before }),
            Outgoing::Log { n, before: None } => json!({ "n": n }),
            Outgoing::Nick { name } => json!({ "name": name }),
            Outgoing::PingReply { time } => json!({ "time": time }),
        };
        json!({ "type": self.kind(), "data": data })
    }
}

#[derive(Deserialize)]
struct Packet {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct LogData {
    #[serde(default)]
    log: Vec<RemoteMessage>,
    #[serde(default)]
    before: Option<String>,
}

#[derive(Deserialize)]
struct PingData {
    time: i64,
}

/// Decoded inbound frame, before keep-alive handling.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Inbound {
    Ping { time: i64 },
    Event(GatewayEvent),
    /// The server rejected a request.
    Rejected { kind: String, error: String },
}

/// Decode one text frame.
///
/// A frame that is not a packet at all fails with `Json`. A known packet whose
/// payload cannot be read fails with `Protocol`: for messages and history
/// that means data was lost and the session has to be rebuilt.
pub(crate) fn decode(text: &str) -> GatewayResult<Inbound> {
    let packet: Packet = serde_json::from_str(text)?;

    if let Some(error) = packet.error {
        return Ok(Inbound::Rejected {
            kind: packet.kind,
            error,
        });
    }

    let kind = packet.kind.as_str();
    let inbound = match kind {
        "ping-event" => {
            let ping: PingData = payload(kind, packet.data)?;
            Inbound::Ping { time: ping.time }
        }
        "log-reply" => {
            let data: LogData = payload(kind, packet.data)?;
            Inbound::Event(GatewayEvent::LogReply {
                log: data.log,
                before: data.before,
            })
        }
        "send-event" => Inbound::Event(GatewayEvent::SendEvent(payload(kind, packet.data)?)),
        "send-reply" => Inbound::Event(GatewayEvent::SendReply(payload(kind, packet.data)?)),
        _ => Inbound::Event(GatewayEvent::Other(packet.kind)),
    };
    Ok(inbound)
}

fn payload<T: serde::de::DeserializeOwned>(kind: &str, data: Value) -> GatewayResult<T> {
    serde_json::from_value(data)
        .map_err(|e| GatewayError::Protocol(format!("malformed {kind}: {e}")))
}
