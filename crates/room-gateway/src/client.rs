//! WebSocket room client.

use crate::protocol::{decode, Inbound};
use crate::{ChatGateway, GatewayError, GatewayEvent, GatewayResult, Outgoing};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::Duration;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

/// Servers ping every 30 seconds; three missed pings means the session is dead.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(90);

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Gateway speaking the JSON room protocol over a websocket.
pub struct WebSocketGateway {
    room: String,
    url: Url,
    /// Nick announced after connecting. `None` stays invisible.
    nick: Option<String>,
    receive_timeout: Duration,
    stream: Option<Stream>,
}

impl WebSocketGateway {
    pub fn new(room: impl Into<String>, url: Url) -> Self {
        Self {
            room: room.into(),
            url,
            nick: None,
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            stream: None,
        }
    }

    /// Announce `nick` on connect; `None` connects without appearing in the
    /// room's user list.
    pub fn with_nick(mut self, nick: Option<String>) -> Self {
        self.nick = nick;
        self
    }

    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn write(stream: &mut Stream, packet: &Outgoing) -> GatewayResult<()> {
        let json = serde_json::to_string(&packet.to_packet())?;
        stream.send(Message::Text(json.into())).await?;
        Ok(())
    }
}

fn map_connect_error(room: &str, err: tungstenite::Error) -> GatewayError {
    match err {
        tungstenite::Error::Http(response) if response.status().as_u16() == 404 => {
            GatewayError::RoomNotFound(room.to_string())
        }
        other => GatewayError::WebSocket(other),
    }
}

#[async_trait]
impl ChatGateway for WebSocketGateway {
    fn room(&self) -> &str {
        &self.room
    }

    async fn connect(&mut self) -> GatewayResult<()> {
        if self.stream.is_some() {
            self.disconnect().await?;
        }

        info!(room = %self.room, url = %self.url, "Connecting to room");
        let (mut stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| map_connect_error(&self.room, e))?;

        match &self.nick {
            Some(name) => {
                Self::write(&mut stream, &Outgoing::Nick { name: name.clone() }).await?;
                debug!(room = %self.room, nick = %name, "Nick set");
            }
            None => debug!(room = %self.room, "Stealth connect, no nick"),
        }

        self.stream = Some(stream);
        info!(room = %self.room, "Connected to room");
        Ok(())
    }

    async fn disconnect(&mut self) -> GatewayResult<()> {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.close(None).await {
                debug!(room = %self.room, error = %e, "Close handshake failed");
            }
            info!(room = %self.room, "Disconnected from room");
        }
        Ok(())
    }

    async fn send(&mut self, packet: Outgoing) -> GatewayResult<()> {
        let stream = self.stream.as_mut().ok_or(GatewayError::NotConnected)?;
        Self::write(stream, &packet).await
    }

    async fn receive(&mut self) -> GatewayResult<GatewayEvent> {
        let room = self.room.as_str();
        let receive_timeout = self.receive_timeout;
        let stream = self.stream.as_mut().ok_or(GatewayError::NotConnected)?;

        loop {
            let next = tokio::time::timeout(receive_timeout, stream.next())
                .await
                .map_err(|_| GatewayError::Timeout)?;

            let message = match next {
                Some(Ok(message)) => message,
                Some(Err(e)) => return Err(e.into()),
                None => return Err(GatewayError::Disconnected),
            };

            match message {
                Message::Text(text) => match decode(&text) {
                    Ok(Inbound::Event(event)) => return Ok(event),
                    Ok(Inbound::Ping { time }) => {
                        Self::write(stream, &Outgoing::PingReply { time }).await?;
                        debug!(room = %room, time, "Answered ping");
                    }
                    Ok(Inbound::Rejected { kind, error }) if kind == "log-reply" => {
                        return Err(GatewayError::Protocol(format!("{kind}: {error}")));
                    }
                    Ok(Inbound::Rejected { kind, error }) => {
                        warn!(room = %room, kind = %kind, error = %error, "Request rejected");
                    }
                    Err(e @ GatewayError::Protocol(_)) => {
                        warn!(room = %room, error = %e, "Dropping session on unreadable packet");
                        return Err(e);
                    }
                    Err(e) => {
                        warn!(room = %room, error = %e, "Failed to parse packet");
                    }
                },
                Message::Ping(data) => {
                    stream.send(Message::Pong(data)).await?;
                }
                Message::Close(frame) => {
                    info!(room = %room, frame = ?frame, "Room closed the connection");
                    return Err(GatewayError::Disconnected);
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> WebSocketGateway {
        WebSocketGateway::new("xkcd", Url::parse("wss://example.invalid/room/xkcd/ws").unwrap())
    }

    #[tokio::test]
    async fn test_requires_connection() {
        let mut gw = gateway();
        assert!(!gw.is_connected());
        assert!(matches!(
            gw.send(Outgoing::Log { n: 1, before: None }).await,
            Err(GatewayError::NotConnected)
        ));
        assert!(matches!(gw.receive().await, Err(GatewayError::NotConnected)));
        assert!(gw.disconnect().await.is_ok());
    }

    #[test]
    fn test_builder() {
        let gw = gateway()
            .with_nick(Some("RoomLog".into()))
            .with_receive_timeout(Duration::from_secs(5));
        assert_eq!(gw.room(), "xkcd");
        assert_eq!(gw.nick.as_deref(), Some("RoomLog"));
        assert_eq!(gw.receive_timeout, Duration::from_secs(5));
        assert_eq!(gw.url().host_str(), Some("example.invalid"));
    }

    /// Serve `frames` to the first client, then wait for it to hang up.
    async fn serve(frames: Vec<&'static str>) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            for frame in frames {
                ws.send(Message::Text(frame.into())).await.unwrap();
            }
            while let Some(Ok(_)) = ws.next().await {}
        });
        Url::parse(&format!("ws://{addr}/room/xkcd/ws")).unwrap()
    }

    #[tokio::test]
    async fn test_unreadable_message_ends_session() {
        let url = serve(vec![
            "garbage",
            r#"{"type":"snapshot-event","data":{}}"#,
            r#"{"type":"send-event","data":{"content":"no id"}}"#,
        ])
        .await;
        let mut gw = WebSocketGateway::new("xkcd", url);
        gw.connect().await.unwrap();

        // Non-packet frames are skipped; a message that cannot be read is not.
        assert_eq!(
            gw.receive().await.unwrap(),
            GatewayEvent::Other("snapshot-event".into())
        );
        assert!(matches!(gw.receive().await, Err(GatewayError::Protocol(_))));
        gw.disconnect().await.unwrap();
    }

    #[test]
    fn test_404_maps_to_room_not_found() {
        let response = tungstenite::http::Response::builder()
            .status(404)
            .body(None)
            .unwrap();
        let err = map_connect_error("nope", tungstenite::Error::Http(response));
        assert!(matches!(err, GatewayError::RoomNotFound(ref r) if r == "nope"));

        let err = map_connect_error("xkcd", tungstenite::Error::ConnectionClosed);
        assert!(matches!(err, GatewayError::WebSocket(_)));
    }
}
