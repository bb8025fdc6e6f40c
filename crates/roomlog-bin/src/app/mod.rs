//! Application wiring.

mod fleet;
mod standalone;
mod status;

pub use fleet::run_fleet;
pub use standalone::run_watch;
pub use status::check_status;

use room_gateway::WebSocketGateway;
use room_worker::WorkerConfig;
use roomlog_config::{Config, CoreResult};

/// Gateway for `room` as configured. `stealth` skips the nick.
fn gateway_for(config: &Config, room: &str, stealth: bool) -> CoreResult<WebSocketGateway> {
    let nick = (!stealth && !config.stealth).then(|| config.nick.clone());
    Ok(WebSocketGateway::new(room, config.gateway_url_for(room)?)
        .with_nick(nick)
        .with_receive_timeout(config.receive_timeout()))
}

fn worker_config(config: &Config, backfill_only: bool) -> WorkerConfig {
    WorkerConfig {
        backfill_only,
        reconnect_delay: config.reconnect_delay(),
    }
}

/// Rooms in first-seen order, without repeats or blanks.
fn unique_rooms(rooms: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    rooms
        .into_iter()
        .map(|room| room.trim().to_string())
        .filter(|room| !room.is_empty() && seen.insert(room.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_rooms() {
        let rooms = vec!["xkcd".into(), " music".into(), "xkcd".into(), "".into()];
        assert_eq!(unique_rooms(rooms), vec!["xkcd", "music"]);
    }

    #[test]
    fn test_gateway_for_uses_template() {
        let config = Config::default();
        let gateway = gateway_for(&config, "xkcd", false).unwrap();
        assert_eq!(gateway.url().as_str(), "wss://euphoria.io/room/xkcd/ws?h=0");
        assert!(!gateway.is_connected());
    }
}
