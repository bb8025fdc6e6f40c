//! Configuration management for the fleet.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default gateway endpoint. `{room}` is replaced with the room name.
pub const DEFAULT_GATEWAY_URL: &str = "wss://euphoria.io/room/{room}/ws?h=0";

/// Default display name announced after joining a room.
pub const DEFAULT_NICK: &str = "RoomLog";

const ROOM_PLACEHOLDER: &str = "{room}";

/// What a producer does when the writer queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackpressurePolicy {
    /// Wait for free capacity.
    #[default]
    Block,
    /// Evict the oldest queued intent to make room.
    DropOldest,
    /// Fail the submission immediately.
    Reject,
}

/// Main fleet configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Rooms monitored by `fleet` when none are given on the command line.
    pub rooms: Vec<String>,
    /// Gateway URL template containing `{room}`.
    pub gateway_url: String,
    /// Nick set after joining, unless `stealth` is on.
    pub nick: String,
    /// Skip setting a nick entirely.
    pub stealth: bool,
    /// Maximum number of queued write intents.
    pub queue_capacity: usize,
    /// Behaviour when the writer queue is full.
    pub backpressure: BackpressurePolicy,
    /// Attempts for a write that hits a busy/locked store.
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// Pause before a worker reconnects after losing its session.
    pub reconnect_delay_ms: u64,
    /// A session with no inbound packet for this long is considered dead.
    pub receive_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            rooms: Vec::new(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            nick: DEFAULT_NICK.to_string(),
            stealth: false,
            queue_capacity: 4096,
            backpressure: BackpressurePolicy::Block,
            retry_max_attempts: 5,
            retry_base_delay_ms: 50,
            retry_max_delay_ms: 2000,
            reconnect_delay_ms: 1000,
            receive_timeout_secs: 90,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file, falling back to defaults.
    ///
    /// Environment variables are applied last and the result is validated.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `ROOMLOG_LOG_LEVEL` and `ROOMLOG_ROOMS` from `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("ROOMLOG_LOG_LEVEL").and_then(non_empty) {
            self.log_level = level;
        }
        if let Some(rooms) = lookup("ROOMLOG_ROOMS").and_then(non_empty) {
            self.rooms = rooms
                .split(',')
                .map(str::trim)
                .filter(|room| !room.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    /// Reject values the fleet cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.gateway_url.contains(ROOM_PLACEHOLDER) {
            return Err(CoreError::Config(format!(
                "gateway_url must contain {ROOM_PLACEHOLDER}: {}",
                self.gateway_url
            )));
        }
        self.gateway_url_for("room")?;

        if self.queue_capacity == 0 {
            return Err(CoreError::Config("queue_capacity must be positive".into()));
        }
        if self.retry_max_attempts == 0 {
            return Err(CoreError::Config(
                "retry_max_attempts must be at least 1".into(),
            ));
        }
        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(CoreError::Config(
                "retry_base_delay_ms exceeds retry_max_delay_ms".into(),
            ));
        }
        Ok(())
    }

    /// Gateway URL for one room.
    pub fn gateway_url_for(&self, room: &str) -> CoreResult<Url> {
        Url::parse(&self.gateway_url.replace(ROOM_PLACEHOLDER, room)).map_err(CoreError::from)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_secs(self.receive_timeout_secs)
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
