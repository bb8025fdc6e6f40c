//! # Observability
//!
//! Centralized logging setup for the roomlog workspace.
//!
//! ## Design Philosophy
//!
//! Room workers and the writer are **log producers**. They call
//! `observability::init_with_config()` once at startup and use standard
//! `tracing` macros everywhere else. They never know where lines end up.
//!
//! ## Output
//!
//! - With `log_path` set, every event is appended as one JSON object per line
//!   (timestamp, level, service, pid, target, message, fields). A compact
//!   stderr layer can be added next to it with `also_stderr`.
//! - Without `log_path`, a compact human-readable formatter writes to stderr.
//!
//! `RUST_LOG` always wins over `default_level`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "roomlog".into(),
//!         default_level: "debug".into(),
//!         ..Default::default()
//!     });
//!
//!     tracing::info!("ready");
//! }
//! ```

mod file;
mod json_layer;

use std::path::PathBuf;

pub use json_layer::LogEntry;

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every JSON line.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional JSONL log file. When unset, logs go to stderr only.
    pub log_path: Option<PathBuf>,

    /// Also emit compact logs to stderr when writing to a file.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize the logging layer with default settings.
///
/// ```rust,ignore
/// fn main() {
///     observability::init("my-service");
///     tracing::info!("ready");
/// }
/// ```
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize the logging layer with custom configuration.
///
/// Calling this twice is harmless: the second global subscriber install is
/// rejected by `tracing` and ignored here.
pub fn init_with_config(config: LogConfig) {
    if let Some(path) = config.log_path.clone() {
        match file::init_file_subscriber(&config, &path) {
            Ok(()) => return,
            Err(e) => {
                eprintln!(
                    "failed to open log file {}: {}; falling back to stderr",
                    path.display(),
                    e
                );
            }
        }
    }

    use tracing_subscriber::util::SubscriberInitExt;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.default_level)),
        )
        .with_target(true)
        .compact()
        .finish()
        .try_init();
}

/// Re-export tracing macros for convenience.
/// Services can use `observability::info!()` or `tracing::info!()`.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "unknown");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(!config.also_stderr);
    }
}
