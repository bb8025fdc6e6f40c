//! Logging initialization for roomlog.
//!
//! By default logs go to stderr. Setting `ROOMLOG_LOG_JSON=1` switches to
//! structured JSONL in `~/.roomlog/logs/roomlog.jsonl`, still mirrored to
//! stderr, so every worker in the fleet appends to one file.

use crate::Paths;
use observability::LogConfig;

/// Initialize the logging system.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_logging(level: &str, paths: &Paths) {
    let log_path = std::env::var("ROOMLOG_LOG_JSON")
        .ok()
        .filter(|value| json_enabled(value))
        .map(|_| paths.log_file());

    observability::init_with_config(LogConfig {
        service_name: "roomlog".into(),
        default_level: level.into(),
        also_stderr: log_path.is_some(),
        log_path,
    });
}

fn json_enabled(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_enabled_values() {
        assert!(json_enabled("1"));
        assert!(json_enabled(" TRUE "));
        assert!(json_enabled("on"));
        assert!(!json_enabled("0"));
        assert!(!json_enabled(""));
        assert!(!json_enabled("false"));
    }
}
