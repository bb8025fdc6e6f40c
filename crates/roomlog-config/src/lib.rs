//! Configuration, paths, and logging setup shared by every roomlog crate.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{BackpressurePolicy, Config, DEFAULT_GATEWAY_URL, DEFAULT_LOG_LEVEL, DEFAULT_NICK};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
pub use paths::Paths;
