//! roomlog - records chat rooms into one shared SQLite store.

mod app;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use roomlog_config::{init_logging, Config, Paths};

/// roomlog command-line interface.
#[derive(Parser)]
#[command(name = "roomlog")]
#[command(about = "Record chat rooms into a shared SQLite store")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for config, store, and logs. Defaults to ~/.roomlog
    #[arg(long, global = true, env = "ROOMLOG_BASE_DIR")]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor several rooms through one shared writer
    Fleet {
        /// Rooms to monitor. Defaults to `rooms` from config.json
        rooms: Vec<String>,
    },
    /// Monitor a single room, writing directly to the store
    Watch {
        room: String,
        /// Stop once history has been reconciled
        #[arg(long)]
        backfill_only: bool,
        /// Do not set a nick after joining
        #[arg(long)]
        stealth: bool,
    },
    /// Show what the store holds
    Status {
        /// Only this room
        room: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    let level = cli.log_level.unwrap_or_else(|| config.log_level.clone());
    init_logging(&level, &paths);

    match cli.command {
        Some(Commands::Fleet { rooms }) => {
            app::run_fleet(config, paths, rooms).await?;
        }
        None => {
            // Default to the configured fleet
            app::run_fleet(config, paths, Vec::new()).await?;
        }
        Some(Commands::Watch {
            room,
            backfill_only,
            stealth,
        }) => {
            app::run_watch(config, paths, room, backfill_only, stealth).await?;
        }
        Some(Commands::Status { room }) => {
            app::check_status(&paths, room.as_deref()).await?;
        }
    }

    Ok(())
}
