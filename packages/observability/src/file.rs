//! JSONL file output.
//!
//! Appends one structured line per event to a single file. Several processes
//! may share the file safely: each line is written with one append + flush.

use crate::json_layer::JsonLayer;
use crate::LogConfig;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Append-only writer shared by every event.
#[derive(Clone)]
pub struct AppendLogWriter {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl AppendLogWriter {
    pub fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(8192, file))),
        })
    }
}

impl io::Write for AppendLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let result = guard.write(buf);
        // Lines must be visible to `tail -f` immediately.
        guard.flush()?;
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// MakeWriter implementation for tracing-subscriber
#[derive(Clone)]
pub struct WriterFactory {
    writer: AppendLogWriter,
}

impl<'a> MakeWriter<'a> for WriterFactory {
    type Writer = AppendLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer.clone()
    }
}

/// Install the JSONL file subscriber (plus optional stderr layer).
pub fn init_file_subscriber(config: &LogConfig, log_path: &Path) -> io::Result<()> {
    let writer = AppendLogWriter::new(log_path)?;
    let json_layer = JsonLayer::new(config.service_name.clone(), WriterFactory { writer });

    let stderr_layer = if config.also_stderr {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
    } else {
        None
    };

    let env_filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level))
    };

    let _ = tracing_subscriber::registry()
        .with(json_layer.with_filter(env_filter()))
        .with(stderr_layer.map(|l| l.with_filter(env_filter())))
        .try_init();

    tracing::info!(log_path = %log_path.display(), "observability initialized");
    Ok(())
}
