//! Rolling Logger
//!
//! Rolling file logging plus an in-process circular buffer of recent
//! entries. The buffer works without `init_logger`, so operator-facing
//! errors are always retrievable through [`recent_entries`].

mod buffer;
mod writer;

use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_log::NormalizeEvent;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

pub use buffer::{LogEntry, RingBuffer};
pub use writer::RollingFileWriter;

/// Entries kept in memory
pub const RECENT_CAPACITY: usize = 500;
/// Size at which the log file rolls over
pub const MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;
/// Rolled-over files kept next to the live one
pub const KEEP_FILES: usize = 3;

/// Events from the helpers below; already buffered when emitted
const DIRECT_TARGET: &str = "rolling_logger";

fn recent() -> &'static Mutex<RingBuffer> {
    static RECENT: OnceLock<Mutex<RingBuffer>> = OnceLock::new();
    RECENT.get_or_init(|| Mutex::new(RingBuffer::new(RECENT_CAPACITY)))
}

fn push_recent(entry: LogEntry) -> Result<(), String> {
    let mut ring = recent().lock().map_err(|e| e.to_string())?;
    ring.push(entry);
    Ok(())
}

/// Install the global subscriber: `<app_name>.log` in `log_dir` plus the
/// in-memory buffer. `log` records are bridged through `tracing-log`.
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), String> {
    std::fs::create_dir_all(&log_dir).map_err(|e| format!("create {}: {}", log_dir.display(), e))?;
    let path = log_dir.join(format!("{}.log", app_name));
    let writer = RollingFileWriter::new(&path, MAX_FILE_BYTES, KEEP_FILES)
        .map_err(|e| format!("open {}: {}", path.display(), e))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(writer));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(CaptureLayer)
        .try_init()
        .map_err(|e| e.to_string())?;

    log::info!("{} logging to {}", app_name, path.display());
    Ok(())
}

pub fn info(message: &str) -> Result<(), String> {
    record(Level::INFO, message)
}

pub fn warn(message: &str) -> Result<(), String> {
    record(Level::WARN, message)
}

pub fn error(message: &str) -> Result<(), String> {
    record(Level::ERROR, message)
}

fn record(level: Level, message: &str) -> Result<(), String> {
    push_recent(LogEntry::new(level.as_str(), DIRECT_TARGET, message))?;
    if level == Level::ERROR {
        tracing::error!(target: "rolling_logger", "{}", message);
    } else if level == Level::WARN {
        tracing::warn!(target: "rolling_logger", "{}", message);
    } else {
        tracing::info!(target: "rolling_logger", "{}", message);
    }
    Ok(())
}

/// Most recent entries, oldest first
pub fn recent_entries() -> Vec<LogEntry> {
    recent().lock().map(|ring| ring.entries()).unwrap_or_default()
}

pub fn clear_recent() {
    if let Ok(mut ring) = recent().lock() {
        ring.clear();
    }
}

/// Feeds INFO and above into the circular buffer
struct CaptureLayer;

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // bridged `log` records carry their real target in fields
        let normalized = event.normalized_metadata();
        let meta = normalized.as_ref().unwrap_or_else(|| event.metadata());
        if *meta.level() > Level::INFO || meta.target() == DIRECT_TARGET {
            return;
        }
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let message = visitor.message.unwrap_or_default();
        let _ = push_recent(LogEntry::new(meta.level().as_str(), meta.target(), message));
    }
}
