//! Line-oriented log sink for `tracing` events.
//!
//! Each event becomes `<time> <LEVEL> <message> key=value ...` with fields
//! sorted by key. Per-level counters are kept for the whole process.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

/// Log file name, in the temp dir or the repository root.
pub const LOG_FILE_NAME: &str = "hunkwatch.log";

static COUNTERS: OnceLock<Arc<Counters>> = OnceLock::new();

/// Events seen per level.
#[derive(Debug, Default)]
pub struct Counters {
    error: AtomicU64,
    warn: AtomicU64,
    info: AtomicU64,
    debug: AtomicU64,
    trace: AtomicU64,
}

/// Snapshot of [`Counters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct LogCounts {
    pub error: u64,
    pub warn: u64,
    pub info: u64,
    pub debug: u64,
    pub trace: u64,
}

impl Counters {
    fn record(&self, level: Level) {
        let counter = match level {
            Level::ERROR => &self.error,
            Level::WARN => &self.warn,
            Level::INFO => &self.info,
            Level::DEBUG => &self.debug,
            Level::TRACE => &self.trace,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Current values.
    pub fn snapshot(&self) -> LogCounts {
        LogCounts {
            error: self.error.load(Ordering::Relaxed),
            warn: self.warn.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            debug: self.debug.load(Ordering::Relaxed),
            trace: self.trace.load(Ordering::Relaxed),
        }
    }
}

/// Events logged since [`init`], per level. Zero before `init`.
pub fn counts() -> LogCounts {
    COUNTERS.get().map(|c| c.snapshot()).unwrap_or_default()
}

/// Where log lines go.
pub enum Sink {
    /// Appending file.
    File(PathBuf, File),
    /// Standard error.
    Stderr,
}

impl Sink {
    /// First writable of `<temp dir>/hunkwatch.log` and `<root>/hunkwatch.log`, else stderr.
    pub fn open(root: &Path) -> Self {
        let candidates = [std::env::temp_dir(), root.to_path_buf()];
        for dir in candidates {
            let path = dir.join(LOG_FILE_NAME);
            if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
                return Sink::File(path, file);
            }
        }
        Sink::Stderr
    }

    /// Path of the log file, if logging to one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Sink::File(path, _) => Some(path),
            Sink::Stderr => None,
        }
    }

    fn into_writer(self) -> Box<dyn Write + Send> {
        match self {
            Sink::File(_, file) => Box::new(file),
            Sink::Stderr => Box::new(io::stderr()),
        }
    }
}

/// `tracing` layer writing one line per event.
pub struct LineLayer {
    writer: Mutex<Box<dyn Write + Send>>,
    counters: Arc<Counters>,
}

impl LineLayer {
    /// Layer writing to `writer` and counting into `counters`.
    pub fn new(writer: Box<dyn Write + Send>, counters: Arc<Counters>) -> Self {
        Self {
            writer: Mutex::new(writer),
            counters,
        }
    }
}

impl<S: Subscriber> Layer<S> for LineLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        self.counters.record(level);

        let mut fields = FieldCollector::default();
        event.record(&mut fields);
        let line = format_line(
            &Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level,
            &fields.message,
            &fields.fields,
        );

        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "{line}");
        let _ = writer.flush();
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), quote(value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let value = format!("{value:?}");
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.insert(field.name().to_string(), quote(&value));
        }
    }
}

fn quote(value: &str) -> String {
    if value.is_empty() || value.contains(char::is_whitespace) || value.contains('"') {
        format!("{value:?}")
    } else {
        value.to_string()
    }
}

fn format_line(
    time: &str,
    level: Level,
    message: &str,
    fields: &BTreeMap<String, String>,
) -> String {
    let mut line = format!("{time} {:<5} {message}", level.to_string());
    for (key, value) in fields {
        line.push(' ');
        line.push_str(key);
        line.push('=');
        line.push_str(value);
    }
    line
}

/// Install the global subscriber. Returns the log file path, if any.
pub fn init(root: &Path, level: Level) -> Option<PathBuf> {
    let sink = Sink::open(root);
    let path = sink.path().map(Path::to_path_buf);
    let counters = COUNTERS.get_or_init(|| Arc::new(Counters::default())).clone();

    let installed = tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(LineLayer::new(sink.into_writer(), counters))
        .try_init();
    if installed.is_err() {
        return None;
    }
    tracing::info!(level = %level, path = ?path, "logging started");
    path
}
