// ============================================================
// Layer 6 — Logger Registry
// ============================================================
// Named loggers built on tracing-subscriber, one subscriber per
// name, kept in a process-wide registry:
//
//   setup_logger("gaze", settings)  → builds (or returns) the logger
//   get_logger("gaze")              → existing one, or defaults
//   shutdown_logger("gaze")         → drop it from the registry
//
// Every logger has:
//   - a reloadable LevelFilter, so the level can change at runtime
//   - an optional console sink (stdout)
//   - an optional file sink  <log_dir>/<name>_<YYYYmmdd_HHMMSS>.log
//
// Lines look like:
//   2026-01-05 14:03:11 - gaze - INFO - Epoch 1/10
//
// Setting up a name twice never adds sinks; it only applies the
// new level to the existing logger.
//
// Reference: tracing-subscriber docs (reload, fmt::FormatEvent)

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self, format, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{reload, Registry};

use crate::error::{PipelineError, Result};

pub const DEFAULT_LOGGER: &str = "gaze_pipeline";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// How a named logger is built.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggerSettings {
    pub level:    LevelFilter,
    /// Write to stdout
    pub console:  bool,
    /// Directory for the file sink; `None` disables it
    pub log_dir:  Option<PathBuf>,
    /// Explicit file name inside `log_dir`; timestamped when absent
    pub log_file: Option<String>,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level:    LevelFilter::INFO,
            console:  true,
            log_dir:  Some(PathBuf::from(DEFAULT_LOG_DIR)),
            log_file: None,
        }
    }
}

impl LoggerSettings {
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    pub fn with_log_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.log_dir = dir;
        self
    }

    pub fn with_log_file(mut self, file: impl Into<String>) -> Self {
        self.log_file = Some(file.into());
        self
    }
}

/// `"debug"`, `"INFO"`, `"warn"`, `"off"`, ...
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(level)
        .map_err(|_| PipelineError::config("logging.level", format!("unknown log level '{level}'")))
}

// ─── Line format ──────────────────────────────────────────────────────────────
/// `<time> - <name> - <LEVEL> - <message>`
struct LineFormat {
    name: String,
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx:        &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event:      &Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        write!(writer, "{} - {} - {} - ", now, self.name, event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

// ─── Logger ───────────────────────────────────────────────────────────────────
pub struct Logger {
    name:       String,
    dispatch:   Dispatch,
    level:      reload::Handle<LevelFilter, Registry>,
    sink_count: usize,
    log_path:   Option<PathBuf>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("sink_count", &self.sink_count)
            .field("log_path", &self.log_path)
            .finish()
    }
}

impl Logger {
    fn build(name: &str, settings: &LoggerSettings) -> Result<Self> {
        let (filter, handle) = reload::Layer::new(settings.level);

        let console = settings.console.then(|| {
            fmt::layer()
                .event_format(LineFormat { name: name.to_string() })
                .with_writer(std::io::stdout)
        });

        let log_path = match &settings.log_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                let file_name = settings.log_file.clone().unwrap_or_else(|| {
                    format!("{}_{}.log", name, chrono::Local::now().format("%Y%m%d_%H%M%S"))
                });
                Some(dir.join(file_name))
            }
            None => None,
        };

        let file = match &log_path {
            Some(path) => {
                let handle = OpenOptions::new().create(true).append(true).open(path)?;
                Some(
                    fmt::layer()
                        .event_format(LineFormat { name: name.to_string() })
                        .with_ansi(false)
                        .with_writer(Mutex::new(handle)),
                )
            }
            None => None,
        };

        let sink_count = usize::from(console.is_some()) + usize::from(file.is_some());
        let subscriber = tracing_subscriber::registry().with(filter).with(console).with(file);

        Ok(Self {
            name: name.to_string(),
            dispatch: Dispatch::new(subscriber),
            level: handle,
            sink_count,
            log_path,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of attached sinks (console and/or file)
    pub fn sink_count(&self) -> usize {
        self.sink_count
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    pub fn level(&self) -> LevelFilter {
        self.level.clone_current().unwrap_or(LevelFilter::OFF)
    }

    pub fn set_level(&self, level: LevelFilter) -> Result<()> {
        self.level
            .reload(level)
            .map_err(|e| PipelineError::Logging(format!("cannot change level of '{}': {e}", self.name)))
    }

    /// Temporarily switch to `level`; the previous level comes back
    /// when the guard is dropped, whichever way the scope is left.
    pub fn scoped_level(&self, level: LevelFilter) -> Result<LevelGuard<'_>> {
        let previous = self.level();
        self.set_level(level)?;
        Ok(LevelGuard { logger: self, previous })
    }

    /// Route every `tracing` event emitted inside `f` to this logger.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

/// Restores a logger's previous level on drop.
#[must_use = "the level is restored as soon as the guard is dropped"]
pub struct LevelGuard<'a> {
    logger:   &'a Logger,
    previous: LevelFilter,
}

impl LevelGuard<'_> {
    pub fn previous(&self) -> LevelFilter {
        self.previous
    }
}

impl Drop for LevelGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.logger.set_level(self.previous) {
            eprintln!("{e}");
        }
    }
}

// ─── Registry ─────────────────────────────────────────────────────────────────
type LoggerMap = HashMap<String, Arc<Logger>>;

fn registry() -> &'static Mutex<LoggerMap> {
    static LOGGERS: OnceLock<Mutex<LoggerMap>> = OnceLock::new();
    LOGGERS.get_or_init(|| Mutex::new(HashMap::new()))
}

fn lock() -> Result<std::sync::MutexGuard<'static, LoggerMap>> {
    registry()
        .lock()
        .map_err(|_| PipelineError::Logging("logger registry is poisoned".to_string()))
}

/// Build the logger called `name`, or return the existing one with
/// `settings.level` applied. Sinks are only attached the first time.
pub fn setup_logger(name: &str, settings: &LoggerSettings) -> Result<Arc<Logger>> {
    let mut loggers = lock()?;

    if let Some(existing) = loggers.get(name) {
        existing.set_level(settings.level)?;
        return Ok(Arc::clone(existing));
    }

    let logger = Arc::new(Logger::build(name, settings)?);
    loggers.insert(name.to_string(), Arc::clone(&logger));
    Ok(logger)
}

/// Existing logger, or a new one with default settings.
pub fn get_logger(name: &str) -> Result<Arc<Logger>> {
    if let Some(existing) = lock()?.get(name) {
        return Ok(Arc::clone(existing));
    }
    setup_logger(name, &LoggerSettings::default())
}

/// Remove `name` from the registry. Returns whether it was registered.
/// Sinks close once the last handle to the logger is dropped.
pub fn shutdown_logger(name: &str) -> Result<bool> {
    Ok(lock()?.remove(name).is_some())
}
