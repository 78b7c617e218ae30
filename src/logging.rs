//! Console verbosity and the named logger registry.
//!
//! A [`Logging`] value owns the console level and a registry of named loggers,
//! each with handlers whose levels gate the `tracing` layers installed by
//! [`Logging::install`]. Changing the console level propagates to every
//! handler of the aggregate logger [`AGGREGATE_LOGGER`], so a level change
//! takes effect on the live console output.
//!
//! Temporarily silencing the console is done with a guard:
//!
//! ```
//! use crab_utils::logging::Logging;
//! use tracing::level_filters::LevelFilter;
//!
//! let logging = Logging::new(LevelFilter::INFO);
//! {
//!     let _muted = logging.mute();
//!     assert_eq!(logging.console_level(), LevelFilter::OFF);
//! }
//! assert_eq!(logging.console_level(), LevelFilter::INFO);
//! ```

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::level_filters::LevelFilter;
use tracing::Metadata;
use tracing_subscriber::{filter, fmt, prelude::*};

/// Logger owning the log file handler.
pub const ROOT_LOGGER: &str = "CRAB3";
/// Logger whose handlers follow the console level.
pub const AGGREGATE_LOGGER: &str = "CRAB3.all";
pub const CONSOLE_HANDLER: &str = "console";
pub const LOGFILE_HANDLER: &str = "logfile";
/// Console level that suppresses all output.
pub const MUTE: LevelFilter = LevelFilter::OFF;

/// A named output sink with its own adjustable level.
///
/// Clones share the level, so the copy captured by a layer filter sees
/// updates made through the registry.
#[derive(Debug, Clone)]
pub struct Handler {
    name: String,
    level: Arc<RwLock<LevelFilter>>,
}

impl Handler {
    pub fn new(name: &str, level: LevelFilter) -> Self {
        Self {
            name: name.to_string(),
            level: Arc::new(RwLock::new(level)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LevelFilter {
        *self.level.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_level(&self, level: LevelFilter) {
        *self.level.write().unwrap_or_else(PoisonError::into_inner) = level;
    }

    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        *metadata.level() <= self.level()
    }
}

/// Snapshot of one registered logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerInfo {
    pub name: String,
    /// Handler names and their current levels
    pub handlers: Vec<(String, LevelFilter)>,
}

pub struct Logging {
    console_level: Mutex<LevelFilter>,
    loggers: Mutex<BTreeMap<String, Vec<Handler>>>,
}

impl Logging {
    /// Create a logging configuration with an empty registry.
    pub fn new(console_level: LevelFilter) -> Self {
        Self {
            console_level: Mutex::new(console_level),
            loggers: Mutex::new(BTreeMap::new()),
        }
    }

    /// Attach `handler` to `logger`, creating the logger if needed.
    pub fn register(&self, logger: &str, handler: Handler) {
        self.lock_loggers()
            .entry(logger.to_string())
            .or_default()
            .push(handler);
    }

    /// Snapshot of the registry, ordered by logger name.
    pub fn loggers(&self) -> Vec<LoggerInfo> {
        self.lock_loggers()
            .iter()
            .map(|(name, handlers)| LoggerInfo {
                name: name.clone(),
                handlers: handlers
                    .iter()
                    .map(|h| (h.name().to_string(), h.level()))
                    .collect(),
            })
            .collect()
    }

    pub fn console_level(&self) -> LevelFilter {
        *self
            .console_level
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the console level and apply it to every handler of
    /// [`AGGREGATE_LOGGER`], if that logger is registered.
    pub fn set_console_level(&self, level: LevelFilter) {
        *self
            .console_level
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = level;

        if let Some(handlers) = self.lock_loggers().get(AGGREGATE_LOGGER) {
            for handler in handlers {
                handler.set_level(level);
            }
        }
    }

    /// Switch the console to `level` until the returned guard is dropped.
    ///
    /// Not safe against other threads changing the console level while
    /// the guard is alive: the guard restores the level it replaced.
    pub fn override_console(&self, level: LevelFilter) -> ConsoleGuard<'_> {
        let previous = self.console_level();
        self.set_console_level(level);
        ConsoleGuard {
            logging: self,
            previous,
        }
    }

    /// Silence the console until the returned guard is dropped.
    pub fn mute(&self) -> ConsoleGuard<'_> {
        self.override_console(MUTE)
    }

    /// Install the process-wide `tracing` subscriber.
    ///
    /// Console output goes to stderr through a handler registered under
    /// [`AGGREGATE_LOGGER`]. With `log_file`, everything at debug level and
    /// above is also written there through a handler registered under
    /// [`ROOT_LOGGER`]. Handlers are registered only once the subscriber is
    /// installed, so a failed call leaves the registry untouched.
    pub fn install(&self, log_file: Option<&Path>) -> Result<()> {
        let console = Handler::new(CONSOLE_HANDLER, self.console_level());
        let mut handlers = vec![(AGGREGATE_LOGGER, console.clone())];

        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .with_filter(filter::filter_fn(move |metadata| console.enabled(metadata)));

        let file_layer = match log_file {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create log file {}", path.display()))?;
                let handler = Handler::new(LOGFILE_HANDLER, LevelFilter::DEBUG);
                handlers.push((ROOT_LOGGER, handler.clone()));

                Some(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file))
                        .with_filter(filter::filter_fn(move |metadata| handler.enabled(metadata))),
                )
            }
            None => None,
        };

        tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .context("Failed to install logging subscriber")?;

        for (logger, handler) in handlers {
            self.register(logger, handler);
        }
        Ok(())
    }

    fn lock_loggers(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<Handler>>> {
        self.loggers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self::new(LevelFilter::INFO)
    }
}

/// Restores the console level it replaced when dropped.
#[must_use = "the console level is restored as soon as the guard is dropped"]
pub struct ConsoleGuard<'a> {
    logging: &'a Logging,
    previous: LevelFilter,
}

impl ConsoleGuard<'_> {
    /// Level that will be restored.
    pub fn previous(&self) -> LevelFilter {
        self.previous
    }
}

impl Drop for ConsoleGuard<'_> {
    fn drop(&mut self) {
        self.logging.set_console_level(self.previous);
    }
}
