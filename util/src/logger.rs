//! Logging setup and rate limited logging

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use log::{self, info};
use colored::{ColoredString, Colorize};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

#[doc(hidden)]
pub use ::log as __log;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// MACROS
// ---------------------------------------------------------------------------

/// Log a message at the given level only once every `n` calls from this call site.
///
/// The first call always logs. Used for messages which would otherwise be emitted on every cycle.
///
/// ```ignore
/// log_every!(100, log::Level::Warn, "No chassis msg yet");
/// ```
#[macro_export]
macro_rules! log_every {
    ($n:expr, $lvl:expr, $($arg:tt)+) => ({
        static LOG_EVERY_COUNTER: std::sync::atomic::AtomicU64 =
            std::sync::atomic::AtomicU64::new(0);
        if $crate::logger::should_log(&LOG_EVERY_COUNTER, $n) {
            $crate::logger::__log::log!($lvl, $($arg)+);
        }
    });
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger, writing to stdout and the session's log file.
///
/// `min_level` must be at least `Info`, so that estop transitions are never filtered out. Only
/// call this once per process.
pub fn logger_init(
    min_level: self::LevelFilter, 
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            // Subscriber callbacks log from their own threads, so name the thread when it isn't
            // the main one
            let thread = std::thread::current();
            let thread_name = match thread.name() {
                Some("main") | None => String::new(),
                Some(n) => format!(" ({})", n),
            };

            // Debug and trace lines include the target
            if record.level() > log::Level::Info {
                out.finish(format_args!(
                    "[{:10.6} {}{}] {}: {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    thread_name,
                    record.target(),
                    message
                ))
            }
            else {
                out.finish(format_args!(
                    "[{:10.6} {}{}] {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    thread_name,
                    message
                ))
            }
        })
        .level(min_level)
        .level_for("zmq", LevelFilter::Info)
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session.epoch);
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

/// Advance a `log_every!` call site counter, returning `true` if this call should be logged.
///
/// An `n` of zero or one logs every call.
pub fn should_log(counter: &AtomicU64, n: u64) -> bool {
    let count = counter.fetch_add(1, Ordering::Relaxed);

    n <= 1 || count % n == 0
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info  => "INF".normal(),
        log::Level::Warn  => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold()
    }
}
