//! Structured logging for swapdesk
//!
//! This module provides a small logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-module debug control via --debug-<module> flags
//! - Dual output: colored console + append-only file
//!
//! ## Usage
//!
//! ```rust
//! use swapdesk::logger::{self, LogTag};
//!
//! logger::error(LogTag::Rpc, "All endpoints failed");
//! logger::warning(LogTag::Quote, "Quote price impact above 5%");
//! logger::info(LogTag::Swap, "Swap confirmed");
//! logger::debug(LogTag::Transaction, "Ladder step: legacy"); // Only if --debug-transaction
//! logger::verbose(LogTag::Cache, "Balance cache hit");        // Only if --verbose
//! ```
//!
//! Call `logger::init()` once at startup, before any logging occurs.

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{
    config_from_args, get_logger_config, init_from_args, set_logger_config, LoggerConfig,
};
pub use file::{init_file_logging_at, DEFAULT_LOG_PATH};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Parses command-line arguments for debug flags, then opens the file sink
/// unless `--no-log-file` was given.
pub fn init() {
    config::init_from_args();

    if get_logger_config().file_logging {
        file::init_file_logging();
    }
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (shown unless --quiet is above it)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level, only shown when --debug-<tag> is provided
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level, only shown with --verbose or --verbose-<tag>
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Force flush all pending log writes
///
/// Call this during shutdown to ensure all logs are written to disk.
pub fn flush() {
    file::flush_file_logging();
}
