/// Logger configuration and command-line flag parsing
///
/// Flags recognised:
/// - `--debug-<tag>`   enable debug output for one tag
/// - `--verbose-<tag>` enable verbose output for one tag
/// - `--verbose`       enable verbose output everywhere
/// - `--quiet`         only errors and warnings
/// - `--no-log-file`   disable the file sink
use super::levels::LogLevel;
use super::tags::LogTag;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Most detailed level that may be printed
    pub min_level: LogLevel,
    /// Tags with debug output enabled
    pub debug_tags: HashSet<String>,
    /// Tags with verbose output enabled
    pub verbose_tags: HashSet<String>,
    /// Mirror log lines into the append-only file sink
    pub file_logging: bool,
    /// Print to stdout
    pub console: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Debug,
            debug_tags: HashSet::new(),
            verbose_tags: HashSet::new(),
            file_logging: true,
            console: true,
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Snapshot of the current logger configuration
pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

/// Replace the logger configuration
pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

/// Build a configuration from an argument list
pub fn config_from_args<I, S>(args: I) -> LoggerConfig
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut config = LoggerConfig::default();

    for arg in args {
        let arg = arg.as_ref();
        if arg == "--verbose" {
            config.min_level = LogLevel::Verbose;
        } else if arg == "--quiet" {
            config.min_level = LogLevel::Warning;
        } else if arg == "--no-log-file" {
            config.file_logging = false;
        } else if let Some(key) = arg.strip_prefix("--debug-") {
            if let Some(tag) = LogTag::from_debug_key(key) {
                config.debug_tags.insert(tag.to_debug_key());
            }
        } else if let Some(key) = arg.strip_prefix("--verbose-") {
            if let Some(tag) = LogTag::from_debug_key(key) {
                config.verbose_tags.insert(tag.to_debug_key());
            }
        }
    }

    config
}

/// Initialise configuration from the process arguments
pub fn init_from_args() {
    set_logger_config(config_from_args(std::env::args().skip(1)));
}

pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    let config = LOGGER_CONFIG.read();
    config.debug_tags.contains(&tag.to_debug_key()) || config.min_level == LogLevel::Verbose
}

pub fn is_verbose_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG.read().verbose_tags.contains(&tag.to_debug_key())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_are_parsed() {
        let config = config_from_args(["--debug-swap", "--verbose-rpc", "--no-log-file", "--debug-bogus"]);
        assert!(config.debug_tags.contains("swap"));
        assert!(config.verbose_tags.contains("rpc"));
        assert_eq!(config.debug_tags.len(), 1);
        assert!(!config.file_logging);
        assert_eq!(config.min_level, LogLevel::Debug);
    }

    #[test]
    fn test_quiet_and_verbose() {
        assert_eq!(config_from_args(["--quiet"]).min_level, LogLevel::Warning);
        assert_eq!(config_from_args(["--verbose"]).min_level, LogLevel::Verbose);
    }
}
