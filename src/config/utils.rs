/// Configuration utilities - loading and access helpers
///
/// - Loading configuration from disk (TOML, defaults when absent)
/// - Thread-safe access helpers
/// - Saving the current configuration back to disk
use super::schemas::Config;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::path::Path;

/// Global configuration instance
///
/// Access it using the helper functions below. Swap components take their
/// section by value at construction and never write back.
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/config.toml";

/// Parse and validate a configuration file without touching the global
pub fn read_config_file(path: &Path) -> Result<Config, String> {
    let config = if path.exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        toml::from_str::<Config>(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?
    } else {
        eprintln!(
            "⚠️  Config file '{}' not found, using default values",
            path.display()
        );
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from the default path and initialize the global CONFIG
pub fn load_config() -> Result<(), String> {
    load_config_from_path(Path::new(CONFIG_FILE_PATH))
}

/// Load configuration from a specific file path
pub fn load_config_from_path(path: &Path) -> Result<(), String> {
    let config = read_config_file(path)?;

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| "Config already initialized".to_string())
}

/// Execute a function with read access to the configuration
///
/// Falls back to defaults when `load_config` was never called, so library
/// consumers and tests do not need a config file.
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    let lock = CONFIG.get_or_init(|| RwLock::new(Config::default()));
    let config = lock.read();
    f(&config)
}

/// Get a clone of the entire configuration
///
/// Use when values must be held across await points.
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

/// Write a configuration to disk as pretty TOML
pub fn save_config(config: &Config, path: &Path) -> Result<(), String> {
    let contents =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    std::fs::write(path, contents)
        .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.swaps.slippage_percent, 1.0);
        assert_eq!(config.swaps.quote_timeout_secs, 5);
        assert_eq!(config.recovery.max_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[swaps]"));
        assert!(toml_str.contains("[recovery]"));
        assert!(toml_str.contains("[rpc]"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[swaps]\nslippage_percent = 2.5\n").unwrap();

        let config = read_config_file(&path).unwrap();
        assert_eq!(config.swaps.slippage_percent, 2.5);
        assert_eq!(config.swaps.priority_fee_micro_lamports, 1_000);
        assert_eq!(config.recovery.rate_limit_cooldown_ms, 5_000);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.rpc.use_custom_rpc = true;
        config.rpc.custom_url = "https://rpc.example.org".to_string();
        save_config(&config, &path).unwrap();

        let loaded = read_config_file(&path).unwrap();
        assert_eq!(
            loaded.rpc.endpoints()[0],
            "https://rpc.example.org".to_string()
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[swaps]\nslippage_percent = 150.0\n").unwrap();
        assert!(read_config_file(&path).is_err());

        std::fs::write(
            &path,
            "[recovery]\nbase_delay_ms = 5000\nrate_limit_cooldown_ms = 1000\n",
        )
        .unwrap();
        assert!(read_config_file(&path).is_err());

        std::fs::write(&path, "[rpc]\nurls = []\n").unwrap();
        assert!(read_config_file(&path).is_err());
    }

    #[test]
    fn test_custom_endpoint_is_ignored_when_disabled() {
        let mut config = Config::default();
        config.rpc.custom_url = "https://rpc.example.org".to_string();
        assert_eq!(config.rpc.endpoints(), config.rpc.urls);
    }
}
