//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::{Config, LogFormat};
use crate::codec::InputFormat;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_WRITER";

/// Config file name in the current directory
const LOCAL_CONFIG_FILE_NAME: &str = "serial-writer.toml";

/// Config file name inside the per-user config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory name under the platform config root
const APP_DIR_NAME: &str = "serial-writer";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIAL_WRITER_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `SERIAL_WRITER_CONFIG` environment variable (explicit path)
    /// 2. `./serial-writer.toml` (current directory)
    /// 3. `~/.config/serial-writer/config.toml` (XDG on Linux/macOS)
    /// 4. `%APPDATA%\serial-writer\config.toml` (Windows)
    /// 5. Built-in defaults (no file required)
    ///
    /// Environment variables override file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }

        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        if apply_env_overrides(&mut config).is_err() {
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. XDG config directory (Linux/macOS) or APPDATA (Windows)
    if let Some(app_config) = get_default_config_path() {
        if app_config.exists() {
            return Some(app_config);
        }
    }

    None
}

/// Get the platform-specific config directory.
fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::io("read", path, e))?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::io("create", path, e))?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::io("write", path, e))
}

fn env_var(key: &str) -> Option<(String, String)> {
    let var = format!("{}_{}", ENV_PREFIX, key);
    std::env::var(&var).ok().map(|val| (var, val))
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `SERIAL_WRITER_<SECTION>_<KEY>`
/// For example:
/// - `SERIAL_WRITER_SERIAL_PORT=/dev/ttyACM0`
/// - `SERIAL_WRITER_SERIAL_BAUD=9600`
/// - `SERIAL_WRITER_INPUT_FORMAT=hex`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Serial overrides
    if let Some((_, val)) = env_var("SERIAL_PORT") {
        config.serial.port = Some(val);
    }
    if let Some((var, val)) = env_var("SERIAL_BAUD") {
        config.serial.baud = val
            .parse()
            .map_err(|_| ConfigError::env_parse(var, "Invalid baud rate"))?;
    }
    if let Some((var, val)) = env_var("SERIAL_TIMEOUT_MS") {
        config.serial.timeout_ms = val
            .parse()
            .map_err(|_| ConfigError::env_parse(var, "Invalid timeout"))?;
    }

    // Input overrides
    if let Some((var, val)) = env_var("INPUT_FORMAT") {
        config.input.format = match val.to_ascii_lowercase().as_str() {
            "text" => InputFormat::Text,
            "hex" => InputFormat::Hex,
            _ => return Err(ConfigError::env_parse(var, "Expected 'text' or 'hex'")),
        };
    }
    if let Some((_, val)) = env_var("INPUT_TERMINATOR") {
        config.input.terminator = val;
    }

    // Logging overrides
    if let Some((_, val)) = env_var("LOGGING_LEVEL") {
        config.logging.level = val;
    }
    if let Some((var, val)) = env_var("LOGGING_FORMAT") {
        config.logging.format = val
            .parse::<LogFormat>()
            .map_err(|msg| ConfigError::env_parse(var, msg))?;
    }

    Ok(())
}
