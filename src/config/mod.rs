//! Configuration module for serial-writer.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_WRITER_CONFIG` environment variable (explicit path)
//! 2. `./serial-writer.toml` (current directory)
//! 3. `~/.config/serial-writer/config.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\serial-writer\config.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `SERIAL_WRITER_<SECTION>_<KEY>`, for example:
//! - `SERIAL_WRITER_SERIAL_PORT=/dev/ttyACM0`
//! - `SERIAL_WRITER_SERIAL_BAUD=9600`
//! - `SERIAL_WRITER_LOGGING_FORMAT=json`
//!
//! # Example
//!
//! ```toml
//! [serial]
//! port = "bpod"
//! baud = 115200
//!
//! [serial.port_aliases]
//! bpod = "/dev/ttyACM0"
//!
//! [input]
//! format = "hex"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{get_default_config_path, resolve_config_path, ConfigLoader};
pub use schema::{Config, InputConfig, LogFormat, LoggingConfig, SerialConfig};
