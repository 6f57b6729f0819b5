//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Cannot {action} configuration file '{path}': {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Cannot encode configuration as TOML: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A value that parsed but cannot be used, keyed by `section.field`
    #[error("Invalid configuration value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Environment variable {var} is invalid: {message}")]
    EnvParseError { var: String, message: String },
}

impl ConfigError {
    pub fn validation<K: Into<String>, M: Into<String>>(key: K, message: M) -> Self {
        Self::ValidationError {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn env_parse<V: Into<String>, M: Into<String>>(var: V, message: M) -> Self {
        Self::EnvParseError {
            var: var.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(action: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::validation("serial.baud", "must be greater than zero");
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for 'serial.baud': must be greater than zero"
        );

        let err = ConfigError::env_parse("SERIAL_WRITER_SERIAL_BAUD", "Invalid baud rate");
        assert_eq!(
            err.to_string(),
            "Environment variable SERIAL_WRITER_SERIAL_BAUD is invalid: Invalid baud rate"
        );
    }

    #[test]
    fn test_io_error_names_action_and_path() {
        let err = ConfigError::io(
            "read",
            std::path::Path::new("/etc/serial-writer.toml"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        let message = err.to_string();
        assert!(message.starts_with("Cannot read configuration file '/etc/serial-writer.toml'"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
