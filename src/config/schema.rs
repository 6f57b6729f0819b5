//! Configuration schema definitions.
//!
//! Every section has defaults, so a config file only needs the keys it
//! changes.

use super::error::{ConfigError, ConfigResult};
use crate::codec::InputFormat;
use crate::port::{DataBits, FlowControl, Parity, PortConfiguration, StopBits};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial port configuration
    pub serial: SerialConfig,
    /// How stdin lines become buffers
    pub input: InputConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.baud == 0 {
            return Err(ConfigError::validation("serial.baud", "must be greater than zero"));
        }
        if self.serial.timeout_ms == 0 {
            return Err(ConfigError::validation(
                "serial.timeout_ms",
                "must be greater than zero",
            ));
        }
        if let Some(port) = &self.serial.port {
            if port.trim().is_empty() {
                return Err(ConfigError::validation("serial.port", "must not be empty"));
            }
        }
        crate::codec::parse_terminator(&self.input.terminator)
            .map_err(|e| ConfigError::validation("input.terminator", e.to_string()))?;
        Ok(())
    }
}

/// Serial port configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port name or alias to open
    pub port: Option<String>,
    /// Baud rate
    pub baud: u32,
    /// Write timeout in milliseconds
    pub timeout_ms: u64,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Port aliases for convenience
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: 115200,
            timeout_ms: 1000,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Get the write timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Port parameters for opening a port.
    pub fn port_configuration(&self) -> PortConfiguration {
        PortConfiguration {
            baud_rate: self.baud,
            data_bits: self.data_bits,
            flow_control: self.flow_control,
            parity: self.parity,
            stop_bits: self.stop_bits,
            timeout: self.timeout(),
        }
    }
}

/// Input decoding section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// `text` or `hex`
    pub format: InputFormat,
    /// Appended to text lines; supports `\n`, `\r`, `\t`, `\0` escapes
    pub terminator: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            format: InputFormat::Text,
            terminator: "\\n".to_string(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    Pretty,
    /// Compact format
    #[default]
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.serial.baud, 115200);
        assert_eq!(config.serial.port, None);
        assert_eq!(config.input.format, InputFormat::Text);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_port_alias_resolution() {
        let mut config = SerialConfig::default();
        config
            .port_aliases
            .insert("bpod".to_string(), "/dev/ttyACM0".to_string());

        assert_eq!(config.resolve_port("bpod"), "/dev/ttyACM0");
        assert_eq!(config.resolve_port("COM5"), "COM5");
    }

    #[test]
    fn test_port_configuration() {
        let serial = SerialConfig {
            baud: 9600,
            timeout_ms: 250,
            parity: Parity::Even,
            ..Default::default()
        };
        let port = serial.port_configuration();
        assert_eq!(port.baud_rate, 9600);
        assert_eq!(port.parity, Parity::Even);
        assert_eq!(port.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[serial]"));
        assert!(toml_str.contains("[input]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [serial]
            port = "/dev/ttyUSB1"
            baud = 9600
            parity = "odd"

            [input]
            format = "hex"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.serial.port.as_deref(), Some("/dev/ttyUSB1"));
        assert_eq!(config.serial.baud, 9600);
        assert_eq!(config.serial.parity, Parity::Odd);
        assert_eq!(config.input.format, InputFormat::Hex);
        // Defaults should still work
        assert_eq!(config.input.terminator, "\\n");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validation_rejects_zero_baud() {
        let mut config = Config::default();
        config.serial.baud = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { key, .. }) if key == "serial.baud"
        ));
    }

    #[test]
    fn test_validation_rejects_bad_terminator() {
        let mut config = Config::default();
        config.input.terminator = "\\x".to_string();
        assert!(config.validate().is_err());
    }
}
