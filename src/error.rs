use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::port::PortError;
use crate::writer::WriteError;
use std::fmt;

/// Unified application error type.
///
/// Used by the `serial-writer` binary; library callers usually match on the
/// per-layer errors instead.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Port(PortError),
    Write(WriteError),
    InvalidInput(CodecError),
    NoPortSpecified,
    IoError(std::io::Error),
    SerdeError(serde_json::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Port(e) => write!(f, "{e}"),
            Self::Write(e) => write!(f, "{e}"),
            Self::InvalidInput(e) => write!(f, "Invalid input: {e}"),
            Self::NoPortSpecified => write!(
                f,
                "No serial port specified. Pass --port or set serial.port in the config file."
            ),
            Self::IoError(e) => write!(f, "An I/O error occurred: {e}"),
            Self::SerdeError(e) => write!(f, "A serialization error occurred: {e}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Port(e) => Some(e),
            Self::Write(e) => Some(e),
            Self::InvalidInput(e) => Some(e),
            Self::NoPortSpecified => None,
            Self::IoError(e) => Some(e),
            Self::SerdeError(e) => Some(e),
        }
    }
}

impl AppError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::NoPortSpecified | Self::InvalidInput(_) => 2,
            Self::Port(_) => 3,
            Self::Write(_) => 4,
            Self::IoError(_) | Self::SerdeError(_) => 1,
        }
    }
}

// Implement `From` conversions to allow the `?` operator to work seamlessly.
impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<PortError> for AppError {
    fn from(err: PortError) -> Self {
        AppError::Port(err)
    }
}

impl From<WriteError> for AppError {
    fn from(err: WriteError) -> Self {
        AppError::Write(err)
    }
}

impl From<CodecError> for AppError {
    fn from(err: CodecError) -> Self {
        AppError::InvalidInput(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerdeError(err)
    }
}
