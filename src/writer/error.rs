//! Errors surfaced on the writer's output stream.

use crate::port::PortError;
use thiserror::Error;

/// Terminal error emitted by [`SerialByteWriter`](super::SerialByteWriter).
#[derive(Debug, Error)]
pub enum WriteError {
    /// Writing a buffer to the current port failed.
    #[error("Write to {port} failed: {source}")]
    WriteFailure {
        port: String,
        #[source]
        source: PortError,
    },
}

impl WriteError {
    /// Create a WriteFailure for the named port.
    pub fn failure(port: impl Into<String>, source: PortError) -> Self {
        Self::WriteFailure {
            port: port.into(),
            source,
        }
    }

    /// Name of the port the failed write was addressed to.
    pub fn port(&self) -> &str {
        match self {
            Self::WriteFailure { port, .. } => port,
        }
    }
}
