//! Serial Byte Writer Library
//!
//! Forwards a stream of byte buffers to the most recently produced serial
//! port handle and re-emits every buffer after it has been written.
//!
//! # Modules
//!
//! - `writer`: The `SerialByteWriter` stream combinator
//! - `port`: Port abstraction layer (real, mock, and async handles)
//! - `codec`: Turns input lines into buffers
//! - `input`: Pumps lines into the buffer and port sources
//! - `config`: Configuration management with TOML support
//! - `error`: Unified application error handling

pub mod codec;
pub mod config;
pub mod error;
pub mod input;
pub mod port;
pub mod writer;

/// An immutable byte buffer. Cloning shares the allocation.
pub type Buffer = std::sync::Arc<[u8]>;

// Re-export commonly used types for convenience
pub use codec::{decode_line, CodecError, InputFormat};
pub use error::AppError;
pub use port::{
    MockSerialPort, PortConfiguration, PortError, PortHandle, SerialPortAdapter, SharedPort,
    SyncSerialPort,
};
pub use writer::{attach, Forwarded, SerialByteWriter, StatsHandle, WriteError, WriterStats};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
