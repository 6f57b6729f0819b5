//! Port abstraction layer for serial communication.
//!
//! Blocking adapters (`SyncSerialPort`, `MockSerialPort`) sit under the
//! `SerialPortAdapter` trait; the writer talks to cloneable `PortHandle`s.

pub mod error;
pub mod handle;
pub mod mock;
pub mod sync_port;
pub mod traits;

#[cfg(feature = "async-serial")]
pub mod async_port;

pub use error::PortError;
pub use handle::SharedPort;
pub use mock::MockSerialPort;
pub use sync_port::*;
pub use traits::*;

#[cfg(feature = "async-serial")]
pub use async_port::TokioPortHandle;
