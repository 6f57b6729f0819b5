//! Core traits for serial port abstraction.
//!
//! Defines the blocking `SerialPortAdapter` trait implemented by real and mock
//! ports, and the async `PortHandle` trait the writer forwards buffers into.

use super::error::PortError;
use crate::Buffer;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration parameters for a serial port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Number of data bits (5, 6, 7, or 8).
    pub data_bits: DataBits,

    /// Flow control mode.
    pub flow_control: FlowControl,

    /// Parity checking mode.
    pub parity: Parity,

    /// Number of stop bits.
    pub stop_bits: StopBits,

    /// Write timeout.
    pub timeout: Duration,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: Duration::from_secs(1),
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Blocking write side of a serial port.
///
/// Implemented by `SyncSerialPort` for real hardware and by `MockSerialPort`
/// for tests. The writer never calls this directly; it goes through a
/// [`PortHandle`] so the blocking call can be moved off the async runtime.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes actually written, which may be fewer than
    /// `data.len()`.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Block until all queued output has been transmitted.
    ///
    /// Ports with nothing to drain may fail with an `Unsupported` I/O error;
    /// [`SharedPort`](super::SharedPort) treats that as a completed write.
    fn flush(&mut self) -> Result<(), PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Write the whole buffer, looping over partial writes.
    ///
    /// Interrupted writes are retried; a write that accepts zero bytes fails
    /// with [`PortError::WriteZero`].
    fn write_all(&mut self, mut data: &[u8]) -> Result<(), PortError> {
        while !data.is_empty() {
            match self.write_bytes(data) {
                Ok(0) => {
                    return Err(PortError::WriteZero {
                        remaining: data.len(),
                    })
                }
                Ok(n) => data = &data[n..],
                Err(PortError::Io(e)) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// A current-port reference the writer forwards buffers into.
///
/// Handles are opaque: the producer of a handle owns the port lifecycle, and
/// the writer only keeps a reference while the handle is current. Dropping
/// that reference must never close the port.
///
/// `write_all` must not be aborted by dropping its future: once started, the
/// write runs to completion or failure, since a partial write on a serial line
/// cannot be rolled back.
#[async_trait]
pub trait PortHandle: Send + Sync + std::fmt::Debug {
    /// Name of the underlying port, used in logs and errors.
    fn name(&self) -> &str;

    /// Transmit the entire buffer, in order.
    ///
    /// `Ok` means every byte was handed to the device and, where the port
    /// supports it, flushed. A failed flush is reported like a failed write.
    async fn write_all(&self, buffer: Buffer) -> Result<(), PortError>;
}
