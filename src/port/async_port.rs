//! Async serial port handles using tokio-serial.
//!
//! Gated behind the `async-serial` feature flag.

use super::error::PortError;
use super::traits::{DataBits, FlowControl, Parity, PortConfiguration, PortHandle, StopBits};
use crate::Buffer;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Cloneable handle over a native async `tokio_serial::SerialStream`.
///
/// Each write runs in its own spawned task, so a write survives the caller
/// dropping the future, and the async mutex keeps writes to one port serialized.
#[derive(Clone)]
pub struct TokioPortHandle {
    inner: Arc<Mutex<tokio_serial::SerialStream>>,
    name: Arc<str>,
}

impl TokioPortHandle {
    /// Open a serial port with async I/O support.
    ///
    /// # Example
    /// ```no_run
    /// use serial_byte_writer::port::{TokioPortHandle, PortConfiguration};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut config = PortConfiguration::default();
    /// config.baud_rate = 115200;
    /// let port = TokioPortHandle::open("/dev/ttyUSB0", &config)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(port_name: &str, config: &PortConfiguration) -> Result<Self, PortError> {
        let builder = tokio_serial::new(port_name, config.baud_rate)
            .data_bits(convert_data_bits(config.data_bits))
            .flow_control(convert_flow_control(config.flow_control))
            .parity(convert_parity(config.parity))
            .stop_bits(convert_stop_bits(config.stop_bits))
            .timeout(config.timeout);

        let inner = tokio_serial::SerialStream::open(&builder).map_err(|e| match e.kind {
            tokio_serial::ErrorKind::NoDevice => PortError::not_found(port_name),
            tokio_serial::ErrorKind::InvalidInput => PortError::config(e.to_string()),
            _ => PortError::Io(std::io::Error::other(e.to_string())),
        })?;

        tracing::debug!(port = port_name, baud = config.baud_rate, "opened async serial port");

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
            name: Arc::from(port_name),
        })
    }
}

#[async_trait]
impl PortHandle for TokioPortHandle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write_all(&self, buffer: Buffer) -> Result<(), PortError> {
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            let mut stream = inner.lock().await;
            stream.write_all(&buffer).await?;
            stream.flush().await?;
            Ok::<(), PortError>(())
        })
        .await
        .map_err(|e| PortError::Io(std::io::Error::other(e)))?
    }
}

impl std::fmt::Debug for TokioPortHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioPortHandle")
            .field("name", &self.name)
            .finish()
    }
}

// Helper conversion functions for tokio-serial types

fn convert_data_bits(bits: DataBits) -> tokio_serial::DataBits {
    match bits {
        DataBits::Five => tokio_serial::DataBits::Five,
        DataBits::Six => tokio_serial::DataBits::Six,
        DataBits::Seven => tokio_serial::DataBits::Seven,
        DataBits::Eight => tokio_serial::DataBits::Eight,
    }
}

fn convert_flow_control(flow: FlowControl) -> tokio_serial::FlowControl {
    match flow {
        FlowControl::None => tokio_serial::FlowControl::None,
        FlowControl::Software => tokio_serial::FlowControl::Software,
        FlowControl::Hardware => tokio_serial::FlowControl::Hardware,
    }
}

fn convert_parity(parity: Parity) -> tokio_serial::Parity {
    match parity {
        Parity::None => tokio_serial::Parity::None,
        Parity::Odd => tokio_serial::Parity::Odd,
        Parity::Even => tokio_serial::Parity::Even,
    }
}

fn convert_stop_bits(stop_bits: StopBits) -> tokio_serial::StopBits {
    match stop_bits {
        StopBits::One => tokio_serial::StopBits::One,
        StopBits::Two => tokio_serial::StopBits::Two,
    }
}
