//! Synchronous serial port implementation.
//!
//! Wraps the `serialport` crate's `SerialPort` trait with our own
//! `SerialPortAdapter` trait so real and mock ports share one write path.

use super::error::PortError;
use super::traits::{PortConfiguration, SerialPortAdapter};
use serde::Serialize;
use std::io::Write;

/// Synchronous serial port implementation wrapping `serialport::SerialPort`.
pub struct SyncSerialPort {
    /// The underlying serial port implementation.
    port: Box<dyn serialport::SerialPort>,
    /// The port name/path for identification.
    name: String,
}

impl SyncSerialPort {
    /// Open a serial port with the given configuration.
    ///
    /// # Arguments
    /// * `port_name` - The system path to the serial port (e.g., "/dev/ttyUSB0" or "COM3")
    /// * `config` - Configuration parameters for the port
    ///
    /// # Example
    /// ```no_run
    /// use serial_byte_writer::port::{SyncSerialPort, PortConfiguration};
    ///
    /// let config = PortConfiguration::default();
    /// let port = SyncSerialPort::open("/dev/ttyUSB0", &config)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(port_name: &str, config: &PortConfiguration) -> Result<Self, PortError> {
        let port = serialport::new(port_name, config.baud_rate)
            .data_bits(config.data_bits.into())
            .flow_control(config.flow_control.into())
            .parity(config.parity.into())
            .stop_bits(config.stop_bits.into())
            .timeout(config.timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => PortError::not_found(port_name),
                serialport::ErrorKind::InvalidInput => PortError::config(e.to_string()),
                _ => PortError::Serial(e),
            })?;

        tracing::debug!(port = port_name, baud = config.baud_rate, "opened serial port");

        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }
}

impl SerialPortAdapter for SyncSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.port.write(data).map_err(|e| match e.kind() {
            std::io::ErrorKind::TimedOut => PortError::timeout(self.port.timeout()),
            _ => PortError::Io(e),
        })
    }

    fn flush(&mut self) -> Result<(), PortError> {
        self.port.flush().map_err(PortError::Io)
    }

    fn name(&self) -> &str {
        &self.name
    }

}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate())
            .finish()
    }
}

/// A serial port found on the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortListing {
    pub name: String,
    pub kind: String,
}

/// List the serial ports available on this machine.
pub fn list_ports() -> Result<Vec<PortListing>, PortError> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| PortListing {
            kind: describe_port_type(&p.port_type),
            name: p.port_name,
        })
        .collect())
}

fn describe_port_type(port_type: &serialport::SerialPortType) -> String {
    match port_type {
        serialport::SerialPortType::UsbPort(info) => match &info.product {
            Some(product) => format!("usb {:04x}:{:04x} {}", info.vid, info.pid, product),
            None => format!("usb {:04x}:{:04x}", info.vid, info.pid),
        },
        serialport::SerialPortType::PciPort => "pci".to_string(),
        serialport::SerialPortType::BluetoothPort => "bluetooth".to_string(),
        serialport::SerialPortType::Unknown => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_not_found_error() {
        let config = PortConfiguration::default();
        let result = SyncSerialPort::open("/dev/nonexistent_port_12345", &config);

        match result {
            Err(PortError::NotFound(name)) => assert!(name.contains("nonexistent")),
            Err(PortError::Serial(_)) | Err(PortError::Io(_)) => {}
            other => panic!("Expected open failure, got: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_describe_port_type() {
        assert_eq!(describe_port_type(&serialport::SerialPortType::PciPort), "pci");
        assert_eq!(
            describe_port_type(&serialport::SerialPortType::Unknown),
            "unknown"
        );
    }
}
