//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that records every write without requiring
//! hardware, and can be told to accept partial writes, time out, or fail
//! after a number of writes.

use super::error::PortError;
use super::traits::SerialPortAdapter;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Inner state of the mock port, protected by a mutex for interior mutability.
#[derive(Debug, Default)]
struct MockPortState {
    /// Log of the bytes accepted by each `write_bytes` call.
    write_log: Vec<Vec<u8>>,
    /// Whether the next write should time out.
    should_timeout: bool,
    /// Remaining successful writes before every write fails.
    fail_after: Option<usize>,
    /// Upper bound on bytes accepted per `write_bytes` call.
    max_chunk: Option<usize>,
    /// Whether the port has been disconnected.
    disconnected: bool,
    /// Number of flush calls.
    flushes: usize,
    /// Whether `flush` reports that it is not supported.
    flush_unsupported: bool,
    /// Duration reported by simulated timeouts.
    timeout: Duration,
}

/// Mock serial port implementation for testing.
///
/// Clones share state, so a test can keep one clone for inspection while
/// another is handed to a [`SharedPort`](super::SharedPort).
///
/// # Example
/// ```
/// use serial_byte_writer::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.write_all(b"Response").unwrap();
///
/// let writes = port.get_write_log();
/// assert_eq!(writes.len(), 1);
/// assert_eq!(writes[0], b"Response");
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    /// The port name/identifier.
    name: String,
    /// The internal state, wrapped in Arc<Mutex<>> for interior mutability.
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_secs(1),
                ..Default::default()
            })),
        }
    }

    /// Get a copy of all data written to the port, one entry per write call.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        let state = self.state.lock();
        state.write_log.clone()
    }

    /// All transmitted bytes, concatenated in order.
    pub fn transmitted(&self) -> Vec<u8> {
        let state = self.state.lock();
        state.write_log.concat()
    }

    /// Number of write calls that accepted data.
    pub fn write_count(&self) -> usize {
        let state = self.state.lock();
        state.write_log.len()
    }

    /// Clear the write log.
    pub fn clear_write_log(&mut self) {
        let mut state = self.state.lock();
        state.write_log.clear();
    }

    /// Set whether the next write operation should time out.
    pub fn set_should_timeout(&mut self, should_timeout: bool) {
        let mut state = self.state.lock();
        state.should_timeout = should_timeout;
    }

    /// Let `n` more writes succeed, then fail every write with a broken pipe.
    pub fn fail_after(&mut self, n: usize) {
        let mut state = self.state.lock();
        state.fail_after = Some(n);
    }

    /// Cap the number of bytes a single `write_bytes` call accepts.
    pub fn set_max_chunk(&mut self, max_chunk: Option<usize>) {
        let mut state = self.state.lock();
        state.max_chunk = max_chunk;
    }

    /// Simulate the device being unplugged.
    pub fn disconnect(&mut self) {
        let mut state = self.state.lock();
        state.disconnected = true;
    }

    /// Make `flush` fail with an `Unsupported` I/O error, as ports without an
    /// output queue do.
    pub fn set_flush_unsupported(&mut self, unsupported: bool) {
        let mut state = self.state.lock();
        state.flush_unsupported = unsupported;
    }

    /// Number of times `flush` was called.
    ///
    /// Unsupported flushes are not counted.
    pub fn flush_count(&self) -> usize {
        let state = self.state.lock();
        state.flushes
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        if state.disconnected {
            return Err(PortError::NotOpen);
        }

        if state.should_timeout {
            state.should_timeout = false;
            return Err(PortError::timeout(state.timeout));
        }

        match state.fail_after {
            Some(0) => {
                return Err(PortError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "mock port failure",
                )))
            }
            Some(ref mut remaining) => *remaining -= 1,
            None => {}
        }

        let accepted = state.max_chunk.map_or(data.len(), |max| max.min(data.len()));
        if accepted > 0 {
            state.write_log.push(data[..accepted].to_vec());
        }

        Ok(accepted)
    }

    fn flush(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        if state.disconnected {
            return Err(PortError::NotOpen);
        }
        if state.flush_unsupported {
            return Err(PortError::Io(std::io::Error::from(
                std::io::ErrorKind::Unsupported,
            )));
        }
        state.flushes += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("writes", &self.write_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_logging() {
        let mut port = MockSerialPort::new("MOCK0");
        port.write_bytes(b"Test1").unwrap();
        port.write_bytes(b"Test2").unwrap();

        let log = port.get_write_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], b"Test1");
        assert_eq!(log[1], b"Test2");
    }

    #[test]
    fn test_clones_share_state() {
        let port = MockSerialPort::new("MOCK0");
        let mut writer = port.clone();
        writer.write_bytes(b"shared").unwrap();
        assert_eq!(port.transmitted(), b"shared");
    }

    #[test]
    fn test_timeout_simulation() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_should_timeout(true);

        let result = port.write_bytes(b"x");
        match result {
            Err(PortError::Timeout(d)) => assert_eq!(d, Duration::from_secs(1)),
            other => panic!("Expected timeout, got {:?}", other),
        }

        // Only the next write times out
        assert_eq!(port.write_bytes(b"y").unwrap(), 1);
    }

    #[test]
    fn test_fail_after() {
        let mut port = MockSerialPort::new("MOCK0");
        port.fail_after(1);

        assert!(port.write_bytes(b"ok").is_ok());
        assert!(matches!(port.write_bytes(b"no"), Err(PortError::Io(_))));
        assert!(matches!(port.write_bytes(b"no"), Err(PortError::Io(_))));
        assert_eq!(port.get_write_log(), vec![b"ok".to_vec()]);
    }

    #[test]
    fn test_disconnect() {
        let mut port = MockSerialPort::new("MOCK0");
        port.disconnect();
        assert!(matches!(port.write_bytes(b"x"), Err(PortError::NotOpen)));
        assert!(matches!(port.flush(), Err(PortError::NotOpen)));
    }

    #[test]
    fn test_clear_write_log() {
        let mut port = MockSerialPort::new("MOCK0");
        port.write_bytes(b"abc").unwrap();
        port.clear_write_log();
        assert_eq!(port.write_count(), 0);
    }
}
