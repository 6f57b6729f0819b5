//! Cloneable port handles for blocking serial ports.
//!
//! A `SharedPort` is what a port source hands to the writer. The source keeps
//! its own clone and stays responsible for closing the port; the writer's
//! clone is simply dropped when a newer handle supersedes it.

use super::error::PortError;
use super::sync_port::SyncSerialPort;
use super::traits::{PortConfiguration, PortHandle, SerialPortAdapter};
use crate::Buffer;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle over a blocking `SerialPortAdapter`.
///
/// Writes run on tokio's blocking pool under the port mutex, so only one
/// buffer is ever on the wire per port and a write that has started is not
/// cut short when the caller stops waiting for it.
///
/// Each write is followed by a flush. A flush failure is a write failure,
/// except for ports that report flushing as unsupported.
#[derive(Clone)]
pub struct SharedPort {
    inner: Arc<Mutex<Box<dyn SerialPortAdapter>>>,
    name: Arc<str>,
}

impl SharedPort {
    /// Wrap an adapter in a shareable handle.
    pub fn new(port: impl SerialPortAdapter + 'static) -> Self {
        let name: Arc<str> = Arc::from(port.name());
        Self {
            inner: Arc::new(Mutex::new(Box::new(port))),
            name,
        }
    }

    /// Open a real serial port and wrap it.
    pub fn open(port_name: &str, config: &PortConfiguration) -> Result<Self, PortError> {
        SyncSerialPort::open(port_name, config).map(Self::new)
    }

    /// Number of live clones of this handle.
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

#[async_trait]
impl PortHandle for SharedPort {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write_all(&self, buffer: Buffer) -> Result<(), PortError> {
        let inner = Arc::clone(&self.inner);

        tokio::task::spawn_blocking(move || {
            let mut port = inner.lock();
            port.write_all(&buffer)?;
            match port.flush() {
                Err(PortError::Io(e)) if e.kind() == std::io::ErrorKind::Unsupported => {
                    tracing::trace!("{} cannot flush, write already complete", port.name());
                    Ok(())
                }
                result => result,
            }
        })
        .await
        .map_err(|e| PortError::Io(std::io::Error::other(e)))?
    }
}

impl std::fmt::Debug for SharedPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedPort")
            .field("name", &self.name)
            .field("holders", &self.holders())
            .finish()
    }
}
