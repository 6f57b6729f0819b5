//! Forwarding of byte buffers to the most recently produced serial port.
//!
//! The writer joins two sources: a stream of buffers and a stream of port
//! handles. Each buffer is written in full to the current handle and then
//! re-emitted unchanged, so writers can be chained into further processing.
//!
//! # Architecture
//!
//! ```text
//! port source ───(handle)───┐
//!                           ▼
//! buffer source ──> SerialByteWriter ──write_all──> current PortHandle
//!                           │
//!                           └──> Ok(buffer) | Err(WriteFailure)
//! ```
//!
//! # Behaviour
//!
//! - A buffer that arrives before any handle exists is dropped, never written
//!   and never re-emitted.
//! - A new handle supersedes the previous one for every later buffer. The old
//!   handle is released, not closed. When a handle and a buffer are ready at
//!   the same time, the handle is taken first. A port source that never stops
//!   producing handles still lets a waiting buffer through after a short run
//!   of handles.
//! - One write is in flight at a time; buffers are written in arrival order.
//! - A failed write is emitted as `Err(WriteError::WriteFailure)` and ends the
//!   output stream.
//! - The output ends when the buffer source ends. If the port source ends
//!   without ever producing a handle, nothing can be written and the output
//!   ends as well.
//!
//! # Example
//!
//! ```
//! use futures::{stream, StreamExt};
//! use serial_byte_writer::port::{MockSerialPort, SharedPort};
//! use serial_byte_writer::{Buffer, SerialByteWriter};
//!
//! # tokio_test::block_on(async {
//! let mock = MockSerialPort::new("MOCK0");
//! let ports = stream::iter(vec![SharedPort::new(mock.clone())]);
//! let buffers = stream::iter(vec![Buffer::from(&[0x01u8, 0x02][..])]);
//!
//! let forwarded: Vec<_> = SerialByteWriter::new().attach(buffers, ports).collect().await;
//! assert_eq!(forwarded.len(), 1);
//! assert_eq!(mock.transmitted(), vec![0x01, 0x02]);
//! # });
//! ```

mod error;
mod stats;

pub use error::WriteError;
pub use stats::{StatsHandle, WriterStats};

use crate::port::PortHandle;
use crate::Buffer;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Output of [`SerialByteWriter::attach`].
pub type Forwarded = BoxStream<'static, Result<Buffer, WriteError>>;

/// Writes every incoming buffer to the current serial port.
#[derive(Debug, Default)]
pub struct SerialByteWriter {
    stats: StatsHandle,
    shutdown: Option<watch::Receiver<bool>>,
}

impl SerialByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop forwarding once `shutdown` becomes `true`.
    ///
    /// A write already in flight is finished and its result emitted before
    /// the output ends. Dropping the sender without signalling has no effect.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Handle for reading counters while the output stream runs.
    pub fn stats(&self) -> StatsHandle {
        self.stats.clone()
    }

    /// Start forwarding `buffers` to the latest handle from `ports`.
    ///
    /// Nothing happens until the returned stream is polled.
    pub fn attach<B, S, P>(self, buffers: B, ports: S) -> Forwarded
    where
        B: Stream<Item = Buffer> + Send + 'static,
        S: Stream<Item = P> + Send + 'static,
        P: PortHandle + 'static,
    {
        let pipeline = Pipeline {
            buffers: buffers.boxed(),
            ports: Some(ports.boxed()),
            current: None,
            shutdown: self.shutdown,
            stats: self.stats,
            finished: false,
            ports_in_row: 0,
        };

        stream::unfold(pipeline, Pipeline::step).boxed()
    }
}

/// Forward `buffers` to the latest handle from `ports` with default settings.
pub fn attach<B, S, P>(buffers: B, ports: S) -> Forwarded
where
    B: Stream<Item = Buffer> + Send + 'static,
    S: Stream<Item = P> + Send + 'static,
    P: PortHandle + 'static,
{
    SerialByteWriter::new().attach(buffers, ports)
}

/// Ready ports are taken ahead of buffers, but only this many in a row
/// before the buffer source gets a turn.
const MAX_PORTS_IN_ROW: usize = 16;

enum Event<P> {
    Shutdown,
    Port(Option<P>),
    Buffer(Option<Buffer>),
}

struct Pipeline<P> {
    buffers: BoxStream<'static, Buffer>,
    /// `None` once the port source has ended.
    ports: Option<BoxStream<'static, P>>,
    current: Option<P>,
    shutdown: Option<watch::Receiver<bool>>,
    stats: StatsHandle,
    finished: bool,
    /// Port events taken since the last buffer event.
    ports_in_row: usize,
}

impl<P: PortHandle + 'static> Pipeline<P> {
    async fn step(mut self) -> Option<(Result<Buffer, WriteError>, Self)> {
        loop {
            if self.finished {
                return None;
            }
            // Sources that are always ready would otherwise keep this task
            // from ever returning to the scheduler.
            tokio::task::coop::consume_budget().await;

            let take_ports = self.ports_in_row < MAX_PORTS_IN_ROW;
            let event = tokio::select! {
                biased;
                _ = shutdown_requested(&mut self.shutdown) => Event::Shutdown,
                port = next_port(&mut self.ports), if take_ports => Event::Port(port),
                buffer = self.buffers.next() => Event::Buffer(buffer),
            };
            match event {
                Event::Port(Some(_)) => self.ports_in_row += 1,
                Event::Buffer(_) => self.ports_in_row = 0,
                _ => {}
            }

            match event {
                Event::Shutdown => {
                    debug!("Shutdown requested, stopping serial writer");
                    return None;
                }
                Event::Port(Some(port)) => {
                    match self.current.as_ref() {
                        Some(previous) => {
                            info!("Switching serial writer from {} to {}", previous.name(), port.name())
                        }
                        None => info!("Serial writer attached to {}", port.name()),
                    }
                    self.stats.record_port(port.name());
                    self.current = Some(port);
                }
                Event::Port(None) => {
                    self.ports = None;
                    if self.current.is_none() {
                        debug!("Port source ended before producing a port");
                        return None;
                    }
                    debug!("Port source ended, keeping current port");
                }
                Event::Buffer(None) => {
                    debug!("Buffer source ended");
                    return None;
                }
                Event::Buffer(Some(buffer)) => {
                    let Some(port) = self.current.as_ref() else {
                        debug!("No port available, dropping {} byte buffer", buffer.len());
                        self.stats.record_dropped();
                        continue;
                    };

                    let result = port.write_all(buffer.clone()).await;
                    return match result {
                        Ok(()) => {
                            self.stats.record_forwarded(buffer.len());
                            Some((Ok(buffer), self))
                        }
                        Err(e) => {
                            warn!("Write of {} bytes to {} failed: {}", buffer.len(), port.name(), e);
                            let err = WriteError::failure(port.name(), e);
                            self.finished = true;
                            Some((Err(err), self))
                        }
                    };
                }
            }
        }
    }
}

async fn next_port<P>(ports: &mut Option<BoxStream<'static, P>>) -> Option<P> {
    match ports {
        Some(ports) => ports.next().await,
        None => std::future::pending().await,
    }
}

async fn shutdown_requested(shutdown: &mut Option<watch::Receiver<bool>>) {
    let Some(rx) = shutdown else {
        return std::future::pending().await;
    };

    loop {
        let signalled = *rx.borrow_and_update();
        if signalled {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone without signalling
            return std::future::pending().await;
        }
    }
}
