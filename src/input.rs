//! Line-oriented input that feeds both writer sources.
//!
//! Each line read is either a `:port NAME` command, which opens a port and
//! pushes its handle onto the port source, or payload that is decoded into a
//! buffer for the buffer source.

use crate::codec::{decode_line, InputFormat};
use crate::port::{PortError, PortHandle};
use crate::Buffer;
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Prefix of the port switch command.
pub const PORT_COMMAND: &str = ":port ";

/// How input lines are interpreted.
#[derive(Debug, Clone)]
pub struct InputSettings {
    pub format: InputFormat,
    /// Bytes appended to text lines
    pub terminator: Vec<u8>,
    /// Recognise `:port NAME` lines
    pub commands: bool,
}

/// Counts reported when the pump stops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PumpSummary {
    pub lines: u64,
    pub buffers: u64,
    pub ports_opened: u64,
    pub rejected: u64,
}

/// Read `reader` to EOF, sending buffers and port handles to the writer.
///
/// `open_port` may block; it runs on tokio's blocking pool. Stops early when
/// the buffer receiver has been dropped.
pub async fn pump_lines<R, P, F>(
    reader: R,
    settings: &InputSettings,
    buffers: mpsc::Sender<Buffer>,
    ports: mpsc::UnboundedSender<P>,
    open_port: F,
) -> std::io::Result<PumpSummary>
where
    R: AsyncBufRead + Unpin,
    P: PortHandle + 'static,
    F: Fn(&str) -> Result<P, PortError> + Send + Sync + 'static,
{
    let open_port = Arc::new(open_port);
    let mut summary = PumpSummary::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        summary.lines += 1;
        let line = line.trim_end_matches('\r');

        if settings.commands {
            if let Some(name) = line.strip_prefix(PORT_COMMAND) {
                let name = name.trim();
                // The writer takes a new port ahead of queued buffers, so let
                // the queue drain for the switch to apply from here on.
                wait_for_drain(&buffers).await;
                match open_blocking(&open_port, name).await {
                    Ok(handle) => {
                        info!("Opened {}", handle.name());
                        summary.ports_opened += 1;
                        if ports.send(handle).is_err() {
                            debug!("Writer stopped, ending input");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Could not open {}: {}", name, e);
                        summary.rejected += 1;
                    }
                }
                continue;
            }
        }

        match decode_line(line, settings.format, &settings.terminator) {
            Ok(Some(buffer)) => {
                if buffers.send(buffer).await.is_err() {
                    debug!("Writer stopped, ending input");
                    break;
                }
                summary.buffers += 1;
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Skipping line {}: {}", summary.lines, e);
                summary.rejected += 1;
            }
        }
    }

    Ok(summary)
}

async fn wait_for_drain(buffers: &mpsc::Sender<Buffer>) {
    // Every slot can only be reserved once the queue is empty. A closed
    // channel errors out, which also means there is nothing left to wait for.
    let _ = buffers.reserve_many(buffers.max_capacity()).await;
}

async fn open_blocking<P, F>(open_port: &Arc<F>, name: &str) -> Result<P, PortError>
where
    P: PortHandle + 'static,
    F: Fn(&str) -> Result<P, PortError> + Send + Sync + 'static,
{
    let open_port = Arc::clone(open_port);
    let name = name.to_string();
    tokio::task::spawn_blocking(move || open_port(&name))
        .await
        .map_err(|e| PortError::Io(std::io::Error::other(e)))?
}
