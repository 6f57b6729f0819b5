//! Counters describing what a running writer has done.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Point-in-time snapshot of writer activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriterStats {
    /// Buffers written and re-emitted.
    pub buffers_forwarded: u64,
    /// Total bytes transmitted across all ports.
    pub bytes_written: u64,
    /// Buffers that arrived before any port was available.
    pub buffers_dropped: u64,
    /// Port handles received from the port source.
    pub ports_attached: u64,
    /// Name of the current port, if any.
    pub current_port: Option<String>,
}

/// Shared, cloneable view of a writer's counters.
///
/// The writer updates it as the output stream is polled; callers can read a
/// snapshot at any time.
#[derive(Debug, Clone, Default)]
pub struct StatsHandle {
    inner: Arc<Mutex<WriterStats>>,
}

impl StatsHandle {
    /// Copy out the current counters.
    pub fn snapshot(&self) -> WriterStats {
        self.inner.lock().clone()
    }

    pub(crate) fn record_forwarded(&self, len: usize) {
        let mut stats = self.inner.lock();
        stats.buffers_forwarded += 1;
        stats.bytes_written += len as u64;
    }

    pub(crate) fn record_dropped(&self) {
        self.inner.lock().buffers_dropped += 1;
    }

    pub(crate) fn record_port(&self, name: &str) {
        let mut stats = self.inner.lock();
        stats.ports_attached += 1;
        stats.current_port = Some(name.to_string());
    }
}
