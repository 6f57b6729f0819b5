//! Shared test utilities for writer integration tests.
//!
//! Provides channel-driven sources so tests control exactly when buffers and
//! port handles arrive relative to each other.

#![allow(dead_code)]

use futures::StreamExt;
use serial_byte_writer::port::{MockSerialPort, SharedPort};
use serial_byte_writer::{Buffer, Forwarded, SerialByteWriter, StatsHandle, WriteError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Build a buffer from a byte slice.
pub fn buf(bytes: &[u8]) -> Buffer {
    Buffer::from(bytes)
}

/// A mock port plus a handle sharing its state.
pub fn mock_port(name: &str) -> (MockSerialPort, SharedPort) {
    let mock = MockSerialPort::new(name);
    let handle = SharedPort::new(mock.clone());
    (mock, handle)
}

/// A running writer fed by test-controlled channels.
pub struct Harness {
    pub buffers: mpsc::UnboundedSender<Buffer>,
    pub ports: mpsc::UnboundedSender<SharedPort>,
    pub output: Forwarded,
    pub stats: StatsHandle,
}

impl Harness {
    pub fn new() -> Self {
        let (buf_tx, buf_rx) = mpsc::unbounded_channel();
        let (port_tx, port_rx) = mpsc::unbounded_channel();
        let writer = SerialByteWriter::new();
        let stats = writer.stats();
        let output = writer.attach(
            UnboundedReceiverStream::new(buf_rx),
            UnboundedReceiverStream::new(port_rx),
        );

        Self {
            buffers: buf_tx,
            ports: port_tx,
            output,
            stats,
        }
    }

    pub fn send_port(&self, port: SharedPort) {
        self.ports.send(port).expect("writer dropped port receiver");
    }

    pub fn send(&self, bytes: &[u8]) {
        self.buffers.send(buf(bytes)).expect("writer dropped buffer receiver");
    }

    /// Wait for the next output item.
    pub async fn next(&mut self) -> Option<Result<Buffer, WriteError>> {
        tokio::time::timeout(Duration::from_secs(5), self.output.next())
            .await
            .expect("writer produced no output within 5s")
    }

    /// Poll the writer briefly, asserting it emits nothing.
    pub async fn expect_idle(&mut self) {
        let polled = tokio::time::timeout(Duration::from_millis(20), self.output.next()).await;
        assert!(polled.is_err(), "expected no output, got {:?}", polled);
    }

    /// Send a buffer and wait for it to come back out.
    pub async fn forward(&mut self, bytes: &[u8]) -> Buffer {
        self.send(bytes);
        self.next()
            .await
            .expect("output ended early")
            .expect("write failed")
    }

    /// End the buffer source and collect whatever remains.
    pub async fn finish(mut self) -> Vec<Result<Buffer, WriteError>> {
        drop(self.buffers);
        let mut rest = Vec::new();
        while let Some(item) = tokio::time::timeout(Duration::from_secs(5), self.output.next())
            .await
            .expect("writer did not finish within 5s")
        {
            rest.push(item);
        }
        rest
    }
}
