use bytes::Bytes;
use tokio::sync::mpsc;

use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::FrameSink;

/// Bridges a blocking session thread to an async response body.
///
/// Must be used from a blocking thread (`spawn_blocking`), never from inside
/// an async task.
pub struct ChannelSink {
    tx: mpsc::Sender<Bytes>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Bytes>) -> Self {
        Self { tx }
    }
}

impl FrameSink for ChannelSink {
    fn write_part(&mut self, part: Bytes) -> Result<()> {
        self.tx
            .blocking_send(part)
            .map_err(|_| DomainError::ClientDisconnected)
    }
}
