use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use super::ChannelSink;
use crate::domain::entities::{SnapshotFetcher, SourceHandle, StreamSession};
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{FrameCodec, MetricsReporter, SourceOpener, SourceRegistry};
use crate::domain::value_objects::{EncodedFrame, SourceId, SourceKind, StreamConfig};

/// Parts buffered between the session thread and the response body. One
/// frame in flight keeps the decoder paced by the client.
const STREAM_BUFFER_PARTS: usize = 1;

/// Application service orchestrating streams and snapshots
pub struct StreamingService {
    registry: Arc<dyn SourceRegistry>,
    opener: Arc<dyn SourceOpener>,
    codec: Arc<dyn FrameCodec>,
    metrics: Arc<dyn MetricsReporter>,
    snapshots: Arc<SnapshotFetcher>,
    config: StreamConfig,
}

impl StreamingService {
    pub fn new(
        registry: Arc<dyn SourceRegistry>,
        opener: Arc<dyn SourceOpener>,
        codec: Arc<dyn FrameCodec>,
        metrics: Arc<dyn MetricsReporter>,
        config: StreamConfig,
    ) -> Result<Self> {
        config.validate()?;

        let snapshots = Arc::new(SnapshotFetcher::new(
            opener.clone(),
            codec.clone(),
            config.clone(),
        ));

        Ok(Self {
            registry,
            opener,
            codec,
            metrics,
            snapshots,
            config,
        })
    }

    /// Start a stream session (use case).
    ///
    /// The source is opened before anything is returned, so unknown ids and
    /// unreachable sources still fail as ordinary errors. Once this returns,
    /// the session runs on its own blocking thread and reports only through
    /// logs and metrics; dropping the receiver stops it at the next write.
    pub async fn start_stream(
        &self,
        kind: SourceKind,
        id: SourceId,
    ) -> Result<mpsc::Receiver<Bytes>> {
        let locator = self.registry.locate(kind, id).await?;

        let opener = self.opener.clone();
        let config = self.config.clone();
        let handle = tokio::task::spawn_blocking(move || {
            SourceHandle::open(opener.as_ref(), kind, &locator, &config)
        })
        .await
        .map_err(|e| DomainError::Open(format!("open task failed: {}", e)))??;

        let session = StreamSession::new(
            handle,
            self.codec.clone(),
            self.config.retry_policy().clone(),
            self.metrics.clone(),
        );

        tracing::debug!(session_id = %session.id(), kind = %kind, id = %id, "Spawning stream session");

        let session_id = session.id().to_string();
        let (tx, rx) = mpsc::channel(STREAM_BUFFER_PARTS);
        let task = tokio::task::spawn_blocking(move || {
            let mut sink = ChannelSink::new(tx);
            session.run(&mut sink)
        });

        // A panicking session never reports itself as stopped
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            match task.await {
                Ok(report) => {
                    tracing::debug!(session_id = %report.session_id, "Stream session joined")
                }
                Err(e) if e.is_panic() => {
                    tracing::error!(session_id = %session_id, kind = %kind, "Stream session panicked: {}", e);
                    metrics.report_session_aborted(kind);
                }
                Err(e) => {
                    tracing::warn!(session_id = %session_id, "Stream session cancelled: {}", e)
                }
            }
        });

        Ok(rx)
    }

    /// Fetch one encoded frame (use case)
    pub async fn snapshot(&self, kind: SourceKind, id: SourceId) -> Result<EncodedFrame> {
        let locator = self.registry.locate(kind, id).await?;

        let snapshots = self.snapshots.clone();
        let result = tokio::task::spawn_blocking(move || snapshots.fetch(kind, &locator))
            .await
            .map_err(|e| DomainError::Decode(format!("snapshot task failed: {}", e)))
            .and_then(|fetched| fetched);

        self.metrics.report_snapshot(kind, result.is_ok());

        match &result {
            Ok(frame) => tracing::debug!(kind = %kind, id = %id, bytes = frame.len(), "Snapshot served"),
            Err(e) => tracing::warn!(kind = %kind, id = %id, "Snapshot failed: {}", e),
        }

        result
    }
}
