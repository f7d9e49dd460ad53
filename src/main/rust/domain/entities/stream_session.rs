use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use uuid::Uuid;

use super::SourceHandle;
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{DecodeOutcome, FrameCodec, FrameSink, MetricsReporter};
use crate::domain::value_objects::{multipart, RetryPolicy, SourceKind};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Starting,
    Streaming,
    Stopped(Termination),
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    EndOfStream,
    ClientDisconnected,
    RetriesExhausted,
    Fault(String),
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub session_id: String,
    pub kind: SourceKind,
    pub frames_sent: u64,
    pub bytes_sent: u64,
    pub transient_failures: u64,
    pub termination: Termination,
    pub duration: Duration,
}

/// Lazy sequence of multipart parts pulled from a handle.
///
/// Transient camera failures are absorbed here (with backoff) and never
/// surface as items. The sequence ends after `EndOfStream` or after the
/// first error item.
pub struct MjpegParts<'a> {
    handle: &'a mut SourceHandle,
    codec: &'a dyn FrameCodec,
    retry_policy: &'a RetryPolicy,
    consecutive_failures: u32,
    transient_failures: u64,
    delay: Duration,
    retries_exhausted: bool,
    finished: bool,
}

impl<'a> MjpegParts<'a> {
    pub fn new(
        handle: &'a mut SourceHandle,
        codec: &'a dyn FrameCodec,
        retry_policy: &'a RetryPolicy,
    ) -> Self {
        Self {
            handle,
            codec,
            retry_policy,
            consecutive_failures: 0,
            transient_failures: 0,
            delay: retry_policy.backoff().initial_delay(),
            retries_exhausted: false,
            finished: false,
        }
    }

    pub fn transient_failures(&self) -> u64 {
        self.transient_failures
    }

    pub fn retries_exhausted(&self) -> bool {
        self.retries_exhausted
    }

    fn next_part(&mut self) -> Option<Result<Bytes>> {
        loop {
            match self.handle.read() {
                Ok(DecodeOutcome::Frame(frame)) => {
                    self.consecutive_failures = 0;
                    self.delay = self.retry_policy.backoff().initial_delay();
                    return Some(
                        self.codec
                            .encode(&frame)
                            .map(|encoded| multipart::frame_part(&encoded)),
                    );
                }
                Ok(DecodeOutcome::EndOfStream) => return None,
                Err(DomainError::Decode(reason)) if self.handle.kind().is_live() => {
                    self.consecutive_failures += 1;
                    self.transient_failures += 1;

                    if self.retry_policy.is_exhausted(self.consecutive_failures) {
                        self.retries_exhausted = true;
                        return Some(Err(DomainError::Decode(format!(
                            "{} consecutive read failures, last: {}",
                            self.consecutive_failures, reason
                        ))));
                    }

                    tracing::debug!(
                        locator = %self.handle.locator(),
                        attempt = self.consecutive_failures,
                        "Transient read failure, retrying: {}",
                        reason
                    );

                    if !self.delay.is_zero() {
                        std::thread::sleep(self.delay);
                    }
                    self.delay = self.retry_policy.backoff().next_delay(self.delay);
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl Iterator for MjpegParts<'_> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let item = self.next_part();
        if !matches!(item, Some(Ok(_))) {
            self.finished = true;
        }
        item
    }
}

/// Drives one handle onto one consumer until the stream ends, the consumer
/// goes away, or something breaks.
pub struct StreamSession {
    id: String,
    handle: SourceHandle,
    codec: Arc<dyn FrameCodec>,
    retry_policy: RetryPolicy,
    metrics: Arc<dyn MetricsReporter>,
    started_at: Instant,
    state: SessionState,
    frames_sent: u64,
    bytes_sent: u64,
    transient_failures: u64,
}

impl StreamSession {
    pub fn new(
        handle: SourceHandle,
        codec: Arc<dyn FrameCodec>,
        retry_policy: RetryPolicy,
        metrics: Arc<dyn MetricsReporter>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            handle,
            codec,
            retry_policy,
            metrics,
            started_at: Instant::now(),
            state: SessionState::Starting,
            frames_sent: 0,
            bytes_sent: 0,
            transient_failures: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn kind(&self) -> SourceKind {
        self.handle.kind()
    }

    /// Run to completion. The handle is closed before this returns, whatever
    /// the exit path; a panic still releases it through `Drop`.
    pub fn run(mut self, sink: &mut dyn FrameSink) -> SessionReport {
        self.state = SessionState::Streaming;
        self.metrics.report_session_started(self.handle.kind());

        tracing::info!(
            session_id = %self.id,
            kind = %self.handle.kind(),
            locator = %self.handle.locator(),
            "Stream session started"
        );

        let termination = self.pump(sink);
        self.handle.close();
        self.state = SessionState::Stopped(termination.clone());

        let report = SessionReport {
            session_id: self.id.clone(),
            kind: self.handle.kind(),
            frames_sent: self.frames_sent,
            bytes_sent: self.bytes_sent,
            transient_failures: self.transient_failures,
            termination,
            duration: self.started_at.elapsed(),
        };

        match &report.termination {
            Termination::Fault(reason) => tracing::error!(
                session_id = %report.session_id,
                frames = report.frames_sent,
                "Stream session aborted: {}",
                reason
            ),
            Termination::RetriesExhausted => tracing::warn!(
                session_id = %report.session_id,
                frames = report.frames_sent,
                failures = report.transient_failures,
                "Stream session gave up on unresponsive source"
            ),
            other => tracing::info!(
                session_id = %report.session_id,
                frames = report.frames_sent,
                bytes = report.bytes_sent,
                termination = ?other,
                "Stream session finished"
            ),
        }

        self.metrics.report_session_stopped(&report);
        report
    }

    fn pump(&mut self, sink: &mut dyn FrameSink) -> Termination {
        let mut parts = MjpegParts::new(&mut self.handle, self.codec.as_ref(), &self.retry_policy);

        loop {
            let seen = parts.transient_failures();
            let next = parts.next();
            for _ in seen..parts.transient_failures() {
                self.metrics.report_transient_failure();
            }
            self.transient_failures = parts.transient_failures();

            let part = match next {
                None => return Termination::EndOfStream,
                Some(Ok(part)) => part,
                Some(Err(_)) if parts.retries_exhausted() => return Termination::RetriesExhausted,
                Some(Err(e)) => return Termination::Fault(e.to_string()),
            };

            let len = part.len();
            match sink.write_part(part) {
                Ok(()) => {
                    self.frames_sent += 1;
                    self.bytes_sent += len as u64;
                    self.metrics.report_frame_sent(len);
                }
                Err(DomainError::ClientDisconnected) => return Termination::ClientDisconnected,
                Err(e) => return Termination::Fault(e.to_string()),
            }
        }
    }
}
