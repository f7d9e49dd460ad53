use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use mjpeg_gateway::{
    BackoffPolicy, DecodeOutcome, DomainError, EncodedFrame, Frame, FrameCodec, FrameDecoder,
    FrameSink, MetricsReporter, NoopMetrics, Result, RetryPolicy, SessionReport, SnapshotFetcher,
    SourceHandle, SourceId, SourceKind, SourceLocator, SourceOpener, SourceRegistry,
    SqliteSourceRegistry, StreamConfig, StreamSession, StreamingService, Termination,
};

/// Counts reads and releases across every decoder it opens
#[derive(Default)]
struct Counters {
    opens: AtomicUsize,
    reads: AtomicUsize,
    releases: AtomicUsize,
}

struct ScriptDecoder {
    script: VecDeque<Result<DecodeOutcome>>,
    endless: bool,
    counters: Arc<Counters>,
}

impl FrameDecoder for ScriptDecoder {
    fn read(&mut self) -> Result<DecodeOutcome> {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
        match self.script.pop_front() {
            Some(outcome) => outcome,
            None if self.endless => frame(0),
            None => Ok(DecodeOutcome::EndOfStream),
        }
    }

    fn release(&mut self) {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
    }
}

struct ScriptOpener {
    script: Mutex<Vec<Result<DecodeOutcome>>>,
    endless: bool,
    counters: Arc<Counters>,
}

impl ScriptOpener {
    fn new(script: Vec<Result<DecodeOutcome>>) -> Self {
        Self {
            script: Mutex::new(script),
            endless: false,
            counters: Arc::new(Counters::default()),
        }
    }

    fn endless() -> Self {
        Self {
            endless: true,
            ..Self::new(Vec::new())
        }
    }
}

impl SourceOpener for ScriptOpener {
    fn open(
        &self,
        _kind: SourceKind,
        _locator: &SourceLocator,
        _config: &StreamConfig,
    ) -> Result<Box<dyn FrameDecoder>> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        let script = std::mem::take(&mut *self.script.lock().unwrap());
        Ok(Box::new(ScriptDecoder {
            script: script.into(),
            endless: self.endless,
            counters: self.counters.clone(),
        }))
    }
}

/// Encodes a frame as its first pixel byte, so parts can be told apart
struct TagCodec;

impl FrameCodec for TagCodec {
    fn encode(&self, frame: &Frame) -> Result<EncodedFrame> {
        Ok(EncodedFrame::new(vec![frame.pixels()[0]]))
    }
}

struct CollectingSink {
    parts: Vec<Bytes>,
    accept: usize,
}

impl CollectingSink {
    fn new(accept: usize) -> Self {
        Self {
            parts: Vec::new(),
            accept,
        }
    }

    fn tags(&self) -> Vec<u8> {
        self.parts.iter().map(|p| p[p.len() - 3]).collect()
    }
}

impl FrameSink for CollectingSink {
    fn write_part(&mut self, part: Bytes) -> Result<()> {
        if self.parts.len() >= self.accept {
            return Err(DomainError::ClientDisconnected);
        }
        self.parts.push(part);
        Ok(())
    }
}

fn frame(tag: u8) -> Result<DecodeOutcome> {
    Ok(DecodeOutcome::Frame(Frame::from_rgb(vec![tag; 4 * 3], 2, 2)?))
}

fn stall() -> Result<DecodeOutcome> {
    Err(DomainError::Decode("no frame within 5s".to_string()))
}

fn locator() -> SourceLocator {
    SourceLocator::new("rtsp://10.0.0.5/stream").unwrap()
}

fn session(opener: &ScriptOpener, kind: SourceKind) -> StreamSession {
    let handle = SourceHandle::open(opener, kind, &locator(), &StreamConfig::default()).unwrap();
    StreamSession::new(
        handle,
        Arc::new(TagCodec),
        RetryPolicy::new(5, BackoffPolicy::immediate()),
        Arc::new(NoopMetrics),
    )
}

#[test]
fn test_file_stream_sends_one_part_per_frame() {
    let opener = ScriptOpener::new(vec![frame(1), frame(2), frame(3)]);
    let mut sink = CollectingSink::new(usize::MAX);

    let report = session(&opener, SourceKind::VideoFile).run(&mut sink);

    assert_eq!(report.termination, Termination::EndOfStream);
    assert_eq!(report.frames_sent, 3);
    assert_eq!(sink.tags(), vec![1, 2, 3]);
    assert!(sink.parts[0].starts_with(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n"));
    assert_eq!(opener.counters.releases.load(Ordering::SeqCst), 1);
}

#[test]
fn test_file_read_failure_ends_the_stream() {
    let opener = ScriptOpener::new(vec![frame(1), stall(), frame(2)]);
    let mut sink = CollectingSink::new(usize::MAX);

    let report = session(&opener, SourceKind::VideoFile).run(&mut sink);

    assert_eq!(report.termination, Termination::EndOfStream);
    assert_eq!(sink.tags(), vec![1]);
    assert_eq!(report.transient_failures, 0);
}

#[test]
fn test_camera_skips_a_transient_failure() {
    let opener = ScriptOpener::new(vec![frame(1), stall(), frame(2)]);
    let mut sink = CollectingSink::new(2);

    let report = session(&opener, SourceKind::Camera).run(&mut sink);

    assert_eq!(sink.tags(), vec![1, 2]);
    assert_eq!(report.transient_failures, 1);
    assert_eq!(opener.counters.releases.load(Ordering::SeqCst), 1);
}

#[test]
fn test_camera_gives_up_after_consecutive_failures() {
    let opener = ScriptOpener::new(vec![frame(1)]);
    let mut sink = CollectingSink::new(usize::MAX);

    let report = session(&opener, SourceKind::Camera).run(&mut sink);

    // End of script looks like a dead camera: five failed reads after the frame
    assert_eq!(report.termination, Termination::RetriesExhausted);
    assert_eq!(report.frames_sent, 1);
    assert_eq!(report.transient_failures, 5);
    assert_eq!(opener.counters.reads.load(Ordering::SeqCst), 6);
}

#[test]
fn test_disconnect_stops_reading() {
    let opener = ScriptOpener::endless();
    let mut sink = CollectingSink::new(3);

    let report = session(&opener, SourceKind::Camera).run(&mut sink);

    assert_eq!(report.termination, Termination::ClientDisconnected);
    assert_eq!(report.frames_sent, 3);
    // The fourth frame was read and encoded before its write was refused
    assert_eq!(opener.counters.reads.load(Ordering::SeqCst), 4);
    assert_eq!(opener.counters.releases.load(Ordering::SeqCst), 1);
}

#[test]
fn test_snapshot_has_no_retry() {
    let opener = Arc::new(ScriptOpener::new(vec![stall(), frame(1)]));
    let fetcher = SnapshotFetcher::new(opener.clone(), Arc::new(TagCodec), StreamConfig::default());

    let result = fetcher.fetch(SourceKind::Camera, &locator());

    assert!(matches!(result, Err(DomainError::Decode(_))));
    assert_eq!(opener.counters.reads.load(Ordering::SeqCst), 1);
    assert_eq!(opener.counters.releases.load(Ordering::SeqCst), 1);
}

#[test]
fn test_snapshot_returns_first_frame() {
    let opener = Arc::new(ScriptOpener::new(vec![frame(42), frame(43)]));
    let fetcher = SnapshotFetcher::new(opener.clone(), Arc::new(TagCodec), StreamConfig::default());

    let encoded = fetcher.fetch(SourceKind::VideoFile, &locator()).unwrap();

    assert_eq!(&encoded.bytes()[..], &[42u8]);
    assert_eq!(opener.counters.releases.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dropping_the_receiver_ends_the_session() {
    let registry = Arc::new(SqliteSourceRegistry::in_memory().unwrap());
    let id = SourceId::new(1).unwrap();
    registry
        .add(SourceKind::Camera, id, locator())
        .await
        .unwrap();

    let opener = Arc::new(ScriptOpener::endless());
    let service = StreamingService::new(
        registry,
        opener.clone(),
        Arc::new(TagCodec),
        Arc::new(NoopMetrics),
        StreamConfig::default(),
    )
    .unwrap();

    let mut parts = service.start_stream(SourceKind::Camera, id).await.unwrap();
    assert!(parts.recv().await.is_some());
    assert!(parts.recv().await.is_some());
    drop(parts);

    let released = tokio::time::timeout(Duration::from_secs(5), async {
        while opener.counters.releases.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    assert!(released.is_ok(), "session kept its source after the client left");
    assert_eq!(opener.counters.opens.load(Ordering::SeqCst), 1);
    assert_eq!(opener.counters.releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_each_stream_opens_its_own_source() {
    let registry = Arc::new(SqliteSourceRegistry::in_memory().unwrap());
    let id = SourceId::new(9).unwrap();
    registry
        .add(SourceKind::VideoFile, id, locator())
        .await
        .unwrap();

    let opener = Arc::new(ScriptOpener::new(vec![frame(1)]));
    let service = StreamingService::new(
        registry,
        opener.clone(),
        Arc::new(TagCodec),
        Arc::new(NoopMetrics),
        StreamConfig::default(),
    )
    .unwrap();

    let mut first = service.start_stream(SourceKind::VideoFile, id).await.unwrap();
    let mut second = service.start_stream(SourceKind::VideoFile, id).await.unwrap();

    // Only the first open got the scripted frame; the second source is empty
    assert!(first.recv().await.is_some());
    assert!(first.recv().await.is_none());
    assert!(second.recv().await.is_none());
    assert_eq!(opener.counters.opens.load(Ordering::SeqCst), 2);
}

/// Tracks the active-stream balance the way the gauge would
#[derive(Default)]
struct ActiveStreams {
    active: std::sync::atomic::AtomicI64,
    aborted: AtomicUsize,
}

impl MetricsReporter for ActiveStreams {
    fn report_session_started(&self, _kind: SourceKind) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    fn report_session_stopped(&self, _report: &SessionReport) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    fn report_session_aborted(&self, _kind: SourceKind) {
        self.aborted.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    fn report_frame_sent(&self, _bytes: usize) {}
    fn report_transient_failure(&self) {}
    fn report_snapshot(&self, _kind: SourceKind, _succeeded: bool) {}
}

struct PanickingCodec;

impl FrameCodec for PanickingCodec {
    fn encode(&self, _frame: &Frame) -> Result<EncodedFrame> {
        panic!("encoder blew up");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_panicking_session_is_reported_as_aborted() {
    let registry = Arc::new(SqliteSourceRegistry::in_memory().unwrap());
    let id = SourceId::new(4).unwrap();
    registry
        .add(SourceKind::Camera, id, locator())
        .await
        .unwrap();

    let opener = Arc::new(ScriptOpener::endless());
    let metrics = Arc::new(ActiveStreams::default());
    let service = StreamingService::new(
        registry,
        opener.clone(),
        Arc::new(PanickingCodec),
        metrics.clone(),
        StreamConfig::default(),
    )
    .unwrap();

    let mut parts = service.start_stream(SourceKind::Camera, id).await.unwrap();
    assert!(parts.recv().await.is_none());

    let aborted = tokio::time::timeout(Duration::from_secs(5), async {
        while metrics.aborted.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    assert!(aborted.is_ok(), "panicked session was never reported");
    assert_eq!(metrics.active.load(Ordering::SeqCst), 0);
    // Unwinding still drops the handle
    assert_eq!(opener.counters.releases.load(Ordering::SeqCst), 1);
}
