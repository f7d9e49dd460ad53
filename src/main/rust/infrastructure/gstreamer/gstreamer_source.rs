use std::time::{Duration, Instant};

use gstreamer::prelude::*;

use super::PipelineBuilder;
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{DecodeOutcome, FrameDecoder, SourceOpener};
use crate::domain::value_objects::{CaptureHint, Frame, SourceKind, SourceLocator, StreamConfig};

/// Opens one decoding pipeline per request. Holds no state of its own, so
/// every handle gets an independent connection to its source.
pub struct GStreamerSourceOpener;

impl GStreamerSourceOpener {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GStreamerSourceOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceOpener for GStreamerSourceOpener {
    fn open(
        &self,
        kind: SourceKind,
        locator: &SourceLocator,
        config: &StreamConfig,
    ) -> Result<Box<dyn FrameDecoder>> {
        let decoder = GStreamerDecoder::start(kind, locator, config)?;
        Ok(Box::new(decoder))
    }
}

/// Longest single wait on the appsink, so bus errors surface promptly
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of waiting on the appsink
enum Pulled {
    Frame(Frame),
    EndOfStream,
    BusError(String),
    TimedOut,
}

/// `uridecodebin`/`filesrc ! decodebin` feeding an RGB appsink
pub struct GStreamerDecoder {
    kind: SourceKind,
    locator: SourceLocator,
    pipeline: gstreamer::Pipeline,
    appsink: gstreamer_app::AppSink,
    read_timeout: Duration,
    /// First camera frame, pulled during open as proof of connection
    pending: Option<Frame>,
    released: bool,
}

impl GStreamerDecoder {
    fn start(kind: SourceKind, locator: &SourceLocator, config: &StreamConfig) -> Result<Self> {
        let description = PipelineBuilder::build_launch_string(kind);
        tracing::debug!(kind = %kind, "Creating pipeline: {}", description);

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| DomainError::Open(format!("failed to parse pipeline: {}", e)))?
            .downcast::<gstreamer::Pipeline>()
            .map_err(|_| DomainError::Open("failed to downcast to Pipeline".to_string()))?;

        let source = pipeline
            .by_name(PipelineBuilder::SOURCE_NAME)
            .ok_or_else(|| DomainError::Open("source element missing from pipeline".to_string()))?;
        source.set_property(PipelineBuilder::locator_property(kind), locator.as_str());

        let appsink = pipeline
            .by_name(PipelineBuilder::SINK_NAME)
            .ok_or_else(|| DomainError::Open("appsink element missing from pipeline".to_string()))?
            .downcast::<gstreamer_app::AppSink>()
            .map_err(|_| DomainError::Open("appsink element has unexpected type".to_string()))?;

        let caps = caps_for(kind, config.capture_hint())?;
        appsink.set_caps(Some(&caps));
        appsink.set_max_buffers(1);
        // Live sources keep only the newest frame; files must not skip any.
        appsink.set_drop(kind.is_live());
        appsink.set_property("sync", false);

        // Built before the state change so a failed open still tears down via Drop
        let mut decoder = Self {
            kind,
            locator: locator.clone(),
            pipeline,
            appsink,
            read_timeout: config.read_timeout(),
            pending: None,
            released: false,
        };

        decoder.play(config.open_timeout())?;

        tracing::info!(kind = %kind, locator = %locator, "Source connected");
        Ok(decoder)
    }

    /// Bring the pipeline up within `open_timeout`. A live source returns
    /// `NoPreroll` before it has connected, so cameras must also deliver
    /// their first frame inside the same window.
    fn play(&mut self, open_timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + open_timeout;

        if let Err(e) = self.pipeline.set_state(gstreamer::State::Playing) {
            let reason = self.drain_bus().unwrap_or_else(|| e.to_string());
            return Err(DomainError::Open(reason));
        }

        match self.pipeline.state(clock_time(open_timeout)) {
            (Ok(gstreamer::StateChangeSuccess::Async), _, _) => {
                return Err(DomainError::Open(format!(
                    "{} did not start within {:?}",
                    self.locator, open_timeout
                )))
            }
            (Ok(_), _, _) => {}
            (Err(e), _, _) => {
                let reason = self.drain_bus().unwrap_or_else(|| e.to_string());
                return Err(DomainError::Open(reason));
            }
        }

        if !self.kind.is_live() {
            return Ok(());
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        match self.pull(remaining) {
            Ok(Pulled::Frame(frame)) => {
                self.pending = Some(frame);
                Ok(())
            }
            Ok(Pulled::BusError(reason)) => Err(DomainError::Open(reason)),
            Ok(Pulled::EndOfStream) => Err(DomainError::Open(format!(
                "{} ended before its first frame",
                self.locator
            ))),
            Ok(Pulled::TimedOut) => Err(DomainError::Open(format!(
                "no frame from {} within {:?}",
                self.locator, open_timeout
            ))),
            Err(e) => Err(DomainError::Open(e.to_string())),
        }
    }

    /// Wait up to `wait` for the next sample, checking the bus between
    /// short pulls.
    fn pull(&self, wait: Duration) -> Result<Pulled> {
        let deadline = Instant::now() + wait;

        loop {
            if let Some(reason) = self.drain_bus() {
                return Ok(Pulled::BusError(reason));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(Pulled::TimedOut);
            }

            if let Some(sample) = self
                .appsink
                .try_pull_sample(clock_time(remaining.min(POLL_INTERVAL)))
            {
                return sample_to_frame(&sample).map(Pulled::Frame);
            }

            if self.appsink.is_eos() {
                return Ok(Pulled::EndOfStream);
            }
        }
    }

    /// Empty the bus and return the first error on it. Nothing else reads
    /// this bus, so it must be drained to stay bounded.
    fn drain_bus(&self) -> Option<String> {
        let bus = self.pipeline.bus()?;
        let mut first_error = None;

        while let Some(message) = bus.pop() {
            if let gstreamer::MessageView::Error(err) = message.view() {
                if first_error.is_none() {
                    first_error = Some(format!(
                        "Error from {:?}: {} ({:?})",
                        err.src().map(|s| s.path_string()),
                        err.error(),
                        err.debug()
                    ));
                }
            }
        }

        first_error
    }

    /// A pipeline that errored or hit EOS stays dead; cameras get a fresh
    /// connection and the caller's retry loop decides whether to keep going.
    fn reconnect(&mut self) {
        tracing::warn!(locator = %self.locator, "Camera pipeline stopped, reconnecting");

        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            tracing::warn!(locator = %self.locator, "Failed to reset pipeline: {}", e);
            return;
        }
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Playing) {
            tracing::warn!(locator = %self.locator, "Failed to restart pipeline: {}", e);
        }
    }
}

impl FrameDecoder for GStreamerDecoder {
    fn read(&mut self) -> Result<DecodeOutcome> {
        if let Some(frame) = self.pending.take() {
            return Ok(DecodeOutcome::Frame(frame));
        }

        match self.pull(self.read_timeout)? {
            Pulled::Frame(frame) => Ok(DecodeOutcome::Frame(frame)),
            Pulled::EndOfStream => {
                if self.kind.is_live() {
                    self.reconnect();
                }
                Ok(DecodeOutcome::EndOfStream)
            }
            Pulled::BusError(reason) => {
                if self.kind.is_live() {
                    self.reconnect();
                }
                Err(DomainError::Decode(reason))
            }
            Pulled::TimedOut => Err(DomainError::Decode(format!(
                "no frame from {} within {:?}",
                self.locator, self.read_timeout
            ))),
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            tracing::warn!(locator = %self.locator, "Failed to set pipeline to NULL: {}", e);
        }
    }
}

impl Drop for GStreamerDecoder {
    fn drop(&mut self) {
        self.release();
    }
}

fn clock_time(duration: Duration) -> gstreamer::ClockTime {
    gstreamer::ClockTime::from_mseconds(duration.as_millis() as u64)
}

/// Cameras negotiate the hinted size first and fall back to whatever the
/// stream carries; files keep their native size.
fn caps_for(kind: SourceKind, hint: CaptureHint) -> Result<gstreamer::Caps> {
    let description = match kind {
        SourceKind::Camera => format!(
            "video/x-raw,format=RGB,width={},height={};video/x-raw,format=RGB",
            hint.width(),
            hint.height()
        ),
        SourceKind::VideoFile => "video/x-raw,format=RGB".to_string(),
    };

    description
        .parse::<gstreamer::Caps>()
        .map_err(|e| DomainError::Open(format!("invalid appsink caps: {}", e)))
}

fn sample_to_frame(sample: &gstreamer::Sample) -> Result<Frame> {
    let buffer = sample
        .buffer()
        .ok_or_else(|| DomainError::Decode("sample missing buffer".to_string()))?;
    let caps = sample
        .caps()
        .ok_or_else(|| DomainError::Decode("sample missing caps".to_string()))?;
    let info = gstreamer_video::VideoInfo::from_caps(caps)
        .map_err(|e| DomainError::Decode(format!("parse caps as video info: {}", e)))?;

    let width = info.width();
    let height = info.height();
    let row_bytes = (width as usize) * 3;
    let stride = info.stride()[0] as usize;

    let map = buffer
        .map_readable()
        .map_err(|e| DomainError::Decode(format!("map buffer: {}", e)))?;
    let data = map.as_slice();

    if stride == row_bytes {
        let len = row_bytes * height as usize;
        let pixels = data
            .get(..len)
            .ok_or_else(|| DomainError::Decode("buffer shorter than frame".to_string()))?;
        return Frame::from_rgb(pixels.to_vec(), width, height);
    }

    // Rows are padded; copy them out tightly packed
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .ok_or_else(|| DomainError::Decode("buffer row is out of bounds".to_string()))?,
        );
    }

    Frame::from_rgb(pixels, width, height)
}
