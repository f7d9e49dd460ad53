use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::domain::value_objects::{BackoffPolicy, CaptureHint, RetryPolicy, StreamConfig};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "mjpeg-gateway",
    version = "0.1.0",
    about = "MJPEG over HTTP for registered RTSP cameras and video files"
)]
pub struct Config {
    /// HTTP API port
    #[arg(short, long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// SQLite database holding the camera and video registry
    #[arg(long, env = "DATABASE_PATH", default_value = "cameras.db")]
    pub db_path: PathBuf,

    /// Metrics server port
    #[arg(long, env = "METRICS_PORT", default_value = "9001")]
    pub metrics_port: u16,

    /// Preferred camera capture width (advisory)
    #[arg(long, env = "CAPTURE_WIDTH", default_value = "1920")]
    pub capture_width: u32,

    /// Preferred camera capture height (advisory)
    #[arg(long, env = "CAPTURE_HEIGHT", default_value = "1080")]
    pub capture_height: u32,

    /// How long to wait for a source to start, in milliseconds
    #[arg(long, env = "OPEN_TIMEOUT_MS", default_value = "10000")]
    pub open_timeout_ms: u64,

    /// How long to wait for a single frame, in milliseconds
    #[arg(long, env = "READ_TIMEOUT_MS", default_value = "5000")]
    pub read_timeout_ms: u64,

    /// Consecutive camera read failures before a stream gives up (0 = never)
    #[arg(long, env = "MAX_READ_FAILURES", default_value = "100")]
    pub max_read_failures: u32,

    /// Initial delay between camera read retries, in milliseconds
    #[arg(long, default_value = "50")]
    pub retry_initial_delay_ms: u64,

    /// Maximum delay between camera read retries, in milliseconds
    #[arg(long, default_value = "2000")]
    pub retry_max_delay_ms: u64,

    /// Retry delay multiplier
    #[arg(long, default_value = "2.0")]
    pub retry_multiplier: f64,

    /// JPEG quality (1-100)
    #[arg(long, env = "JPEG_QUALITY", default_value = "80")]
    pub jpeg_quality: u8,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        Self::validate_port(self.port, "HTTP")?;
        Self::validate_port(self.metrics_port, "metrics")?;

        if self.port == self.metrics_port {
            anyhow::bail!("HTTP port and metrics port cannot be the same");
        }

        if self.capture_width == 0 || self.capture_height == 0 {
            anyhow::bail!(
                "Capture resolution cannot be zero: {}x{}",
                self.capture_width,
                self.capture_height
            );
        }

        if self.open_timeout_ms == 0 || self.read_timeout_ms == 0 {
            anyhow::bail!("Open and read timeouts must be greater than 0");
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            anyhow::bail!("JPEG quality must be between 1 and 100, got {}", self.jpeg_quality);
        }

        if !self.retry_multiplier.is_finite() || self.retry_multiplier <= 1.0 {
            anyhow::bail!("Retry multiplier must be a finite number > 1.0");
        }

        if self.retry_max_delay_ms < self.retry_initial_delay_ms {
            anyhow::bail!(
                "Maximum retry delay ({}) cannot be less than initial delay ({})",
                self.retry_max_delay_ms,
                self.retry_initial_delay_ms
            );
        }

        Ok(())
    }

    fn validate_port(port: u16, name: &str) -> anyhow::Result<()> {
        if port == 0 {
            anyhow::bail!("Invalid {} port: port cannot be 0", name);
        }
        Ok(())
    }

    pub fn to_backoff_policy(&self) -> crate::domain::errors::Result<BackoffPolicy> {
        BackoffPolicy::new(
            Duration::from_millis(self.retry_initial_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
            self.retry_multiplier,
        )
    }

    pub fn to_stream_config(&self) -> crate::domain::errors::Result<StreamConfig> {
        let retry_policy = RetryPolicy::new(self.max_read_failures, self.to_backoff_policy()?);

        let config = StreamConfig::new()
            .with_capture_hint(CaptureHint::new(self.capture_width, self.capture_height))
            .with_open_timeout(Duration::from_millis(self.open_timeout_ms))
            .with_read_timeout(Duration::from_millis(self.read_timeout_ms))
            .with_retry_policy(retry_policy);

        config.validate()?;
        Ok(config)
    }
}
