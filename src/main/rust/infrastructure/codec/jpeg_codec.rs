use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::FrameCodec;
use crate::domain::value_objects::{EncodedFrame, Frame};

/// Baseline JPEG via the `image` crate
pub struct JpegCodec {
    quality: u8,
}

impl JpegCodec {
    pub fn new(quality: u8) -> Result<Self> {
        if !(1..=100).contains(&quality) {
            return Err(DomainError::Validation(format!(
                "JPEG quality must be between 1 and 100, got {}",
                quality
            )));
        }
        Ok(Self { quality })
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegCodec {
    fn default() -> Self {
        Self { quality: 80 }
    }
}

impl FrameCodec for JpegCodec {
    fn encode(&self, frame: &Frame) -> Result<EncodedFrame> {
        let mut buffer = Vec::with_capacity(frame.pixels().len() / 8);
        JpegEncoder::new_with_quality(&mut buffer, self.quality)
            .encode(
                frame.pixels(),
                frame.width(),
                frame.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| DomainError::Encode(e.to_string()))?;
        Ok(EncodedFrame::new(buffer))
    }
}
