use bytes::Bytes;

use crate::domain::errors::{DomainError, Result};

/// A decoded RGB8 image. Lives only between a successful read and its encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    /// Build a frame from tightly packed RGB rows.
    pub fn from_rgb(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = (width as usize) * (height as usize) * 3;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(DomainError::Decode(format!(
                "frame buffer holds {} bytes, expected {} for {}x{} RGB",
                pixels.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// JPEG bytes of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    jpeg: Bytes,
}

impl EncodedFrame {
    pub fn new(jpeg: impl Into<Bytes>) -> Self {
        Self { jpeg: jpeg.into() }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.jpeg
    }

    pub fn len(&self) -> usize {
        self.jpeg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jpeg.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.jpeg
    }
}
