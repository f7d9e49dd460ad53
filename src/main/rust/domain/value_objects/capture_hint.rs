/// Resolution offered to camera decoders. Advisory: the source may ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureHint {
    width: u32,
    height: u32,
}

impl CaptureHint {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Default for CaptureHint {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}
