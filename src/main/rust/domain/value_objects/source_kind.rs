use std::fmt;

/// Namespace a source lives in. Decides pipeline shape and end-of-stream policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Live network stream; never runs out of frames.
    Camera,
    /// Stored file; finite.
    VideoFile,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Camera => "Camera",
            SourceKind::VideoFile => "Video",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, SourceKind::Camera)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
