use crate::domain::errors::Result;
use crate::domain::value_objects::{EncodedFrame, Frame};

/// Port for still-image encoders
pub trait FrameCodec: Send + Sync {
    fn encode(&self, frame: &Frame) -> Result<EncodedFrame>;
}
