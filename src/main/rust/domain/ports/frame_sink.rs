use bytes::Bytes;

use crate::domain::errors::Result;

/// Consumer side of a stream. A failed write means the client is gone.
pub trait FrameSink {
    /// Blocks until the consumer accepts the part
    fn write_part(&mut self, part: Bytes) -> Result<()>;
}
