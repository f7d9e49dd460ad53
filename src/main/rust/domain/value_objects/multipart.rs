use bytes::{BufMut, Bytes, BytesMut};

use super::EncodedFrame;

/// Boundary token separating MJPEG parts
pub const MJPEG_BOUNDARY: &str = "frame";

/// `Content-Type` of a whole MJPEG response
pub fn mixed_replace_content_type() -> String {
    format!("multipart/x-mixed-replace; boundary={}", MJPEG_BOUNDARY)
}

/// Wrap one JPEG as `--frame\r\nContent-Type: image/jpeg\r\n\r\n<jpeg>\r\n`.
/// No closing boundary is ever emitted.
pub fn frame_part(frame: &EncodedFrame) -> Bytes {
    let header = format!("--{}\r\nContent-Type: image/jpeg\r\n\r\n", MJPEG_BOUNDARY);
    let mut part = BytesMut::with_capacity(header.len() + frame.len() + 2);
    part.put_slice(header.as_bytes());
    part.put_slice(frame.bytes());
    part.put_slice(b"\r\n");
    part.freeze()
}
