use std::convert::Infallible;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use warp::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use warp::http::HeaderValue;
use warp::hyper::Body;
use warp::reply::Response;

use crate::domain::value_objects::{multipart, EncodedFrame};

/// Long-lived `multipart/x-mixed-replace` response fed by a session.
///
/// Hyper pulls parts as the socket drains. When the client goes away the
/// body is dropped, which closes the channel and stops the session.
pub fn mjpeg_response(parts: mpsc::Receiver<Bytes>) -> Response {
    let stream = ReceiverStream::new(parts).map(Ok::<Bytes, Infallible>);
    let mut response = Response::new(Body::wrap_stream(stream));

    let headers = response.headers_mut();
    if let Ok(content_type) = HeaderValue::from_str(&multipart::mixed_replace_content_type()) {
        headers.insert(CONTENT_TYPE, content_type);
    }
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    response
}

/// Single JPEG reply
pub fn jpeg_response(frame: EncodedFrame) -> Response {
    let mut response = Response::new(Body::from(frame.into_bytes()));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));
    response
}
