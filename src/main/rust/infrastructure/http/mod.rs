mod api_error;
mod handlers;
mod multipart_body;
mod routes;

pub use api_error::{ApiError, MessageResponse};
pub use multipart_body::{jpeg_response, mjpeg_response};
pub use routes::routes;
