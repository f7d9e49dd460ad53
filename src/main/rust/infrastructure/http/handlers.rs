use std::convert::Infallible;
use std::sync::Arc;

use serde::Deserialize;
use warp::http::StatusCode;
use warp::reply::Response;

use super::api_error::{message, ApiError};
use super::multipart_body::{jpeg_response, mjpeg_response};
use crate::application::services::{RegistryService, StreamingService};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{SourceId, SourceKind};

#[derive(Debug, Deserialize)]
pub struct AddCameraRequest {
    pub camera_id: Option<i64>,
    pub rtsp_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddVideoRequest {
    pub video_id: Option<i64>,
    pub video_path: Option<String>,
}

fn reply(result: Result<Response, DomainError>) -> Result<Response, Infallible> {
    Ok(result.unwrap_or_else(|e| ApiError::from(e).into_response()))
}

/// Path ids that can never be registered are simply unknown
fn path_id(kind: SourceKind, raw: i64) -> Result<SourceId, ApiError> {
    SourceId::new(raw).map_err(|_| ApiError::new(StatusCode::NOT_FOUND, format!("{} not found", kind)))
}

async fn add_source(
    registry: &RegistryService,
    kind: SourceKind,
    fields: Option<(i64, String)>,
    missing: &str,
) -> Result<Response, Infallible> {
    let Some((id, locator)) = fields else {
        return Ok(message(StatusCode::BAD_REQUEST, missing));
    };

    reply(
        registry
            .add_source(kind, id, locator)
            .await
            .map(|()| message(StatusCode::OK, format!("{} added successfully", kind))),
    )
}

pub async fn add_camera(
    body: AddCameraRequest,
    registry: Arc<RegistryService>,
) -> Result<Response, Infallible> {
    let fields = body.camera_id.zip(body.rtsp_url);
    add_source(
        &registry,
        SourceKind::Camera,
        fields,
        "Both camera_id and rtsp_url are required",
    )
    .await
}

pub async fn add_video(
    body: AddVideoRequest,
    registry: Arc<RegistryService>,
) -> Result<Response, Infallible> {
    let fields = body.video_id.zip(body.video_path);
    add_source(
        &registry,
        SourceKind::VideoFile,
        fields,
        "Both video_id and video_path are required",
    )
    .await
}

pub async fn delete_source(
    kind: SourceKind,
    raw_id: i64,
    registry: Arc<RegistryService>,
) -> Result<Response, Infallible> {
    let id = match path_id(kind, raw_id) {
        Ok(id) => id,
        Err(e) => return Ok(e.into_response()),
    };

    reply(
        registry
            .remove_source(kind, id)
            .await
            .map(|()| message(StatusCode::OK, format!("{} deleted successfully", kind))),
    )
}

pub async fn stream(
    kind: SourceKind,
    raw_id: i64,
    streaming: Arc<StreamingService>,
) -> Result<Response, Infallible> {
    let id = match path_id(kind, raw_id) {
        Ok(id) => id,
        Err(e) => return Ok(e.into_response()),
    };

    reply(streaming.start_stream(kind, id).await.map(mjpeg_response))
}

pub async fn single_frame(
    kind: SourceKind,
    raw_id: i64,
    streaming: Arc<StreamingService>,
) -> Result<Response, Infallible> {
    let id = match path_id(kind, raw_id) {
        Ok(id) => id,
        Err(e) => return Ok(e.into_response()),
    };

    match streaming.snapshot(kind, id).await {
        Ok(frame) => Ok(jpeg_response(frame)),
        Err(e @ DomainError::NotFound { .. }) => Ok(ApiError::from(e).into_response()),
        Err(_) => Ok(message(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unable to fetch frame",
        )),
    }
}
