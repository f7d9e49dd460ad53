use std::convert::Infallible;
use std::sync::Arc;

use warp::Filter;

use super::api_error::handle_rejection;
use super::handlers;
use crate::application::services::{RegistryService, StreamingService};
use crate::domain::value_objects::SourceKind;

/// Largest JSON body accepted by the registry endpoints
const MAX_JSON_BODY: u64 = 16 * 1024;

fn with_registry(
    registry: Arc<RegistryService>,
) -> impl Filter<Extract = (Arc<RegistryService>,), Error = Infallible> + Clone {
    warp::any().map(move || registry.clone())
}

fn with_streaming(
    streaming: Arc<StreamingService>,
) -> impl Filter<Extract = (Arc<StreamingService>,), Error = Infallible> + Clone {
    warp::any().map(move || streaming.clone())
}

fn kind(kind: SourceKind) -> impl Filter<Extract = (SourceKind,), Error = Infallible> + Clone {
    warp::any().map(move || kind)
}

/// Every endpoint of the gateway, with CORS and JSON rejection replies
pub fn routes(
    registry: Arc<RegistryService>,
    streaming: Arc<StreamingService>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    let add_camera = warp::path!("add_camera")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_JSON_BODY))
        .and(warp::body::json())
        .and(with_registry(registry.clone()))
        .and_then(handlers::add_camera);

    let add_video = warp::path!("add_video")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_JSON_BODY))
        .and(warp::body::json())
        .and(with_registry(registry.clone()))
        .and_then(handlers::add_video);

    let delete_camera = kind(SourceKind::Camera)
        .and(warp::path!("delete_camera" / i64))
        .and(warp::delete())
        .and(with_registry(registry.clone()))
        .and_then(handlers::delete_source);

    let delete_video = kind(SourceKind::VideoFile)
        .and(warp::path!("delete_video" / i64))
        .and(warp::delete())
        .and(with_registry(registry))
        .and_then(handlers::delete_source);

    let camera_feed = kind(SourceKind::Camera)
        .and(warp::path!("camera" / i64))
        .and(warp::get())
        .and(with_streaming(streaming.clone()))
        .and_then(handlers::stream);

    let video_feed = kind(SourceKind::VideoFile)
        .and(warp::path!("video" / i64))
        .and(warp::get())
        .and(with_streaming(streaming.clone()))
        .and_then(handlers::stream);

    let camera_frame = kind(SourceKind::Camera)
        .and(warp::path!("single_frame" / i64))
        .and(warp::get())
        .and(with_streaming(streaming.clone()))
        .and_then(handlers::single_frame);

    let video_frame = kind(SourceKind::VideoFile)
        .and(warp::path!("single_frame_video" / i64))
        .and(warp::get())
        .and(with_streaming(streaming))
        .and_then(handlers::single_frame);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allow_headers(vec!["Content-Type"]);

    add_camera
        .or(add_video)
        .or(delete_camera)
        .or(delete_video)
        .or(camera_feed)
        .or(video_feed)
        .or(camera_frame)
        .or(video_frame)
        .with(cors)
        .with(warp::trace::request())
        .recover(handle_rejection)
}
