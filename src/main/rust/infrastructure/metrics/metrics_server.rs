use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use serde::Serialize;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

use super::PrometheusReporter;
use crate::domain::errors::Result;
use crate::domain::ports::SourceRegistry;
use crate::domain::value_objects::SourceKind;

const SERVICE_NAME: &str = "mjpeg-gateway";

#[derive(Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    active_streams: i64,
}

/// `/readyz` body. Counts are present only when the registry answered.
#[derive(Serialize)]
struct Readiness {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cameras: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    videos: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn registry_counts(registry: &dyn SourceRegistry) -> Result<(u64, u64)> {
    let cameras = registry.count(SourceKind::Camera).await?;
    let videos = registry.count(SourceKind::VideoFile).await?;
    Ok((cameras, videos))
}

/// Ready means the registry database answers queries
async fn readiness(registry: Arc<dyn SourceRegistry>) -> std::result::Result<Response, Infallible> {
    let (status, body) = match registry_counts(registry.as_ref()).await {
        Ok((cameras, videos)) => (
            StatusCode::OK,
            Readiness {
                status: "ready",
                cameras: Some(cameras),
                videos: Some(videos),
                error: None,
            },
        ),
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Readiness {
                    status: "unavailable",
                    cameras: None,
                    videos: None,
                    error: Some(e.to_string()),
                },
            )
        }
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status).into_response())
}

/// Operational endpoints served next to the API: Prometheus scrape,
/// health with the live stream count, liveness and registry readiness.
pub fn metrics_routes(
    registry: Arc<dyn SourceRegistry>,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "OPTIONS"])
        .allow_headers(vec!["Content-Type"]);

    let metrics = warp::path!("metrics").and(warp::get()).map(|| {
        warp::reply::with_header(
            PrometheusReporter::gather_metrics(),
            "content-type",
            "text/plain; version=0.0.4; charset=utf-8",
        )
        .into_response()
    });

    let health = warp::path!("health").and(warp::get()).map(|| {
        warp::reply::json(&Health {
            status: "healthy",
            service: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            active_streams: PrometheusReporter::active_streams(),
        })
        .into_response()
    });

    let live = warp::path!("livez")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK).into_response());

    let ready = warp::path!("readyz")
        .and(warp::get())
        .and(warp::any().map(move || registry.clone()))
        .and_then(readiness);

    metrics.or(health).unify().or(live).unify().or(ready).unify().with(cors)
}

pub async fn serve_metrics(
    port: u16,
    registry: Arc<dyn SourceRegistry>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) {
    let (addr, server): (SocketAddr, _) = warp::serve(metrics_routes(registry))
        .bind_with_graceful_shutdown(([0, 0, 0, 0], port), shutdown);

    tracing::info!("Metrics server listening on http://{}", addr);
    server.await;
}
