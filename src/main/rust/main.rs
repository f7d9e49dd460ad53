use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use mjpeg_gateway::{
    routes, serve_metrics, Config, GStreamerSourceOpener, JpegCodec, PrometheusReporter,
    RegistryService, SqliteSourceRegistry, StreamingService,
};

/// Longest wait for open streams to drain once shutdown starts
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Initialize logging
    let filter = if config.verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    info!("Starting MJPEG gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    // Validate CLI configuration
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(e);
    }

    // Initialize GStreamer (infrastructure concern)
    gstreamer::init()?;
    info!("GStreamer initialized");

    // Initialize metrics
    PrometheusReporter::init_metrics()?;
    info!("Metrics initialized");

    // Convert CLI config to domain configs
    let stream_config = config
        .to_stream_config()
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let codec = JpegCodec::new(config.jpeg_quality).map_err(|e| anyhow::anyhow!("{}", e))?;

    // Create infrastructure implementations (dependency injection)
    let registry = Arc::new(
        SqliteSourceRegistry::open(&config.db_path).map_err(|e| anyhow::anyhow!("{}", e))?,
    );
    info!("Registry opened at {:?}", config.db_path);

    let opener = Arc::new(GStreamerSourceOpener::new());
    let metrics_reporter = Arc::new(PrometheusReporter::new());

    // Create application services
    let registry_service = Arc::new(RegistryService::new(registry.clone()));
    let streaming_service = Arc::new(
        StreamingService::new(
            registry.clone(),
            opener,
            Arc::new(codec),
            metrics_reporter,
            stream_config,
        )
        .map_err(|e| anyhow::anyhow!("{}", e))?,
    );

    // Set up graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Handle Ctrl+C
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received (Ctrl+C)"),
            Err(err) => error!("Failed to listen for shutdown signal: {}", err),
        }
        let _ = shutdown_tx.send(true);
    });

    // Start metrics server
    let metrics_server = tokio::spawn(serve_metrics(
        config.metrics_port,
        registry.clone(),
        shutdown_signal(shutdown_rx.clone()),
    ));

    let (addr, api_server) = warp::serve(routes(registry_service, streaming_service))
        .bind_with_graceful_shutdown(
            ([0, 0, 0, 0], config.port),
            shutdown_signal(shutdown_rx.clone()),
        );

    info!("-------------------------------------------------------");
    info!("MJPEG Gateway Ready");
    info!("   API:     http://{}", addr);
    info!("   Stream:  http://{}/camera/<id>", addr);
    info!("   Metrics: http://0.0.0.0:{}/metrics", config.metrics_port);
    info!("   Health:  http://0.0.0.0:{}/health", config.metrics_port);
    info!("-------------------------------------------------------");

    let api_server = tokio::spawn(api_server);
    shutdown_signal(shutdown_rx).await;

    if tokio::time::timeout(SHUTDOWN_GRACE, api_server).await.is_err() {
        info!("Open streams still running after {:?}, exiting anyway", SHUTDOWN_GRACE);
    }
    metrics_server.await?;

    info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stopped| *stopped).await;
}
