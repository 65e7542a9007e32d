use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use talkreel_core::{
    config::ServiceStatus,
    downloader::HttpAudioSource,
    load_config,
    media::{FfmpegComposer, FfmpegEnhancer},
    publisher::{TelegramPublisher, YouTubePublisher},
    stock::PexelsStockFootage,
    thumbnail::OpenAiThumbnailGenerator,
    validate_config, Config, InMemoryJobStore, JobStore, PipelineOrchestrator, PipelineServices,
};
use talkreel_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("TALKREEL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");

    config
        .media
        .ensure_dirs()
        .await
        .with_context(|| format!("Failed to create media directories under {:?}", config.media.root_dir))?;
    info!("Media root: {:?}", config.media.root_dir);

    let services = ServiceStatus::from(&config);
    info!(
        pexels = services.pexels,
        thumbnail = services.thumbnail,
        telegram = services.telegram,
        youtube = services.youtube,
        "External services"
    );

    let orchestrator = Arc::new(PipelineOrchestrator::new(
        config.orchestrator.clone(),
        Arc::new(InMemoryJobStore::new()) as Arc<dyn JobStore>,
        build_services(&config),
    ));
    info!("Pipeline orchestrator ready");

    let state = Arc::new(AppState::new(config.clone(), orchestrator));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Real collaborators, each writing into its own media subdirectory.
fn build_services(config: &Config) -> PipelineServices {
    let media = &config.media;

    PipelineServices::new(
        Arc::new(HttpAudioSource::new(
            config.downloader.clone(),
            media.audio_dir(),
        )),
        Arc::new(FfmpegEnhancer::new(config.ffmpeg.clone(), media.audio_dir())),
        Arc::new(PexelsStockFootage::new(
            config.pexels.clone(),
            media.stock_dir(),
        )),
        Arc::new(OpenAiThumbnailGenerator::new(
            config.thumbnail.clone(),
            media.thumbnails_dir(),
        )),
        Arc::new(FfmpegComposer::new(
            config.ffmpeg.clone(),
            media.video_dir(),
            media.output_dir(),
        )),
    )
    .with_publisher(Arc::new(TelegramPublisher::new(config.telegram.clone())))
    .with_publisher(Arc::new(YouTubePublisher::new(config.youtube.clone())))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
