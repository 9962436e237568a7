//! SayRight Scoring Engine - Main entry point
//!
//! Composition root: loads configuration and the pronunciation
//! dictionary, wires the capture device, recognition gateway, and
//! scoring pipeline together, then serves the HTTP control API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sayright_engine::api;
use sayright_engine::audio::CpalCapture;
use sayright_engine::config::TomlConfig;
use sayright_engine::phoneme::dict::{DictOptions, Dictionary};
use sayright_engine::pipeline::ScoringPipeline;
use sayright_engine::recognizer::HttpRecognizer;
use sayright_engine::SharedState;

/// Command-line arguments for sayright-engine
#[derive(Parser, Debug)]
#[command(name = "sayright-engine")]
#[command(about = "Pronunciation scoring engine for SayRight")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "SAYRIGHT_PORT")]
    port: Option<u16>,

    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Path to the CMU-format pronunciation dictionary
    #[arg(short, long, env = "SAYRIGHT_DICTIONARY")]
    dictionary: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Load bootstrap configuration (CLI > env > TOML > defaults)
    let config_path = sayright_common::config::resolve_config_path(
        args.config.as_deref(),
        "SAYRIGHT_CONFIG",
    )
    .context("Failed to resolve config file")?;

    let mut config = match config_path {
        Some(path) => TomlConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => TomlConfig::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(dictionary) = args.dictionary {
        config.dictionary_path = dictionary.into();
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SayRight scoring engine on port {}", config.port);

    // The dictionary is mandatory: the engine cannot score without it
    let dictionary = Arc::new(
        Dictionary::load(&config.dictionary_path, DictOptions::default())
            .with_context(|| {
                format!(
                    "Failed to load dictionary from {}",
                    config.dictionary_path.display()
                )
            })?,
    );
    info!(
        "Loaded pronunciation dictionary: {} entries from {}",
        dictionary.len(),
        config.dictionary_path.display()
    );

    // Capture device and recognition gateway handles
    let capture = Arc::new(CpalCapture::new(
        config.capture.device.clone(),
        config.capture.channels,
        config.capture.sample_rate,
    ));
    let recognizer = Arc::new(HttpRecognizer::new(
        config.recognizer.url.clone(),
        // Request timeout sits above the pipeline budget so the
        // pipeline's poll deadline governs
        Duration::from_secs(config.recognizer.timeout_secs + 5),
    ));
    info!("Recognizer endpoint: {}", config.recognizer.url);

    // Shared state and pipeline
    let state = Arc::new(SharedState::new());
    let pipeline = Arc::new(ScoringPipeline::new(
        Arc::clone(&dictionary),
        capture,
        recognizer,
        Arc::clone(&state),
        config.pipeline_config(),
    ));
    info!("Scoring pipeline initialized");

    // Build the application router
    let app_state = api::AppState {
        pipeline,
        state,
        dictionary,
        default_max_duration_secs: config.capture.max_duration_secs,
        port: config.port,
    };
    let app = api::create_router(app_state);

    // Create socket address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
