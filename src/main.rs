use anyhow::Context;
use clap::Parser;
use crop_advisor::{
    api::{build_router, AppState},
    config::Config,
    ml::ModelArtifact,
    telemetry,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "crop-advisor")]
#[command(about = "Crop recommendation prediction service", version, long_about = None)]
struct Args {
    /// Model artifact to serve (overrides model.artifact_path)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Bind address (overrides server.host)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides server.port)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load_or_default();
    if let Some(model) = args.model {
        config.model.artifact_path = model;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    telemetry::init_tracing(&config.observability);
    tracing::info!("Starting Crop Advisor v{}", env!("CARGO_PKG_VERSION"));

    // The service does not start without a usable model
    let artifact = ModelArtifact::load(&config.model.artifact_path).with_context(|| {
        format!(
            "failed to load model artifact {}",
            config.model.artifact_path.display()
        )
    })?;
    tracing::info!(
        labels = artifact.labels().len(),
        "✅ Model ready: {}",
        artifact.metadata.name
    );

    let app = build_router(AppState::new(Arc::new(artifact)));

    let http_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind {}", http_addr))?;

    tracing::info!("🚀 HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Prediction: POST http://{}/predict", http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Shutting down gracefully...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
