//! s3gate - token-gated upload gateway
//!
//! Accepts `POST /upload` multipart requests carrying an `image` file and
//! writes the file to an S3 bucket under its base name.

mod config;
mod router;

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use s3gate_upload::{
    storage::{EphemeralStore, ObjectStore, S3Store},
    UploadState,
};

use crate::config::{GatewayConfig, StorageBackend};

#[derive(Parser, Debug)]
#[command(name = "s3gate")]
#[command(about = "Token-gated gateway relaying multipart uploads to S3", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "S3GATE_PORT")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "S3GATE_HOST")]
    host: String,

    /// Configuration file (defaults to ./s3gate.toml when present)
    #[arg(short, long, env = "S3GATE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "S3GATE_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "s3gate={level},s3gate_auth={level},s3gate_upload={level},tower_http=debug",
                    level = args.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(args).await {
        error!("s3gate failed: {e:#}");
        return Err(e);
    }

    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config =
        GatewayConfig::load(args.config.as_deref()).context("invalid gateway configuration")?;
    let token = Arc::new(config.api_token()?);

    let store: Arc<dyn ObjectStore> = match config.storage {
        StorageBackend::S3 => Arc::new(S3Store::load(&config.s3_store_config()).await),
        StorageBackend::Memory => {
            warn!("Using in-memory storage; uploads are lost on exit");
            Arc::new(EphemeralStore::with_bucket(&config.bucket))
        }
    };

    info!("Starting s3gate...");
    info!("  Bucket: {}", config.bucket);
    info!("  Storage: {:?}", config.storage);
    match config.max_upload_size {
        Some(limit) => info!("  Max upload size: {} bytes", limit),
        None => info!("  Max upload size: unlimited"),
    }

    let state = router::AppState {
        upload: Arc::new(UploadState {
            store,
            bucket: config.bucket.clone(),
        }),
        token,
        max_upload_size: config.max_upload_size,
    };

    // Create router
    let app = router::create_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", args.host, args.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
