use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use tower_http::trace::TraceLayer;

use web_auth::{AxumBridge, Config, StorageKind, handlers, telemetry};

/// Demo server with permission-guarded routes.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON permission catalog to serve from (switches storage to file)
    #[arg(long)]
    permission_file: Option<PathBuf>,

    /// Catalog cache lifetime in seconds
    #[arg(long)]
    ttl: Option<u64>,

    /// Address to listen on, e.g. 0.0.0.0:3000
    #[arg(long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(path) = args.permission_file {
        config.storage = StorageKind::File;
        config.storage_params.permission_file_path = path;
    }
    if let Some(ttl) = args.ttl {
        config.storage_params.ttl = ttl;
    }
    let addr = args.addr.unwrap_or_else(|| config.addr());

    telemetry::init(&config.logger_name);

    let context = config
        .build_context()
        .context("failed to load permission catalog")?;
    let bridge = AxumBridge::new(Arc::new(context));
    let app = handlers::router(&bridge).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
