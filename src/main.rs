//! Arcade server binary.

use arcade::{
    api::server::{ApiConfig, ApiServer},
    config::ConfigLoader,
    engine::MiniGameEngine,
    payments::InMemoryPointsSink,
    rng::StdRandomSource,
};
use clap::Parser;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "arcade")]
#[command(about = "Mini-game session engine server", long_about = None)]
struct Args {
    /// Path to TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// API server host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// API server port (overrides config)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arcade=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = args.config {
        loader = loader.with_path(path);
    }
    let mut settings = loader.load()?;

    if let Some(host) = args.host {
        settings.api.host = host;
    }
    if let Some(port) = args.port {
        settings.api.port = port;
    }

    let catalog = settings.catalog()?;
    let engine = Arc::new(MiniGameEngine::new(
        catalog,
        Arc::new(InMemoryPointsSink::new()),
        Arc::new(StdRandomSource),
    ));
    engine.start_reaper(settings.reaper.sweep_interval(), settings.reaper.grace());

    let api_config = ApiConfig {
        host: settings.api.host.clone(),
        port: settings.api.port,
        allowed_origins: settings.api.allowed_origins.clone(),
        request_timeout_secs: settings.api.request_timeout_secs,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    ApiServer::new(api_config, engine).run().await
}
