//! Chirpy - a small social posting service

use anyhow::{Context, Result};
use chirpy_api::{AppState, AuthSettings, create_router};
use chirpy_db::Database;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{Config, LoggingConfig};

/// Chirpy - a small social posting service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "CHIRPY_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "CHIRPY_PORT")]
    port: Option<u16>,

    /// Access token signing secret
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// API key expected from the payment provider
    #[arg(long, env = "POLKA_KEY", hide_env_values = true)]
    polka_key: Option<String>,

    /// Deployment platform (`dev` enables the admin reset)
    #[arg(long, env = "PLATFORM")]
    platform: Option<String>,

    /// SQLite database path
    #[arg(long, env = "DB_PATH")]
    db_path: Option<String>,
}

impl Args {
    /// Apply command line and environment overrides on top of the file
    fn apply(self, config: &mut Config) {
        if let Some(bind) = self.bind {
            config.server.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(secret) = self.jwt_secret {
            config.auth.jwt_secret = secret;
        }
        if let Some(key) = self.polka_key {
            config.auth.polka_key = key;
        }
        if let Some(platform) = self.platform {
            config.auth.platform = platform;
        }
        if let Some(path) = self.db_path {
            config.database.path = path;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    args.apply(&mut config);
    config.validate()?;

    init_logging(&config.logging);

    info!("Starting Chirpy v{}", env!("CARGO_PKG_VERSION"));
    config.warn_insecure();

    // Create the database directory
    if let Some(parent) = Path::new(&config.database.path).parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create database directory {:?}", parent))?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_url).await?;

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let state = AppState::new(
        db,
        AuthSettings {
            jwt_secret: config.auth.jwt_secret.clone(),
            polka_key: config.auth.polka_key.clone(),
            platform: config.auth.platform.clone(),
            access_token_ttl: config.auth.access_token_ttl()?,
            refresh_token_ttl: config.auth.refresh_token_ttl()?,
            leeway: config.auth.leeway()?,
        },
    );

    let app = create_router(state, &config.server.static_dir, Some(Arc::new(metrics_handle)))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);
    info!("Serving static files from {}", config.server.static_dir);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "chirpy",
            "--port",
            "9000",
            "--platform",
            "dev",
            "--db-path",
            "/tmp/chirpy-test.db",
        ]);
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.platform, "dev");
        assert_eq!(config.database.path, "/tmp/chirpy-test.db");
    }
}
