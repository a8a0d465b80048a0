//! medir-web - practice directory web server
//!
//! Serves the public search pages over the Directory Snapshot and the
//! password-protected management pages over the Entity Store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use medir_common::config::{Config, ConfigOverrides, PASSWORD_ENV, ROOT_FOLDER_ENV};
use medir_common::db::init_database;
use medir_web::{build_router, AppState};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for medir-web
#[derive(Parser, Debug)]
#[command(name = "medir-web")]
#[command(about = "Medical practice directory web server")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder holding the database and snapshot files
    #[arg(short, long, env = ROOT_FOLDER_ENV)]
    root_folder: Option<PathBuf>,

    /// Entity Store database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Directory Snapshot JSON file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Management password
    #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
    password: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            root_folder: self.root_folder.clone(),
            database_path: self.database.clone(),
            snapshot_path: self.snapshot.clone(),
            host: self.host.clone(),
            port: self.port,
            password: self.password.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Configuration decides the default log level, so it is read first
    let config = Config::load(args.config.as_deref(), args.overrides());
    let level = config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("medir_web={0},medir_common={0},tower_http={0}", level).into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting medir-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    config.ensure_root_folder()?;
    info!("Root folder: {}", config.root_folder.display());
    info!("Database path: {}", config.database_path.display());
    info!("Snapshot path: {}", config.snapshot_path.display());

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    let state = AppState::from_config(pool, &config)?;
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("medir-web listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("medir-web stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
