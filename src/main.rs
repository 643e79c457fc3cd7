// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use axum_server::Handle;
use clap::Parser;
use columbus::config::Config;
use columbus::constants::{GITHUB_API_BASE, SHUTDOWN_DRAIN_SECS};
use columbus::context::Context;
use columbus::db::Store;
use columbus::dns::resolver::{HickoryQuerier, Querier};
use columbus::version::{self, UpdateStatus};
use columbus::{refresh, server, stats};
use tracing::{debug, info};

/// Passive-DNS inventory service.
#[derive(Debug, Parser)]
#[command(name = "columbus", version = version::VERSION)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Query GitHub for the latest release and exit (0 up to date,
    /// 1 update available, 2 error)
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("columbus")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Initialize logging with custom format
///
/// Respects `RUST_LOG` environment variable if set, otherwise defaults to INFO level.
/// Respects `RUST_LOG_FORMAT` environment variable for output format (json or text).
fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    debug!("logging initialized");
}

async fn async_main() -> Result<()> {
    let cli = Cli::parse();
    initialize_logging();

    if cli.check {
        return run_check().await;
    }

    let Some(config_path) = cli.config else {
        bail!("--config <PATH> is required");
    };

    info!(path = %config_path.display(), "parsing config file");
    let config = Config::load(&config_path)?;

    info!("connecting to datastore");
    let store = Store::connect(&config.database_uri).await?;

    let querier: Arc<dyn Querier> = Arc::new(HickoryQuerier::from_config(&config)?);
    let ctx = Context::new(config, store, querier);

    info!("starting refresh pipeline");
    let _refresh_tasks = refresh::scheduler::spawn(&ctx);
    let _stats_tasks = stats::spawn(&ctx);

    // Refresh progress is idempotent, so the workers are not drained on
    // shutdown; once HTTP is down the process simply exits and resumes the
    // pipeline on the next start.
    let handle = Handle::new();
    tokio::spawn(shutdown_on_signal(handle.clone()));

    info!("starting HTTP server");
    server::run(ctx, handle).await
}

async fn shutdown_on_signal(handle: Handle) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!(
        drain_secs = SHUTDOWN_DRAIN_SECS,
        "SIGINT received, draining HTTP connections"
    );
    handle.graceful_shutdown(Some(Duration::from_secs(SHUTDOWN_DRAIN_SECS)));
}

async fn run_check() -> Result<()> {
    match version::check_latest(GITHUB_API_BASE).await {
        Ok(UpdateStatus::UpToDate) => {
            println!("columbus {} is up to date", version::VERSION);
            exit(0);
        }
        Ok(UpdateStatus::UpdateAvailable(tag)) => {
            println!(
                "update available: {tag} (running {})",
                version::VERSION
            );
            exit(1);
        }
        Err(err) => {
            eprintln!("failed to check for updates: {err:#}");
            exit(2);
        }
    }
}
