// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Vesper daemon: serves the local CalDAV endpoint and runs the background
//! sync loop against configured remote accounts.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use vesper_core::{Store, SyncEngine};
use vesper_server::{AppState, Credentials, router};

#[derive(Debug, Parser)]
#[command(name = "vesper", about = "Personal calendar store with CalDAV serving and sync")]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "vesper.toml")]
    config: PathBuf,
}

#[derive(Debug, Default, serde::Deserialize)]
struct Config {
    /// Listen address for the CalDAV endpoint.
    listen: Option<SocketAddr>,

    /// Database file; omitted means in-memory (useful for trying things
    /// out, nothing survives a restart).
    db_path: Option<PathBuf>,

    /// CalDAV principal credentials. Without them the server answers 503.
    credentials: Option<Credentials>,

    /// Seconds between background sync passes.
    sync_interval_secs: Option<u64>,
}

const DEFAULT_LISTEN: &str = "127.0.0.1:5232";
const DEFAULT_SYNC_INTERVAL: u64 = 300;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(&args.config)?;

    let listen = config
        .listen
        .unwrap_or_else(|| DEFAULT_LISTEN.parse().expect("default listen addr"));

    let store = Store::open(config.db_path.clone()).await?;
    let engine = SyncEngine::new(store.clone());

    let interval = Duration::from_secs(config.sync_interval_secs.unwrap_or(DEFAULT_SYNC_INTERVAL));
    tokio::spawn(sync_loop(engine, interval));

    if config.credentials.is_none() {
        tracing::warn!("no credentials configured; CalDAV requests will be answered with 503");
    }

    let app = router(AppState {
        store,
        credentials: config.credentials,
    });

    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!(%listen, "vesper listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn load_config(path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
    match std::fs::read_to_string(path) {
        Ok(raw) => Ok(toml::from_str(&raw)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Background sync: best-effort, sequential, one pass in flight at a time.
/// Awaiting each pass before the next tick is the single in-flight guard
/// the engine requires.
async fn sync_loop(engine: SyncEngine, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        match engine.sync_all_accounts().await {
            Ok(report) => {
                if report.synced > 0 || !report.errors.is_empty() {
                    tracing::info!(
                        synced = report.synced,
                        errors = ?report.errors,
                        "background sync pass finished"
                    );
                }
            }
            Err(e) => tracing::warn!(error = %e, "background sync pass failed"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
    }
}
