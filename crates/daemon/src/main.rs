// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! aod: the Agent Orchestrator daemon.
//!
//! One process per configuration file: holds the storage-root lock, serves
//! the webhook endpoints, and runs the lifecycle poll until terminated.

use ao_adapters::PluginRegistry;
use ao_config::Config;
use ao_core::SystemClock;
use ao_daemon::{router, AppCtx};
use ao_engine::{LifecycleManager, SessionManager, TriggerEngine};
use ao_storage::MetadataStore;
use fs2::FileExt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
enum DaemonError {
    #[error("config: {0}")]
    Config(#[from] ao_config::ConfigError),

    #[error("storage: {0}")]
    Storage(#[from] ao_storage::StoreError),

    #[error("another daemon already holds {0}")]
    Locked(PathBuf),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("aod: {}", e);
        std::process::exit(1);
    }
}

fn config_path_from_args() -> PathBuf {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" || arg == "-c" {
            if let Some(path) = args.next() {
                return PathBuf::from(path);
            }
        }
    }
    PathBuf::from("ao.yaml")
}

#[tokio::main]
async fn run() -> Result<(), DaemonError> {
    let config_path = config_path_from_args();
    let config = Arc::new(Config::load(&config_path)?);
    let state_root = ao_storage::storage_root_for_config(&config_path)?;
    std::fs::create_dir_all(state_root.join("logs"))?;

    // Rolling daemon log with env-filterable levels; the guard must live
    // for the life of the process.
    let appender = tracing_appender::rolling::never(state_root.join("logs"), "daemon.log");
    let (writer, _guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    // Single instance per storage root.
    let lock_path = state_root.join("daemon.pid");
    let mut lock_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)?;
    if lock_file.try_lock_exclusive().is_err() {
        return Err(DaemonError::Locked(lock_path));
    }
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    let registry = Arc::new(PluginRegistry::standard());
    let store = Arc::new(MetadataStore::open(&state_root)?);
    let clock = SystemClock;
    let sm = Arc::new(SessionManager::new(
        config.clone(),
        registry.clone(),
        store,
        state_root.clone(),
        clock,
    ));
    let lifecycle =
        LifecycleManager::new(sm.clone(), config.clone(), registry.clone(), clock);
    let triggers = TriggerEngine::new(Duration::from_secs(600), clock);
    let ctx = Arc::new(AppCtx { config: config.clone(), registry, sm, triggers, clock });

    let period = Duration::from_secs(config.poll_interval_secs.max(1));
    let poller = tokio::spawn(async move { lifecycle.run(period).await });

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .map_err(|source| DaemonError::Bind { addr: config.listen.clone(), source })?;
    tracing::info!(addr = %config.listen, state_root = %state_root.display(), "aod listening");

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    poller.abort();
    if let Err(e) = std::fs::remove_file(&lock_path) {
        tracing::warn!(error = %e, "failed to remove pid file");
    }
    tracing::info!("aod shutdown complete");
    Ok(())
}
