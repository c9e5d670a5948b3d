//! Stratus daemon - background file synchronization service
//!
//! This binary runs as a long-lived service and handles:
//! - Periodic change-detection scans over the watched tree
//! - Persistence flushes and index-store backups
//! - Replication of file versions to the configured object store
//! - The unix-socket control interface for the `stratus` CLI
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! Startup wires the durable store, the replication coordinator, and the
//! watch engine together through their ports, restores the index, then
//! spawns three loops (engine, coordinator, control server). All loops are
//! driven by a shared `CancellationToken` triggered by SIGTERM or SIGINT;
//! the engine drains its pending statement queue before exiting.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stratus_core::ports::{IObjectStore, IReplicationQueue};
use stratus_core::{keys, Config};
use stratus_ipc::ControlServer;
use stratus_remote::{FsObjectStore, ReplicationCoordinator};
use stratus_store::SqliteIndexStore;
use stratus_watch::{runner, WatchEngine};

/// Main daemon service: configuration plus the shared shutdown token
struct DaemonService {
    config: Config,
    shutdown: CancellationToken,
}

impl DaemonService {
    fn new(config: Config, shutdown: CancellationToken) -> Self {
        Self { config, shutdown }
    }

    /// Wire the components, restore the index, and run all loops until
    /// shutdown.
    async fn run(&self) -> Result<()> {
        // The backup object name is a pure function of the master key;
        // without a key there is no backup slot, which is an unrecoverable
        // startup condition.
        let master_key = keys::master_key_from_hex(&self.config.secret.master_key)
            .context("secret.master_key must be set (hex) in the config file")?;
        let backup_object =
            keys::derive_backup_object_name(&master_key).context("backup name derivation failed")?;

        let store = Arc::new(
            SqliteIndexStore::open(&self.config.store.db_path)
                .await
                .context("failed to open index store")?,
        );

        let backend: Arc<dyn IObjectStore> = Arc::new(FsObjectStore::new(
            self.config.remote.object_root.clone(),
            1,
        ));
        let coordinator = Arc::new(ReplicationCoordinator::new(
            vec![backend],
            self.config.remote.download_dir.clone(),
        ));

        let engine = Arc::new(WatchEngine::new(
            store,
            Arc::clone(&coordinator) as Arc<dyn IReplicationQueue>,
            backup_object,
        ));
        coordinator.set_listener(engine.clone()).await;

        // restore precedes any scan
        engine
            .restore()
            .await
            .context("failed to restore index from durable store")?;

        let server = Arc::new(ControlServer::new(
            engine.clone(),
            Arc::clone(&coordinator) as Arc<dyn IReplicationQueue>,
            self.config.control.socket_path.clone(),
        ));

        let engine_task = tokio::spawn(runner::run(
            engine,
            Duration::from_secs(self.config.watch.scan_interval),
            Duration::from_secs(self.config.watch.maintenance_interval),
            self.shutdown.clone(),
        ));
        let coordinator_task = tokio::spawn(Arc::clone(&coordinator).run(
            Duration::from_secs(self.config.remote.poll_interval),
            self.shutdown.clone(),
        ));
        let server_task = tokio::spawn(server.run(self.shutdown.clone()));

        let (engine_result, coordinator_result, server_result) =
            tokio::join!(engine_task, coordinator_task, server_task);
        engine_result.context("engine loop panicked")?;
        coordinator_result.context("coordinator loop panicked")?;
        server_result.context("control server panicked")??;

        Ok(())
    }
}

/// Waits for SIGTERM or SIGINT and triggers the cancellation token.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = Config::default_path();
    let config = Config::load_or_default(&config_path);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();

    info!(config_path = %config_path.display(), "Stratus daemon starting (stratusd)");

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service = DaemonService::new(config, shutdown_token);
    let result = service.run().await;

    match &result {
        Ok(()) => info!("Stratus daemon shut down gracefully"),
        Err(e) => error!(error = %e, "Stratus daemon exiting with error"),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_token_propagates() {
        let token = CancellationToken::new();
        let child = token.child_token();
        token.cancel();
        assert!(token.is_cancelled());
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_default_config_intervals() {
        let config = Config::default();
        assert!(config.watch.scan_interval > 0);
        assert!(config.remote.poll_interval > 0);
    }
}
