//! Scan/maintenance loop
//!
//! One dedicated timer-driven task drives the engine: scans on a short
//! interval, flushes the statement queue and checks the backup on a longer
//! one. Cancellation is cooperative - the token is checked at iteration
//! boundaries, never mid-operation - and the pending statement queue is
//! drained before the loop exits.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::WatchEngine;

/// Run the engine loop until `shutdown` fires.
///
/// `scan_interval` should be a small multiple shorter than
/// `maintenance_interval`: the scan is cheap and frequent, persistence and
/// backup are coarse and periodic.
pub async fn run(
    engine: Arc<WatchEngine>,
    scan_interval: Duration,
    maintenance_interval: Duration,
    shutdown: CancellationToken,
) {
    info!(
        scan_secs = scan_interval.as_secs(),
        maintenance_secs = maintenance_interval.as_secs(),
        "Watch engine loop started"
    );

    let mut scan = tokio::time::interval(scan_interval);
    let mut maintenance = tokio::time::interval(maintenance_interval);
    // both intervals fire immediately; restore already ran, so consume the
    // zero ticks and wait a full period before the first pass
    scan.tick().await;
    maintenance.tick().await;

    loop {
        tokio::select! {
            _ = scan.tick() => {
                debug!("Scanning for file changes");
                engine.scan().await;
            }
            _ = maintenance.tick() => {
                engine.flush().await;
                engine.backup_check().await;
            }
            _ = shutdown.cancelled() => {
                info!("Shutdown signal received, draining statement queue");
                engine.shutdown().await;
                break;
            }
        }
    }

    info!("Watch engine loop terminated");
}
