//! Local Tier Cleanup Task
//!
//! Background task that periodically removes expired local-tier entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::LocalStore;

/// Spawns a task that sweeps expired entries from the local tier every
/// `cleanup_interval_secs` seconds.
///
/// Expired entries are also dropped lazily on access; the sweep keeps
/// entries nobody reads again from holding capacity.
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cleanup_handle = spawn_cleanup_task(cache.local_store(), 60);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(local: Arc<LocalStore>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting local tier cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = local.cleanup_expired();
            if removed > 0 {
                info!("Local tier cleanup: removed {} expired entries", removed);
            } else {
                debug!("Local tier cleanup: no expired entries found");
            }
        }
    })
}
