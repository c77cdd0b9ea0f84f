use std::time::Duration;
use tracing::{info, warn};

use crate::{AppState, AppStateInner};

/// Background task that prunes uploads past the retention window.
///
/// Runs on an interval, drops stale `files` rows, then removes the files
/// from disk. A file already missing on disk is tolerated.
pub async fn run_cleanup_loop(state: AppState, retention_hours: u64, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match sweep_stale_files(&state, retention_hours).await {
            Ok(count) => {
                if count > 0 {
                    info!("Cleanup: pruned {} stale uploads", count);
                }
            }
            Err(e) => {
                warn!("Cleanup error: {}", e);
            }
        }
    }
}

pub async fn sweep_stale_files(
    state: &AppStateInner,
    retention_hours: u64,
) -> anyhow::Result<usize> {
    let stale = state.db.prune_stale_files(retention_hours)?;

    let count = stale.len();
    for filename in &stale {
        if let Err(e) = state.storage.delete(filename).await {
            warn!("Failed to delete stale upload {}: {}", filename, e);
        }
    }

    Ok(count)
}
