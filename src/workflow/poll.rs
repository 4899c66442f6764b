//! Merge polling.

use crate::config::ForgeRepo;
use crate::error::Result;
use crate::forge::ForgeOperations;
use crate::progress::ProgressTracker;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How a merge wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeWait {
    /// The pull request is merged
    Merged,
    /// The operator gave up waiting
    Cancelled,
}

/// Poll the forge until the pull request at `url` is merged.
///
/// Checks immediately, then every `interval`. Cancellation interrupts both
/// the pending forge call and the sleep; nothing already done is undone.
pub async fn wait_for_merge<F: ForgeOperations>(
    forge: &F,
    repo: &ForgeRepo,
    url: &str,
    interval: Duration,
    progress: &ProgressTracker,
    cancel: &CancellationToken,
) -> Result<MergeWait> {
    progress.note(format!("Waiting for {} to be merged", url));
    loop {
        let merged = tokio::select! {
            _ = cancel.cancelled() => return Ok(MergeWait::Cancelled),
            merged = forge.is_pr_merged(repo, url) => merged?,
        };
        if merged {
            log::info!("{} merged", url);
            return Ok(MergeWait::Merged);
        }

        log::debug!("{} not merged yet, polling again in {:?}", url, interval);
        tokio::select! {
            _ = cancel.cancelled() => return Ok(MergeWait::Cancelled),
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
