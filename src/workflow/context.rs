//! Everything a step action may touch while it runs.

use crate::config::{ForgeRepo, ReleaseConfig};
use crate::error::Result;
use crate::forge::ForgeOperations;
use crate::git::GitOperations;
use crate::issue::render_body;
use crate::progress::ProgressTracker;
use crate::state::ReleaseState;
use tokio_util::sync::CancellationToken;

/// The release issue being driven, and the body last written to it
#[derive(Debug, Clone)]
pub(crate) struct IssueHandle {
    pub number: u64,
    pub url: String,
    pub last_uploaded: String,
}

impl IssueHandle {
    /// Upload the rendered state if it differs from the last upload.
    ///
    /// Returns whether a write happened.
    pub async fn sync<F: ForgeOperations>(
        &mut self,
        forge: &F,
        repo: &ForgeRepo,
        state: &ReleaseState,
    ) -> Result<bool> {
        let body = render_body(state);
        if body == self.last_uploaded {
            return Ok(false);
        }
        forge.update_issue_body(repo, self.number, &body).await?;
        log::info!("Updated release issue #{}", self.number);
        self.last_uploaded = body;
        Ok(true)
    }
}

/// Borrowed view of the orchestrator handed to a step action
pub(crate) struct StepContext<'a, F, G> {
    pub config: &'a ReleaseConfig,
    pub forge: &'a F,
    pub git: &'a G,
    pub state: &'a mut ReleaseState,
    pub progress: &'a ProgressTracker,
    pub cancel: &'a CancellationToken,
    pub issue: &'a mut IssueHandle,
}

impl<F: ForgeOperations, G: GitOperations> StepContext<'_, F, G> {
    /// Persist what the action has recorded so far, before a long wait or a
    /// write that cannot be repeated.
    pub async fn persist(&mut self) -> Result<()> {
        self.issue
            .sync(self.forge, &self.config.repo, self.state)
            .await?;
        Ok(())
    }

    /// Body text of pull requests opened for the release
    pub fn pr_body(&self) -> String {
        format!(
            "Part of the {} checklist: {}",
            self.state.release, self.issue.url
        )
    }
}
