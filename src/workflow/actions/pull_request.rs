//! Branch, edit, commit and open a pull request, or find the one already open.

use crate::config::{ForgeRepo, WorkingContext};
use crate::error::Result;
use crate::forge::{ForgeOperations, NewPullRequest};
use crate::git::{CommitOutcome, GitOperations};
use crate::workflow::context::StepContext;

/// Sub-steps reported by [`open_change_pr`] when it runs to the end
pub(super) const CHANGE_PR_SUB_STEPS: usize = 9;

/// A pull request carrying a file change
pub(super) struct ChangeRequest<'r> {
    pub repo: &'r ForgeRepo,
    pub working: &'r WorkingContext,
    pub remote: &'r str,
    pub base: String,
    pub head: String,
    pub title: String,
    pub labels: Vec<String>,
}

/// Result of [`open_change_pr`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ChangePr {
    /// Opened now or found already open
    Open(String),
    /// The edit left the base branch unchanged
    NothingToCommit,
}

/// Open a pull request applying `edit` on top of `base`.
///
/// An open pull request with the same title is reused. `edit` returns
/// whether it changed anything; an unchanged tree ends the action early.
pub(super) async fn open_change_pr<F, G, E>(
    ctx: &StepContext<'_, F, G>,
    request: ChangeRequest<'_>,
    edit: E,
) -> Result<ChangePr>
where
    F: ForgeOperations,
    G: GitOperations,
    E: FnOnce(&WorkingContext) -> Result<bool> + Send,
{
    let progress = ctx.progress;
    let remote = request.remote;
    let working = request.working;

    if let Some(pr) = ctx
        .forge
        .find_open_pr_by_title(request.repo, &request.title)
        .await?
    {
        progress.finish(format!("Pull request already open: {}", pr.url));
        return Ok(ChangePr::Open(pr.url));
    }
    progress.report_step(format!("No open pull request titled '{}'", request.title));

    ctx.git.fetch(working, remote).await?;
    progress.report_step(format!("Fetched {}", remote));
    ctx.git.checkout(working, &request.base).await?;
    progress.report_step(format!("Checked out {}", request.base));
    ctx.git
        .reset_hard(working, &format!("{}/{}", remote, request.base))
        .await?;
    progress.report_step(format!("Reset {} to {}/{}", request.base, remote, request.base));
    ctx.git.create_branch(working, &request.head).await?;
    progress.report_step(format!("Created branch {}", request.head));

    if edit(working)? {
        progress.report_step("Updated files");
    } else {
        progress.report_step("Files already up to date");
    }

    match ctx.git.commit_all(working, &request.title).await? {
        CommitOutcome::NothingToCommit => {
            progress.finish("Nothing to commit");
            return Ok(ChangePr::NothingToCommit);
        }
        CommitOutcome::Committed { sha } => {
            progress.report_step(format!("Committed {}", short_sha(&sha)));
        }
    }

    ctx.git.force_push_branch(working, remote, &request.head).await?;
    progress.report_step(format!("Pushed {}", request.head));

    let pr = ctx
        .forge
        .create_pr(
            request.repo,
            &NewPullRequest {
                title: request.title,
                body: ctx.pr_body(),
                base: request.base,
                head: request.head,
                labels: request.labels,
            },
        )
        .await?;
    progress.report_step(format!("Opened {}", pr.url));
    Ok(ChangePr::Open(pr.url))
}

pub(super) fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}
