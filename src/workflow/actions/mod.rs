//! Step actions.
//!
//! Every action is safe to run again after a partial failure: it looks for
//! the branch, pull request, tag or release it would create before creating
//! it, and records links in the release state as soon as they exist.

mod pull_request;
mod post_release;
mod pre_release;
mod release;

use super::StepOutcome;
use super::context::StepContext;
use crate::error::Result;
use crate::forge::ForgeOperations;
use crate::git::GitOperations;
use crate::steps::StepId;
use crate::version::ReleaseVersion;

/// Run the action of `step`.
pub(crate) async fn run<F: ForgeOperations, G: GitOperations>(
    step: StepId,
    ctx: &mut StepContext<'_, F, G>,
) -> Result<StepOutcome> {
    match step {
        StepId::CheckPrsIssues => pre_release::check_prs_issues(ctx).await,
        StepId::CreateReleaseBranch => pre_release::create_release_branch(ctx).await,
        StepId::CodeFreeze => pre_release::code_freeze(ctx).await,
        StepId::UpdateSnapshotMain => pre_release::update_snapshot_main(ctx).await,
        StepId::CreateMilestone => pre_release::create_milestone(ctx).await,
        StepId::CreateReleasePr => pre_release::create_release_pr(ctx).await,
        StepId::MergeReleasePr => release::merge_release_pr(ctx).await,
        StepId::TagRelease => release::tag_release(ctx).await,
        StepId::ReleaseNotesMain => release::release_notes_main(ctx).await,
        StepId::BackToDevMode => release::back_to_dev_mode(ctx).await,
        StepId::CompanionRelease => release::companion_release(ctx).await,
        StepId::CloseMilestone => release::close_milestone(ctx).await,
        StepId::CloseIssue => post_release::close_issue(ctx).await,
        StepId::GeneralPrerequisites
        | StepId::SlackAnnouncement
        | StepId::CopyBranchProtection
        | StepId::BlogPostPr
        | StepId::MergeBlogPost
        | StepId::SlackPostRelease
        | StepId::CrossPostBlog => Ok(mark_done(step, ctx)),
    }
}

/// Manual steps: the operator did the work, the action only ticks the box
fn mark_done<F, G>(step: StepId, ctx: &mut StepContext<'_, F, G>) -> StepOutcome {
    ctx.progress.start(1);
    ctx.state.checklist.item_mut(step).set_done(true);
    ctx.progress
        .report_step(format!("Marked '{}' as done", step.label()));
    StepOutcome::Done { url: None }
}

/// Deterministic head branch of a pull request opened by `step`
fn head_branch(step: StepId, release: &ReleaseVersion) -> String {
    format!(
        "release-captain/{}-{}",
        step.id(),
        release.release_version_string()
    )
}
