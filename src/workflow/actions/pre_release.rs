//! Prerequisites and Pre-Release actions.

use super::head_branch;
use super::pull_request::{CHANGE_PR_SUB_STEPS, ChangePr, ChangeRequest, open_change_pr, short_sha};
use crate::error::Result;
use crate::forge::{ForgeOperations, NewPullRequest};
use crate::git::{CommitOutcome, GitOperations};
use crate::state::LinkedItem;
use crate::steps::StepId;
use crate::version::{enable_code_freeze, set_version_in_file, write_release_notes_stub};
use crate::workflow::StepOutcome;
use crate::workflow::context::StepContext;
use crate::workflow::poll::{MergeWait, wait_for_merge};

/// Color of the backport label
const BACKPORT_LABEL_COLOR: &str = "fbca04";

/// Sub-steps of the Release PR action when it runs to the end
const RELEASE_PR_SUB_STEPS: usize = 11;

pub(super) async fn check_prs_issues<F: ForgeOperations, G: GitOperations>(
    ctx: &mut StepContext<'_, F, G>,
) -> Result<StepOutcome> {
    ctx.progress.start(2);
    let milestone = ctx.state.release.milestone();
    let open = ctx
        .forge
        .list_open_on_milestone(&ctx.config.repo, &milestone)
        .await?;
    ctx.progress
        .report_step(format!("{} open on milestone {}", open.len(), milestone));

    let group = &mut ctx.state.checklist.check_prs_issues;
    group.refresh(&open);
    if group.is_done() {
        ctx.progress.report_step("Milestone is clear");
    } else {
        ctx.progress.report_step(format!(
            "{} still open, run this step again once they are closed",
            group.open_items().count()
        ));
    }
    Ok(StepOutcome::Done { url: None })
}

pub(super) async fn create_release_branch<F: ForgeOperations, G: GitOperations>(
    ctx: &mut StepContext<'_, F, G>,
) -> Result<StepOutcome> {
    let config = ctx.config;
    let working = &config.working;
    let release = &ctx.state.release;
    let branch = config.release_branch(release);
    let label = config.backport_label(release);
    let url = format!("https://github.com/{}/tree/{}", config.repo, branch);
    ctx.progress.start(6);

    ctx.git.fetch(working, &config.remote).await?;
    ctx.progress.report_step(format!("Fetched {}", config.remote));

    if ctx
        .git
        .branch_exists_on_remote(working, &config.remote, &branch)
        .await?
    {
        // An earlier run may have pushed the branch and stopped before the label
        ctx.forge
            .create_label(&config.repo, &label, BACKPORT_LABEL_COLOR)
            .await?;
        ctx.progress
            .finish(format!("{} already exists on {}", branch, config.remote));
        ctx.state.checklist.create_release_branch.complete(Some(url));
        return Ok(StepOutcome::NothingToDo);
    }

    ctx.git.checkout(working, &config.default_branch).await?;
    ctx.progress
        .report_step(format!("Checked out {}", config.default_branch));
    ctx.git
        .reset_hard(working, &config.remote_ref(&config.default_branch))
        .await?;
    ctx.progress.report_step(format!(
        "Reset to {}",
        config.remote_ref(&config.default_branch)
    ));
    ctx.git.create_branch(working, &branch).await?;
    ctx.progress.report_step(format!("Created {}", branch));
    ctx.git.push_branch(working, &config.remote, &branch).await?;
    ctx.progress.report_step(format!("Pushed {}", branch));
    ctx.forge
        .create_label(&config.repo, &label, BACKPORT_LABEL_COLOR)
        .await?;
    ctx.progress.report_step(format!("Created label '{}'", label));

    ctx.state
        .checklist
        .create_release_branch
        .complete(Some(url.clone()));
    Ok(StepOutcome::Done { url: Some(url) })
}

pub(super) async fn code_freeze<F: ForgeOperations, G: GitOperations>(
    ctx: &mut StepContext<'_, F, G>,
) -> Result<StepOutcome> {
    let config = ctx.config;
    let release = ctx.state.release.clone();
    ctx.progress.start(CHANGE_PR_SUB_STEPS);

    let url = match ctx.state.checklist.code_freeze.url.clone() {
        Some(url) => {
            ctx.progress.finish(format!("Code freeze PR already recorded: {}", url));
            url
        }
        None => {
            let workflow = config.files.code_freeze_workflow.clone();
            let request = ChangeRequest {
                repo: &config.repo,
                working: &config.working,
                remote: &config.remote,
                base: config.release_branch(&release),
                head: head_branch(StepId::CodeFreeze, &release),
                title: format!("Code freeze for {}", release.tag()),
                labels: config.labels.pull_requests.clone(),
            };
            match open_change_pr(ctx, request, |working| {
                enable_code_freeze(&working.path(&workflow))
            })
            .await?
            {
                ChangePr::NothingToCommit => {
                    ctx.state.checklist.code_freeze.complete(None);
                    return Ok(StepOutcome::NothingToDo);
                }
                ChangePr::Open(url) => {
                    ctx.state.checklist.code_freeze.url = Some(url.clone());
                    ctx.persist().await?;
                    url
                }
            }
        }
    };

    match wait_for_merge(
        ctx.forge,
        &config.repo,
        &url,
        config.poll_interval,
        ctx.progress,
        ctx.cancel,
    )
    .await?
    {
        MergeWait::Cancelled => Ok(StepOutcome::Cancelled),
        MergeWait::Merged => {
            ctx.state.checklist.code_freeze.complete(Some(url.clone()));
            Ok(StepOutcome::Done { url: Some(url) })
        }
    }
}

pub(super) async fn update_snapshot_main<F: ForgeOperations, G: GitOperations>(
    ctx: &mut StepContext<'_, F, G>,
) -> Result<StepOutcome> {
    let config = ctx.config;
    let release = ctx.state.release.clone();
    let version = release.next_main_dev_version();
    let version_file = config.files.version_file.clone();
    ctx.progress.start(CHANGE_PR_SUB_STEPS);

    let request = ChangeRequest {
        repo: &config.repo,
        working: &config.working,
        remote: &config.remote,
        base: config.default_branch.clone(),
        head: head_branch(StepId::UpdateSnapshotMain, &release),
        title: format!("Set {} version to {}", config.default_branch, version),
        labels: config.labels.pull_requests.clone(),
    };
    let outcome = open_change_pr(ctx, request, |working| {
        set_version_in_file(&working.path(&version_file), &version)
    })
    .await?;
    Ok(record_pr(&mut ctx.state.checklist.update_snapshot_main, outcome))
}

pub(super) async fn create_milestone<F: ForgeOperations, G: GitOperations>(
    ctx: &mut StepContext<'_, F, G>,
) -> Result<StepOutcome> {
    let milestone = ctx.state.release.next_milestone();
    ctx.progress.start(1);
    let url = ctx
        .forge
        .create_milestone(&ctx.config.repo, &milestone)
        .await?;
    ctx.progress.report_step(format!("Milestone {} ready", milestone));
    ctx.state
        .checklist
        .create_milestone
        .complete(Some(url.clone()));
    Ok(StepOutcome::Done { url: Some(url) })
}

/// Open the Release PR bumping the version and stubbing the release notes.
///
/// Sub-steps: fetch, checkout, reset, look for an open PR, then branch,
/// version bump, notes stub, commit, push, open PR and a final report.
pub(super) async fn create_release_pr<F: ForgeOperations, G: GitOperations>(
    ctx: &mut StepContext<'_, F, G>,
) -> Result<StepOutcome> {
    let config = ctx.config;
    let working = &config.working;
    let release = ctx.state.release.clone();
    let base = config.release_branch(&release);
    let head = head_branch(StepId::CreateReleasePr, &release);
    let title = format!("Release {}", release.release_version_string());
    let progress = ctx.progress;
    progress.start(RELEASE_PR_SUB_STEPS);

    ctx.git.fetch(working, &config.remote).await?;
    progress.report_step(format!("Fetched {}", config.remote));
    ctx.git.checkout(working, &base).await?;
    progress.report_step(format!("Checked out {}", base));
    ctx.git.reset_hard(working, &config.remote_ref(&base)).await?;
    progress.report_step(format!("Reset to {}", config.remote_ref(&base)));

    if let Some(pr) = ctx
        .forge
        .find_open_pr_by_title(&config.repo, &title)
        .await?
    {
        progress.report_step("Looked for an open Release PR");
        progress.set_total(5);
        progress.report_step(format!("Release PR already open: {}", pr.url));
        ctx.state
            .checklist
            .create_release_pr
            .complete(Some(pr.url.clone()));
        return Ok(StepOutcome::Done { url: Some(pr.url) });
    }
    progress.report_step("No open Release PR");

    ctx.git.create_branch(working, &head).await?;
    progress.report_step(format!("Created branch {}", head));

    let version_file = working.path(&config.files.version_file);
    set_version_in_file(&version_file, &release.release_version_string())?;
    progress.report_step(format!(
        "Set version to {}",
        release.release_version_string()
    ));

    let notes = working.path(&config.release_notes_path(&release));
    if write_release_notes_stub(&notes, &release.release_version_string())? {
        progress.report_step(format!("Created {}", notes.display()));
    } else {
        progress.report_step("Release notes already present");
    }

    match ctx.git.commit_all(working, &title).await? {
        CommitOutcome::NothingToCommit => {
            progress.finish("Nothing to commit, no Release PR needed");
            ctx.state.checklist.create_release_pr.complete(None);
            return Ok(StepOutcome::NothingToDo);
        }
        CommitOutcome::Committed { sha } => {
            progress.report_step(format!("Committed {}", short_sha(&sha)));
        }
    }

    ctx.git.force_push_branch(working, &config.remote, &head).await?;
    progress.report_step(format!("Pushed {}", head));

    let pr = ctx
        .forge
        .create_pr(
            &config.repo,
            &NewPullRequest {
                title,
                body: ctx.pr_body(),
                base,
                head,
                labels: config.labels.pull_requests.clone(),
            },
        )
        .await?;
    progress.report_step(format!("Opened {}", pr.url));
    ctx.state
        .checklist
        .create_release_pr
        .complete(Some(pr.url.clone()));
    progress.report_step("Release PR created");
    Ok(StepOutcome::Done { url: Some(pr.url) })
}

/// Record a change PR on a linked item; the item is done either way
pub(super) fn record_pr(item: &mut LinkedItem, outcome: ChangePr) -> StepOutcome {
    match outcome {
        ChangePr::Open(url) => {
            item.complete(Some(url.clone()));
            StepOutcome::Done { url: Some(url) }
        }
        ChangePr::NothingToCommit => {
            item.complete(None);
            StepOutcome::NothingToDo
        }
    }
}
