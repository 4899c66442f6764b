//! Release phase actions.

use super::head_branch;
use super::pre_release::record_pr;
use super::pull_request::{CHANGE_PR_SUB_STEPS, ChangePr, ChangeRequest, open_change_pr};
use crate::error::{Result, WorkflowError};
use crate::forge::{ForgeOperations, NewRelease};
use crate::git::GitOperations;
use crate::steps::StepId;
use crate::version::set_version_in_file;
use crate::workflow::StepOutcome;
use crate::workflow::context::StepContext;
use crate::workflow::poll::{MergeWait, wait_for_merge};
use std::fs;

pub(super) async fn merge_release_pr<F: ForgeOperations, G: GitOperations>(
    ctx: &mut StepContext<'_, F, G>,
) -> Result<StepOutcome> {
    let config = ctx.config;
    let url = ctx
        .state
        .checklist
        .create_release_pr
        .url
        .clone()
        .ok_or_else(|| WorkflowError::MissingPrerequisite {
            step: StepId::MergeReleasePr.id().to_string(),
            reason: "no Release PR is recorded on the issue".to_string(),
        })?;
    ctx.progress.start(1);

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
            ctx.progress.report_step(format!("{} merged", url));
            ctx.state.checklist.merge_release_pr.done = true;
            Ok(StepOutcome::Done { url: Some(url) })
        }
    }
}

pub(super) async fn tag_release<F: ForgeOperations, G: GitOperations>(
    ctx: &mut StepContext<'_, F, G>,
) -> Result<StepOutcome> {
    let config = ctx.config;
    let working = &config.working;
    let release = ctx.state.release.clone();
    let branch = config.release_branch(&release);
    let tag = release.tag();
    let progress = ctx.progress;
    progress.start(5);

    ctx.git.fetch(working, &config.remote).await?;
    progress.report_step(format!("Fetched {}", config.remote));

    if ctx
        .git
        .tag_exists_on_remote(working, &config.remote, &tag)
        .await?
    {
        progress.report_step(format!("{} already on {}", tag, config.remote));
    } else {
        ctx.git
            .tag_and_push(
                working,
                &config.remote,
                &tag,
                &config.remote_ref(&branch),
                &format!("Release {}", release.release_version_string()),
            )
            .await?;
        progress.report_step(format!("Tagged and pushed {}", tag));
    }

    if let Some(url) = ctx.forge.find_release(&config.repo, &tag).await? {
        progress.finish(format!("Release {} already published", tag));
        ctx.state.checklist.tag_release.complete(Some(url.clone()));
        return Ok(StepOutcome::Done { url: Some(url) });
    }
    progress.report_step(format!("No release published for {}", tag));

    ctx.git.checkout(working, &branch).await?;
    ctx.git.reset_hard(working, &config.remote_ref(&branch)).await?;
    let notes_path = working.path(&config.release_notes_path(&release));
    if !notes_path.exists() {
        return Err(WorkflowError::MissingPrerequisite {
            step: StepId::TagRelease.id().to_string(),
            reason: format!("release notes not found at {}", notes_path.display()),
        }
        .into());
    }
    progress.report_step(format!("Release notes at {}", notes_path.display()));

    let url = ctx
        .forge
        .create_release(
            &config.repo,
            &NewRelease {
                tag: tag.clone(),
                title: tag.clone(),
                notes_path,
                is_latest: config.mark_latest.is_latest(&release),
                is_prerelease: release.rc() > 0,
            },
        )
        .await?;
    progress.report_step(format!("Published {}", url));
    ctx.state.checklist.tag_release.complete(Some(url.clone()));
    Ok(StepOutcome::Done { url: Some(url) })
}

pub(super) async fn release_notes_main<F: ForgeOperations, G: GitOperations>(
    ctx: &mut StepContext<'_, F, G>,
) -> Result<StepOutcome> {
    let config = ctx.config;
    let working = &config.working;
    let release = ctx.state.release.clone();
    let branch = config.release_branch(&release);
    let notes = config.release_notes_path(&release);
    ctx.progress.start(CHANGE_PR_SUB_STEPS + 1);

    ctx.git.fetch(working, &config.remote).await?;
    let content = ctx
        .git
        .read_file_at(working, &config.remote_ref(&branch), &notes)
        .await?;
    ctx.progress
        .report_step(format!("Read {} from {}", notes.display(), branch));

    let request = ChangeRequest {
        repo: &config.repo,
        working,
        remote: &config.remote,
        base: config.default_branch.clone(),
        head: head_branch(StepId::ReleaseNotesMain, &release),
        title: format!(
            "Release notes for {} on {}",
            release.release_version_string(),
            config.default_branch
        ),
        labels: config.labels.pull_requests.clone(),
    };
    let outcome = open_change_pr(ctx, request, |working| {
        let path = working.path(&notes);
        if fs::read_to_string(&path).is_ok_and(|existing| existing == content) {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &content)?;
        Ok(true)
    })
    .await?;
    Ok(record_pr(&mut ctx.state.checklist.release_notes_main, outcome))
}

pub(super) async fn back_to_dev_mode<F: ForgeOperations, G: GitOperations>(
    ctx: &mut StepContext<'_, F, G>,
) -> Result<StepOutcome> {
    let config = ctx.config;
    let release = ctx.state.release.clone();
    let version = release.dev_version();
    let version_file = config.files.version_file.clone();
    ctx.progress.start(CHANGE_PR_SUB_STEPS);

    let request = ChangeRequest {
        repo: &config.repo,
        working: &config.working,
        remote: &config.remote,
        base: config.release_branch(&release),
        head: head_branch(StepId::BackToDevMode, &release),
        title: format!(
            "Back to {} on {}",
            version,
            config.release_branch(&release)
        ),
        labels: config.labels.pull_requests.clone(),
    };
    let outcome = open_change_pr(ctx, request, |working| {
        set_version_in_file(&working.path(&version_file), &version)
    })
    .await?;
    Ok(record_pr(&mut ctx.state.checklist.back_to_dev_mode, outcome))
}

/// Release the companion project: version PR, merge, tag and forge release.
///
/// Runs entirely in the companion working copy. The version PR link is
/// recorded first so an interrupted run resumes at the merge wait.
pub(super) async fn companion_release<F: ForgeOperations, G: GitOperations>(
    ctx: &mut StepContext<'_, F, G>,
) -> Result<StepOutcome> {
    let config = ctx.config;
    let companion = config
        .companion
        .as_ref()
        .ok_or_else(|| WorkflowError::MissingPrerequisite {
            step: StepId::CompanionRelease.id().to_string(),
            reason: "no [companion] section in the configuration".to_string(),
        })?;
    let release = ctx.state.release.clone();
    let version = ctx.state.companion_release.clone();
    let tag = format!("v{}", version);
    let working = &companion.working;
    let progress = ctx.progress;
    progress.start(CHANGE_PR_SUB_STEPS + 4);

    let recorded_pr = ctx
        .state
        .checklist
        .companion_release
        .urls
        .iter()
        .find(|url| url.contains("/pull/"))
        .cloned();
    let pr_url = match recorded_pr {
        Some(url) => {
            progress.report_step(format!("Version PR already recorded: {}", url));
            Some(url)
        }
        None => {
            let version_file = companion.version_file.clone();
            let request = ChangeRequest {
                repo: &companion.repo,
                working,
                remote: &companion.remote,
                base: companion.default_branch.clone(),
                head: head_branch(StepId::CompanionRelease, &release),
                title: format!("Release {}", version),
                labels: Vec::new(),
            };
            let outcome = open_change_pr(ctx, request, |working| {
                set_version_in_file(&working.path(&version_file), &version)
            })
            .await?;
            progress.set_total(progress.snapshot().done + 4);
            match outcome {
                ChangePr::Open(url) => {
                    ctx.state.checklist.companion_release.push_url(url.clone());
                    ctx.persist().await?;
                    Some(url)
                }
                ChangePr::NothingToCommit => None,
            }
        }
    };

    if let Some(url) = &pr_url {
        let waited = wait_for_merge(
            ctx.forge,
            &companion.repo,
            url,
            config.poll_interval,
            progress,
            ctx.cancel,
        )
        .await?;
        if waited == MergeWait::Cancelled {
            return Ok(StepOutcome::Cancelled);
        }
    }
    progress.report_step(format!("Version {} is on {}", version, companion.default_branch));

    ctx.git.fetch(working, &companion.remote).await?;
    if ctx
        .git
        .tag_exists_on_remote(working, &companion.remote, &tag)
        .await?
    {
        progress.report_step(format!("{} already on {}", tag, companion.remote));
    } else {
        ctx.git
            .tag_and_push(
                working,
                &companion.remote,
                &tag,
                &companion.remote_ref(&companion.default_branch),
                &format!("Release {}", version),
            )
            .await?;
        progress.report_step(format!("Tagged and pushed {}", tag));
    }

    let release_url = match ctx.forge.find_release(&companion.repo, &tag).await? {
        Some(url) => {
            progress.report_step(format!("Release {} already published", tag));
            url
        }
        None => {
            let notes_path = std::env::temp_dir().join(format!(
                "{}-{}-release-notes.md",
                companion.repo.name, tag
            ));
            fs::write(
                &notes_path,
                format!("Released alongside {} {}.\n", config.repo, release.tag()),
            )?;
            let url = ctx
                .forge
                .create_release(
                    &companion.repo,
                    &NewRelease {
                        tag: tag.clone(),
                        title: tag.clone(),
                        notes_path,
                        is_latest: config.mark_latest.is_latest(&release),
                        is_prerelease: release.rc() > 0,
                    },
                )
                .await?;
            progress.report_step(format!("Published {}", url));
            url
        }
    };

    let item = &mut ctx.state.checklist.companion_release;
    item.push_url(release_url.clone());
    item.done = true;
    progress.finish(format!("Companion release {} complete", tag));
    Ok(StepOutcome::Done {
        url: Some(release_url),
    })
}

pub(super) async fn close_milestone<F: ForgeOperations, G: GitOperations>(
    ctx: &mut StepContext<'_, F, G>,
) -> Result<StepOutcome> {
    let repo = &ctx.config.repo;
    let milestone = ctx.state.release.milestone();
    let next = ctx.state.release.next_milestone();
    ctx.progress.start(2);

    let moved = ctx.forge.reassign_milestone(repo, &milestone, &next).await?;
    ctx.progress
        .report_step(format!("Moved {} open items to {}", moved, next));
    let url = ctx.forge.close_milestone(repo, &milestone).await?;
    ctx.progress.report_step(format!("Closed {}", milestone));

    ctx.state.checklist.close_milestone.complete(Some(url.clone()));
    Ok(StepOutcome::Done { url: Some(url) })
}
