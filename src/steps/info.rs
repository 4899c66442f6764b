//! Operator-facing description of each step.

use super::StepId;
use crate::announce;
use crate::config::ReleaseConfig;
use crate::state::ReleaseState;

/// What the step does, or what the operator has to do for manual steps
pub fn step_info(state: &ReleaseState, config: &ReleaseConfig, step: StepId) -> String {
    let release = &state.release;
    let branch = config.release_branch(release);
    match step {
        StepId::GeneralPrerequisites => format!(
            "Make sure you have admin access to {} and that git and gh are authenticated.",
            config.repo
        ),
        StepId::SlackAnnouncement => announce::slack_pre_release(state, config),
        StepId::CheckPrsIssues => format!(
            "Lists the open Pull Requests and Issues on milestone {}; run again until the list is empty.",
            release.milestone()
        ),
        StepId::CreateReleaseBranch => format!(
            "Creates {} from {} and the '{}' label.",
            branch,
            config.default_branch,
            config.backport_label(release)
        ),
        StepId::CopyBranchProtection => format!(
            "Copy the branch protection rules of the previous release branch to {} in the repository settings.",
            branch
        ),
        StepId::CodeFreeze => format!(
            "Opens a PR enabling {} on {} and waits for it to be merged.",
            config.files.code_freeze_workflow.display(),
            branch
        ),
        StepId::UpdateSnapshotMain => format!(
            "Opens a PR setting {} to {} on {}.",
            config.files.version_file.display(),
            release.next_main_dev_version(),
            config.default_branch
        ),
        StepId::CreateMilestone => format!("Creates milestone {}.", release.next_milestone()),
        StepId::CreateReleasePr => format!(
            "Opens the Release PR against {} bumping the version to {}.",
            branch,
            release.release_version_string()
        ),
        StepId::BlogPostPr => {
            "Open the blog post Pull Request on the website repository.".to_string()
        }
        StepId::MergeReleasePr => match &state.checklist.create_release_pr.url {
            Some(url) => format!("Waits until {} is merged.", url),
            None => "Waits until the Release PR is merged.".to_string(),
        },
        StepId::TagRelease => format!(
            "Tags {} on {} and publishes the GitHub release.",
            release.tag(),
            branch
        ),
        StepId::ReleaseNotesMain => format!(
            "Opens a PR copying {} to {}.",
            config.release_notes_path(release).display(),
            config.default_branch
        ),
        StepId::BackToDevMode => format!(
            "Opens a PR setting {} to {} on {}.",
            config.files.version_file.display(),
            release.dev_version(),
            branch
        ),
        StepId::CompanionRelease => match &config.companion {
            Some(companion) => format!(
                "Releases v{} of {}.",
                state.companion_release.trim_start_matches('v'),
                companion.repo
            ),
            None => "No companion project configured.".to_string(),
        },
        StepId::CloseMilestone => format!(
            "Moves open items to {} and closes {}.",
            release.next_milestone(),
            release.milestone()
        ),
        StepId::MergeBlogPost => {
            "Merge the blog post Pull Request once the release is published.".to_string()
        }
        StepId::SlackPostRelease => announce::slack_post_release(state, config),
        StepId::CrossPostBlog => {
            "Share the blog post on the community channels and social media.".to_string()
        }
        StepId::CloseIssue => "Closes this release issue.".to_string(),
    }
}
