//! Declarative table of release steps.

use crate::state::ReleaseState;
use std::fmt;
use std::str::FromStr;

/// Checklist phase, in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Work done before the code freeze
    Prerequisites,
    /// Code freeze, branches, milestones and the Release PR
    PreRelease,
    /// Merging, tagging and publishing
    Release,
    /// Announcements and cleanup
    PostRelease,
}

impl Phase {
    /// All phases in document order
    pub const ALL: [Phase; 4] = [
        Phase::Prerequisites,
        Phase::PreRelease,
        Phase::Release,
        Phase::PostRelease,
    ];

    /// Section header text
    pub fn title(&self) -> &'static str {
        match self {
            Phase::Prerequisites => "Prerequisites",
            Phase::PreRelease => "Pre-Release",
            Phase::Release => "Release",
            Phase::PostRelease => "Post-Release",
        }
    }

    /// Steps of the phase in document order
    pub fn steps(&self) -> &'static [StepId] {
        match self {
            Phase::Prerequisites => &StepId::ALL[0..3],
            Phase::PreRelease => &StepId::ALL[3..10],
            Phase::Release => &StepId::ALL[10..17],
            Phase::PostRelease => &StepId::ALL[17..20],
        }
    }

    /// Whether steps of this phase must be completed one after the other
    pub fn is_sequential(&self) -> bool {
        matches!(self, Phase::Release)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// How a step's action behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Performed by a human; the action only records completion
    Manual,
    /// Performed by the tool against git and the forge
    Automated,
    /// Automated and may be re-run after it is done
    Repeatable,
}

/// Identifier of every step of the release checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepId {
    /// Access rights and tooling checks
    GeneralPrerequisites,
    /// Announce the upcoming release
    SlackAnnouncement,
    /// Track open pull requests and issues on the milestone
    CheckPrsIssues,
    /// Cut the release branch (first RC only)
    CreateReleaseBranch,
    /// Protect the new release branch (first RC only)
    CopyBranchProtection,
    /// Freeze the release branch
    CodeFreeze,
    /// Move the default branch to the next major SNAPSHOT (first RC only)
    UpdateSnapshotMain,
    /// Milestone for the next patch release
    CreateMilestone,
    /// Version bump and release notes PR
    CreateReleasePr,
    /// Blog post PR on the website (GA only)
    BlogPostPr,
    /// Wait for the Release PR to be merged
    MergeReleasePr,
    /// Tag and publish the forge release
    TagRelease,
    /// Copy release notes to the default branch
    ReleaseNotesMain,
    /// SNAPSHOT version on the release branch
    BackToDevMode,
    /// Release the companion project
    CompanionRelease,
    /// Close the release milestone
    CloseMilestone,
    /// Merge the blog post PR (GA only)
    MergeBlogPost,
    /// Announce the release
    SlackPostRelease,
    /// Cross-post the blog post (GA only)
    CrossPostBlog,
    /// Close the release issue
    CloseIssue,
}

impl StepId {
    /// All steps in document order
    pub const ALL: [StepId; 20] = [
        StepId::GeneralPrerequisites,
        StepId::SlackAnnouncement,
        StepId::CheckPrsIssues,
        StepId::CreateReleaseBranch,
        StepId::CopyBranchProtection,
        StepId::CodeFreeze,
        StepId::UpdateSnapshotMain,
        StepId::CreateMilestone,
        StepId::CreateReleasePr,
        StepId::BlogPostPr,
        StepId::MergeReleasePr,
        StepId::TagRelease,
        StepId::ReleaseNotesMain,
        StepId::BackToDevMode,
        StepId::CompanionRelease,
        StepId::CloseMilestone,
        StepId::MergeBlogPost,
        StepId::SlackPostRelease,
        StepId::CrossPostBlog,
        StepId::CloseIssue,
    ];

    /// Command line identifier
    pub fn id(&self) -> &'static str {
        match self {
            StepId::GeneralPrerequisites => "general-prerequisites",
            StepId::SlackAnnouncement => "slack-announcement",
            StepId::CheckPrsIssues => "check-prs-issues",
            StepId::CreateReleaseBranch => "create-release-branch",
            StepId::CopyBranchProtection => "copy-branch-protection",
            StepId::CodeFreeze => "code-freeze",
            StepId::UpdateSnapshotMain => "update-snapshot-main",
            StepId::CreateMilestone => "create-milestone",
            StepId::CreateReleasePr => "create-release-pr",
            StepId::BlogPostPr => "blog-post-pr",
            StepId::MergeReleasePr => "merge-release-pr",
            StepId::TagRelease => "tag-release",
            StepId::ReleaseNotesMain => "release-notes-main",
            StepId::BackToDevMode => "back-to-dev-mode",
            StepId::CompanionRelease => "companion-release",
            StepId::CloseMilestone => "close-milestone",
            StepId::MergeBlogPost => "merge-blog-post",
            StepId::SlackPostRelease => "slack-post-release",
            StepId::CrossPostBlog => "cross-post-blog",
            StepId::CloseIssue => "close-issue",
        }
    }

    /// Fixed label written in the release issue.
    ///
    /// The parser finds items by these exact substrings; changing one breaks
    /// every issue written by earlier versions.
    pub fn label(&self) -> &'static str {
        match self {
            StepId::GeneralPrerequisites => "General prerequisites.",
            StepId::SlackAnnouncement => "Notify the community on Slack.",
            StepId::CheckPrsIssues => {
                "Make sure all Pull Requests and Issues on the milestone are closed, list below."
            }
            StepId::CreateReleaseBranch => "Create the release branch.",
            StepId::CopyBranchProtection => "Copy branch protection rules.",
            StepId::CodeFreeze => "Code Freeze.",
            StepId::UpdateSnapshotMain => "Update the SNAPSHOT version on main.",
            StepId::CreateMilestone => "Create new GitHub Milestone.",
            StepId::CreateReleasePr => "Create Release PR.",
            StepId::BlogPostPr => {
                "Open a Pull Request on the website repository for the blog post."
            }
            StepId::MergeReleasePr => "Merge the Release PR.",
            StepId::TagRelease => "Tag the release.",
            StepId::ReleaseNotesMain => "Release Notes on main.",
            StepId::BackToDevMode => "Go back to dev mode on the release branch.",
            StepId::CompanionRelease => "Companion project release.",
            StepId::CloseMilestone => "Close current GitHub Milestone.",
            StepId::MergeBlogPost => "Merge the blog post Pull Request on the website repository.",
            StepId::SlackPostRelease => "Notify the community on Slack for the new release.",
            StepId::CrossPostBlog => "Cross-post the blog post on community channels.",
            StepId::CloseIssue => "Close this Issue.",
        }
    }

    /// Phase the step belongs to
    pub fn phase(&self) -> Phase {
        match self {
            StepId::GeneralPrerequisites | StepId::SlackAnnouncement | StepId::CheckPrsIssues => {
                Phase::Prerequisites
            }
            StepId::CreateReleaseBranch
            | StepId::CopyBranchProtection
            | StepId::CodeFreeze
            | StepId::UpdateSnapshotMain
            | StepId::CreateMilestone
            | StepId::CreateReleasePr
            | StepId::BlogPostPr => Phase::PreRelease,
            StepId::MergeReleasePr
            | StepId::TagRelease
            | StepId::ReleaseNotesMain
            | StepId::BackToDevMode
            | StepId::CompanionRelease
            | StepId::CloseMilestone
            | StepId::MergeBlogPost => Phase::Release,
            StepId::SlackPostRelease | StepId::CrossPostBlog | StepId::CloseIssue => {
                Phase::PostRelease
            }
        }
    }

    /// Action behavior
    pub fn kind(&self) -> StepKind {
        match self {
            StepId::GeneralPrerequisites
            | StepId::SlackAnnouncement
            | StepId::CopyBranchProtection
            | StepId::BlogPostPr
            | StepId::MergeBlogPost
            | StepId::SlackPostRelease
            | StepId::CrossPostBlog => StepKind::Manual,
            StepId::CheckPrsIssues => StepKind::Repeatable,
            _ => StepKind::Automated,
        }
    }

    /// Whether the step is part of this release at all.
    ///
    /// Pure function of the state: the same predicate decides what the
    /// issue renders and what the operator sees.
    pub fn is_relevant(&self, state: &ReleaseState) -> bool {
        match self {
            StepId::CreateReleaseBranch
            | StepId::CopyBranchProtection
            | StepId::UpdateSnapshotMain => state.rc() == 1,
            StepId::BlogPostPr | StepId::MergeBlogPost | StepId::CrossPostBlog => state.is_ga(),
            StepId::ReleaseNotesMain => state.rc() <= 1,
            StepId::CompanionRelease => state.has_companion_release(),
            // Nothing to merge when the Release PR step found nothing to commit.
            StepId::MergeReleasePr => {
                let pr = &state.checklist.create_release_pr;
                !(pr.done && pr.url.is_none())
            }
            _ => true,
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for StepId {
    type Err = crate::error::CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepId::ALL
            .iter()
            .copied()
            .find(|step| step.id() == s.trim())
            .ok_or_else(|| crate::error::CliError::UnknownStep {
                step: s.to_string(),
            })
    }
}
