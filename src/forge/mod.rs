//! Forge (GitHub) operations used by the orchestrator and step actions.
//!
//! [`ForgeOperations`] is the seam between release logic and the hosting
//! service. [`GhForge`] drives the `gh` command line client; tests substitute
//! in-memory implementations.

mod gh;

pub use gh::GhForge;

use crate::config::ForgeRepo;
use crate::error::Result;
use std::future::Future;
use std::path::PathBuf;

/// Issue as returned by the forge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Issue number
    pub number: u64,
    /// Title
    pub title: String,
    /// Markdown body
    pub body: String,
    /// Web URL
    pub url: String,
}

/// Pull request as returned by the forge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// Pull request number
    pub number: u64,
    /// Title
    pub title: String,
    /// Web URL
    pub url: String,
}

/// Pull request to open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    /// Title; also used to find an already opened pull request
    pub title: String,
    /// Markdown body
    pub body: String,
    /// Target branch
    pub base: String,
    /// Source branch, already pushed
    pub head: String,
    /// Labels to apply
    pub labels: Vec<String>,
}

/// Forge release to publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRelease {
    /// Existing tag to publish
    pub tag: String,
    /// Release title
    pub title: String,
    /// Local file holding the release notes
    pub notes_path: PathBuf,
    /// Mark as the repository's latest release
    pub is_latest: bool,
    /// Mark as a pre-release
    pub is_prerelease: bool,
}

/// Operations on the hosting forge.
///
/// Every call is a single request-response exchange. Futures are `Send` so a
/// step can run on a background task.
pub trait ForgeOperations: Send + Sync {
    /// Fetch an issue by number
    fn fetch_issue(
        &self,
        repo: &ForgeRepo,
        number: u64,
    ) -> impl Future<Output = Result<Issue>> + Send;

    /// Find the single open issue carrying `label` whose title starts with `title_prefix`.
    ///
    /// More than one match is an error.
    fn find_release_issue(
        &self,
        repo: &ForgeRepo,
        title_prefix: &str,
        label: &str,
    ) -> impl Future<Output = Result<Option<Issue>>> + Send;

    /// Open an issue
    fn create_issue(
        &self,
        repo: &ForgeRepo,
        title: &str,
        body: &str,
        labels: &[String],
        assignee: Option<&str>,
    ) -> impl Future<Output = Result<Issue>> + Send;

    /// Replace the body of an issue
    fn update_issue_body(
        &self,
        repo: &ForgeRepo,
        number: u64,
        body: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Close an issue
    fn close_issue(&self, repo: &ForgeRepo, number: u64)
    -> impl Future<Output = Result<()>> + Send;

    /// Open pull request with exactly this title; `None` unless there is exactly one
    fn find_open_pr_by_title(
        &self,
        repo: &ForgeRepo,
        title: &str,
    ) -> impl Future<Output = Result<Option<PullRequest>>> + Send;

    /// Whether the pull request at `url` has been merged
    fn is_pr_merged(&self, repo: &ForgeRepo, url: &str)
    -> impl Future<Output = Result<bool>> + Send;

    /// Open a pull request
    fn create_pr(
        &self,
        repo: &ForgeRepo,
        pr: &NewPullRequest,
    ) -> impl Future<Output = Result<PullRequest>> + Send;

    /// URLs of the open issues and pull requests on a milestone
    fn list_open_on_milestone(
        &self,
        repo: &ForgeRepo,
        milestone: &str,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Create a label; succeeds when it already exists
    fn create_label(
        &self,
        repo: &ForgeRepo,
        name: &str,
        color: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Create a milestone and return its URL; returns the existing one if present
    fn create_milestone(
        &self,
        repo: &ForgeRepo,
        title: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Close a milestone and return its URL
    fn close_milestone(
        &self,
        repo: &ForgeRepo,
        title: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Move every open item of milestone `from` to milestone `to`; returns the count moved
    fn reassign_milestone(
        &self,
        repo: &ForgeRepo,
        from: &str,
        to: &str,
    ) -> impl Future<Output = Result<usize>> + Send;

    /// URL of the release published for `tag`, if any
    fn find_release(
        &self,
        repo: &ForgeRepo,
        tag: &str,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Publish a release and return its URL
    fn create_release(
        &self,
        repo: &ForgeRepo,
        release: &NewRelease,
    ) -> impl Future<Output = Result<String>> + Send;
}
