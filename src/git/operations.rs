//! Core Git operations trait and types for release steps.
//!
//! This module defines the GitOperations trait that specifies every repository
//! operation the step actions need. Each call names the working copy it runs
//! against, so the same implementation serves the project and its companion.

use crate::config::WorkingContext;
use crate::error::Result;
use std::future::Future;
use std::path::Path;

/// Trait defining all required Git operations for release steps
pub trait GitOperations: Send + Sync {
    /// Check if working directory is clean
    fn is_clean(&self, ctx: &WorkingContext) -> impl Future<Output = Result<bool>> + Send;

    /// URL of a remote
    fn remote_url(
        &self,
        ctx: &WorkingContext,
        remote: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Fetch branches and tags from a remote
    fn fetch(&self, ctx: &WorkingContext, remote: &str) -> impl Future<Output = Result<()>> + Send;

    /// Checkout an existing branch
    fn checkout(&self, ctx: &WorkingContext, branch: &str)
    -> impl Future<Output = Result<()>> + Send;

    /// Hard reset the current branch to a revision
    fn reset_hard(
        &self,
        ctx: &WorkingContext,
        target: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Create and checkout a branch at the current commit
    fn create_branch(
        &self,
        ctx: &WorkingContext,
        branch: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Check if remote branch exists
    fn branch_exists_on_remote(
        &self,
        ctx: &WorkingContext,
        remote: &str,
        branch: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Stage and commit everything
    fn commit_all(
        &self,
        ctx: &WorkingContext,
        message: &str,
    ) -> impl Future<Output = Result<CommitOutcome>> + Send;

    /// Push a branch, setting its upstream
    fn push_branch(
        &self,
        ctx: &WorkingContext,
        remote: &str,
        branch: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Push a branch this tool owns, replacing what the remote holds as long
    /// as it still matches the last fetch
    fn force_push_branch(
        &self,
        ctx: &WorkingContext,
        remote: &str,
        branch: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Check if a tag exists on the remote
    fn tag_exists_on_remote(
        &self,
        ctx: &WorkingContext,
        remote: &str,
        tag: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Create an annotated tag at `target` and push it
    fn tag_and_push(
        &self,
        ctx: &WorkingContext,
        remote: &str,
        tag: &str,
        target: &str,
        message: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Content of a file at a revision
    fn read_file_at(
        &self,
        ctx: &WorkingContext,
        revision: &str,
        path: &Path,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Result of [`GitOperations::commit_all`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A commit was created
    Committed {
        /// Full SHA of the new commit
        sha: String,
    },
    /// The working tree matched HEAD
    NothingToCommit,
}

impl CommitOutcome {
    /// Whether a commit was created
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed { .. })
    }
}
