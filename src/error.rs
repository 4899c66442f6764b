//! Error types for release captain operations.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for release captain operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all release captain operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Release issue document errors
    #[error("Release issue error: {0}")]
    Issue(#[from] IssueError),

    /// Forge (GitHub) operation errors
    #[error("Forge error: {0}")]
    Forge(#[from] ForgeError),

    /// Git operation errors
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// Workflow errors
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Configuration errors. All of them are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Repository identity could not be determined
    #[error("Cannot determine the forge repository: {reason}")]
    UnknownRepository {
        /// Reason for the error
        reason: String,
    },

    /// Invalid repository notation
    #[error("Invalid repository '{value}': expected owner/name")]
    InvalidRepository {
        /// Offending value
        value: String,
    },

    /// Config file could not be read or parsed
    #[error("Failed to load config file {path}: {reason}")]
    InvalidFile {
        /// Path of the config file
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Invalid version
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion {
        /// Version string
        version: String,
        /// Reason for the error
        reason: String,
    },

    /// Required external tool missing from PATH
    #[error("Required tool '{tool}' not found in PATH")]
    ToolNotFound {
        /// Tool name
        tool: String,
    },
}

/// Release issue document errors
#[derive(Error, Debug)]
pub enum IssueError {
    /// Scheduled date line missing
    #[error("The release issue has no scheduled date line")]
    MissingDate,

    /// Scheduled date does not match the expected format
    #[error("Invalid scheduled date '{value}': {reason}")]
    InvalidDate {
        /// Raw date text
        value: String,
        /// Reason for the error
        reason: String,
    },

    /// Title does not follow `Release of vX.Y.Z[-RCN]`
    #[error("Invalid release issue title '{title}'")]
    InvalidTitle {
        /// Issue title
        title: String,
    },

    /// RC suffix in the title is not an integer
    #[error("Invalid release candidate suffix '{suffix}' in title '{title}'")]
    InvalidRcSuffix {
        /// Issue title
        title: String,
        /// Raw suffix
        suffix: String,
    },
}

/// Forge operation errors
#[derive(Error, Debug)]
pub enum ForgeError {
    /// The forge CLI returned a failure
    #[error("'{command}' failed: {stderr}")]
    CommandFailed {
        /// Command that failed
        command: String,
        /// Raw standard error of the command
        stderr: String,
    },

    /// The forge CLI output could not be decoded
    #[error("Unexpected output from '{command}': {reason}")]
    UnexpectedOutput {
        /// Command that produced the output
        command: String,
        /// Reason for the error
        reason: String,
    },

    /// More than one open release issue matches
    #[error("Found {count} open release issues matching '{title}', expected at most one")]
    AmbiguousIssue {
        /// Title prefix searched
        title: String,
        /// Number of matches
        count: usize,
    },

    /// Issue not found
    #[error("Issue #{number} not found")]
    IssueNotFound {
        /// Issue number
        number: u64,
    },

    /// Milestone not found
    #[error("Milestone '{title}' not found")]
    MilestoneNotFound {
        /// Milestone title
        title: String,
    },

    /// URL does not point at a pull request
    #[error("Not a pull request URL: {url}")]
    InvalidPullRequestUrl {
        /// Offending URL
        url: String,
    },
}

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    /// Not a git repository
    #[error("Not a git repository: {path}")]
    NotRepository {
        /// Path that was inspected
        path: PathBuf,
    },

    /// Working directory not clean
    #[error("Working directory not clean. Please commit or stash changes before running release steps.")]
    DirtyWorkingDirectory,

    /// A git command failed
    #[error("'git {command}' failed: {stderr}")]
    CommandFailed {
        /// Git arguments
        command: String,
        /// Raw standard error
        stderr: String,
    },
}

/// Workflow errors surfaced by the orchestrator
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// No release issue exists yet
    #[error("No open release issue found for v{major}.x. Create one with 'create-issue' first.")]
    NoReleaseIssue {
        /// Target major version
        major: u64,
    },

    /// Another release of the same major line is still open
    #[error("Release issue '{title}' is still open; finish or close it first")]
    IssueAlreadyOpen {
        /// Title of the open issue
        title: String,
    },

    /// Step is not part of this release
    #[error("Step '{step}' does not apply to this release")]
    NotApplicable {
        /// Step id
        step: String,
    },

    /// Step is waiting on a previous step
    #[error("Step '{step}' is blocked until '{waiting_on}' is done")]
    Blocked {
        /// Step id
        step: String,
        /// Step that must be completed first
        waiting_on: String,
    },

    /// A step needs data a previous step should have recorded
    #[error("Step '{step}' is missing data: {reason}")]
    MissingPrerequisite {
        /// Step id
        step: String,
        /// What is missing
        reason: String,
    },

    /// A file edit found nothing to replace
    #[error("Failed to update {path}: {reason}")]
    FileUpdateFailed {
        /// File path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// The background step task died
    #[error("Step task aborted: {reason}")]
    TaskAborted {
        /// Reason for the error
        reason: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Unknown step id
    #[error("Unknown step '{step}'. Run 'status' to list step ids.")]
    UnknownStep {
        /// Value given by the user
        step: String,
    },
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Config(ConfigError::UnknownRepository { .. }) => vec![
                "Pass the repository explicitly: --repo owner/name".to_string(),
                "Verify the git remote URL: git remote -v".to_string(),
            ],
            ReleaseError::Config(ConfigError::ToolNotFound { tool }) => vec![
                format!("Install '{}' and make sure it is on your PATH", tool),
            ],
            ReleaseError::Git(GitError::DirtyWorkingDirectory) => vec![
                "Commit pending changes: git add . && git commit -m 'message'".to_string(),
                "Stash changes temporarily: git stash".to_string(),
            ],
            ReleaseError::Issue(_) => vec![
                "Inspect the release issue body and fix the header lines by hand".to_string(),
                "The issue may have been written by an incompatible version of this tool"
                    .to_string(),
            ],
            ReleaseError::Forge(ForgeError::AmbiguousIssue { .. }) => vec![
                "Close the duplicate release issues or pass --issue <number>".to_string(),
            ],
            ReleaseError::Forge(ForgeError::CommandFailed { .. }) => vec![
                "Check gh authentication: gh auth status".to_string(),
                "Re-run the step once the forge is reachable".to_string(),
            ],
            ReleaseError::Workflow(WorkflowError::NoReleaseIssue { .. }) => vec![
                "Create the issue: create-issue --version X.Y.Z --rc N --date YYYY-MM-DD"
                    .to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Check if this error must abort the whole session.
    ///
    /// Fatal errors mean the loaded state cannot be trusted; everything else
    /// is reported against the step and the operator may retry.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ReleaseError::Config(_)
                | ReleaseError::Issue(_)
                | ReleaseError::Git(GitError::NotRepository { .. })
                | ReleaseError::Git(GitError::DirtyWorkingDirectory)
                | ReleaseError::Forge(ForgeError::AmbiguousIssue { .. })
        )
    }
}
