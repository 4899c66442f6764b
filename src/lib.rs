//! # Release Captain
//!
//! Walks a release manager through a release checklist that lives in the
//! body of a GitHub issue.
//!
//! The issue is the only persistent state: every invocation loads it, parses
//! the checklist, runs one step (opening pull requests, tagging, publishing
//! the forge release, managing milestones) and writes the updated checklist
//! back. Any machine with `git` and `gh` can pick a release up where the last
//! run left it.
//!
//! ## Usage
//!
//! ```bash
//! kodegen_release_captain create-issue --version 20.0.0 --rc 1 --date 2026-11-03
//! kodegen_release_captain --major 20 status
//! kodegen_release_captain --major 20 run create-release-branch
//! kodegen_release_captain --major 20 next
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod announce;
pub mod cli;
pub mod config;
pub mod error;
pub mod forge;
pub mod git;
pub mod issue;
pub mod progress;
pub mod state;
pub mod steps;
pub mod version;
pub mod workflow;

// Re-export main types for public API
pub use cli::Args;
pub use config::{ForgeRepo, LatestPolicy, ReleaseConfig, WorkingContext};
pub use error::{CliError, ReleaseError, Result};
pub use forge::{ForgeOperations, GhForge};
pub use git::{GitCli, GitOperations};
pub use issue::IssueDocument;
pub use progress::{ProgressSnapshot, ProgressTracker};
pub use state::ReleaseState;
pub use steps::{Phase, StepId};
pub use version::ReleaseVersion;
pub use workflow::{Orchestrator, StepOutcome};
