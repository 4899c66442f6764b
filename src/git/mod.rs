//! Git operations for release steps.
//!
//! This module provides the [`GitOperations`] trait used by step actions and
//! [`GitCli`], its implementation over the `git` executable.

mod command;
mod operations;

pub use command::GitCli;
pub use operations::{CommitOutcome, GitOperations};
