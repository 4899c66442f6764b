//! Command line interface for the release captain.
//!
//! Parses arguments, builds the [`ReleaseConfig`](crate::config::ReleaseConfig)
//! and hands the work to the orchestrator. Everything printed to the
//! terminal goes through [`OutputManager`].

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, RuntimeConfig};
pub use commands::execute_command;
pub use output::{OutputManager, StepMarker};

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args).await
}
