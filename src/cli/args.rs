//! Command line argument parsing and validation.

use crate::config::LatestPolicy;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Walks a release manager through the release checklist tracked in a GitHub issue
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_release_captain",
    version,
    about = "Walks a release manager through the release checklist tracked in a GitHub issue",
    long_about = "Drive a release from its GitHub issue checklist.

The checklist lives in the body of an issue titled 'Release of vX.Y.Z[-RCN]'.
Every run loads the issue, executes one step and writes the updated
checklist back, so a release can be resumed from any machine.

Usage:
  kodegen_release_captain create-issue --version 20.0.0 --rc 1 --date 2026-11-03
  kodegen_release_captain --major 20 status
  kodegen_release_captain --major 20 run code-freeze
  kodegen_release_captain --major 20 next"
)]
pub struct Args {
    /// Command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Forge repository (owner/name); derived from the git remote when omitted
    #[arg(long, global = true, env = "RELEASE_CAPTAIN_REPO", value_name = "OWNER/NAME")]
    pub repo: Option<String>,

    /// Git remote to fetch from and push to
    #[arg(long, global = true, env = "RELEASE_CAPTAIN_REMOTE", value_name = "NAME")]
    pub remote: Option<String>,

    /// Major version whose release issue to load
    #[arg(long, global = true, value_name = "MAJOR")]
    pub major: Option<u64>,

    /// Companion project version released alongside this one
    #[arg(long, global = true, value_name = "VERSION")]
    pub companion_release: Option<String>,

    /// Release issue number, bypassing the title search
    #[arg(long, global = true, value_name = "NUMBER")]
    pub issue: Option<u64>,

    /// Config file (defaults to .release-captain.toml in the repository)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path of the local working copy
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    pub path: PathBuf,

    /// Whether the forge release is marked as latest
    #[arg(long, global = true, value_enum, value_name = "POLICY")]
    pub latest: Option<LatestPolicy>,

    /// Show step details and recovery suggestions
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Open the release issue for a new release
    CreateIssue {
        /// Release version, X.Y.Z
        #[arg(long, value_name = "X.Y.Z")]
        version: String,

        /// Release candidate number, 0 for a final release
        #[arg(long, default_value_t = 0)]
        rc: u32,

        /// Scheduled release date, YYYY-MM-DD
        #[arg(long, value_parser = parse_date, value_name = "YYYY-MM-DD")]
        date: NaiveDate,
    },

    /// Show the checklist with the step to work on next
    Status,

    /// Execute one step
    Run {
        /// Step id, as listed by 'status'
        #[arg(value_name = "STEP")]
        step: String,
    },

    /// Execute the step the checklist is waiting on
    Next,

    /// Print the release issue as it is stored
    Show,
}

impl Command {
    /// Name of the subcommand, for messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateIssue { .. } => "create-issue",
            Command::Status => "status",
            Command::Run { .. } => "run",
            Command::Next => "next",
            Command::Show => "show",
        }
    }

    /// Whether the command may write to the forge or the working copy
    pub fn executes_steps(&self) -> bool {
        matches!(self, Command::Run { .. } | Command::Next)
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if !matches!(self.command, Command::CreateIssue { .. })
            && self.major.is_none()
            && self.issue.is_none()
        {
            return Err(format!(
                "'{}' needs --major or --issue to find the release issue",
                self.command.name()
            ));
        }
        if let Command::CreateIssue { version, .. } = &self.command
            && version.trim().is_empty()
        {
            return Err("--version must not be empty".to_string());
        }
        if let Some(repo) = &self.repo
            && repo.trim().is_empty()
        {
            return Err("--repo must not be empty".to_string());
        }
        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            output: super::OutputManager::new(verbose, quiet),
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print message only in verbose mode
    pub fn verbose_println(&self, message: &str) {
        let _ = self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print info message
    pub fn info_println(&self, message: &str) {
        let _ = self.output.info(message);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }

    /// Check if verbose output is enabled
    pub fn is_verbose(&self) -> bool {
        self.output.is_verbose()
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.output.is_quiet()
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self::new(args.verbose, args.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_takes_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "kodegen_release_captain",
            "run",
            "code-freeze",
            "--major",
            "20",
            "--repo",
            "vitessio/vitess",
        ])
        .unwrap();
        assert_eq!(args.major, Some(20));
        assert_eq!(args.repo.as_deref(), Some("vitessio/vitess"));
        assert!(matches!(args.command, Command::Run { ref step } if step == "code-freeze"));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_create_issue_parses_date() {
        let args = Args::try_parse_from([
            "kodegen_release_captain",
            "create-issue",
            "--version",
            "20.0.0",
            "--rc",
            "1",
            "--date",
            "2026-11-03",
        ])
        .unwrap();
        match args.command {
            Command::CreateIssue { ref version, rc, date } => {
                assert_eq!(version, "20.0.0");
                assert_eq!(rc, 1);
                assert_eq!(date, NaiveDate::from_ymd_opt(2026, 11, 3).unwrap());
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let result = Args::try_parse_from([
            "kodegen_release_captain",
            "create-issue",
            "--version",
            "20.0.0",
            "--date",
            "11/03/2026",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_status_needs_major_or_issue() {
        let args = Args::try_parse_from(["kodegen_release_captain", "status"]).unwrap();
        assert!(args.validate().is_err());

        let args =
            Args::try_parse_from(["kodegen_release_captain", "status", "--issue", "1234"]).unwrap();
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_latest_policy_flag() {
        let args = Args::try_parse_from([
            "kodegen_release_captain",
            "--major",
            "19",
            "--latest",
            "never",
            "next",
        ])
        .unwrap();
        assert_eq!(args.latest, Some(LatestPolicy::Never));
        assert!(args.command.executes_steps());
    }
}
