//! Release workflow orchestration.
//!
//! The [`Orchestrator`] owns the release state for one invocation: it loads
//! the release issue, exposes the gated step list, runs step actions and
//! uploads the re-rendered issue body after every mutation.

mod actions;
mod context;
mod poll;

pub use poll::{MergeWait, wait_for_merge};

use crate::config::ReleaseConfig;
use crate::error::{GitError, Result, WorkflowError};
use crate::forge::{ForgeOperations, Issue};
use crate::git::GitOperations;
use crate::issue::{self, IssueDocument, render_body};
use crate::progress::ProgressTracker;
use crate::state::ReleaseState;
use crate::steps::{self, PhaseGroup, StepId, StepKind, StepView};
use crate::version::ReleaseVersion;
use chrono::NaiveDate;
use context::{IssueHandle, StepContext};
use tokio_util::sync::CancellationToken;

/// How a step invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The action completed; `url` is the link it produced, if any
    Done {
        /// Pull request, release or milestone link
        url: Option<String>,
    },
    /// The step was already done; nothing was run
    AlreadyDone,
    /// The action found its work already in place and marked the step done
    NothingToDo,
    /// The operator cancelled a wait; side effects so far are kept
    Cancelled,
}

impl StepOutcome {
    /// Link produced by the action
    pub fn url(&self) -> Option<&str> {
        match self {
            StepOutcome::Done { url } => url.as_deref(),
            _ => None,
        }
    }
}

/// Drives one release issue.
///
/// Generic over the forge and repository so tests can substitute in-memory
/// implementations.
pub struct Orchestrator<F, G> {
    config: ReleaseConfig,
    forge: F,
    git: G,
    state: ReleaseState,
    issue: IssueHandle,
    progress: ProgressTracker,
}

impl<F: ForgeOperations, G: GitOperations> Orchestrator<F, G> {
    /// Load the release issue of the configured major version.
    ///
    /// Uses the issue number override when given, otherwise the single open
    /// release issue of the major line.
    pub async fn load(config: ReleaseConfig, forge: F, git: G) -> Result<Self> {
        let issue = match config.issue {
            Some(number) => forge.fetch_issue(&config.repo, number).await?,
            None => forge
                .find_release_issue(
                    &config.repo,
                    &ReleaseVersion::title_prefix_for_major(config.major),
                    &config.labels.release_issue,
                )
                .await?
                .ok_or(WorkflowError::NoReleaseIssue {
                    major: config.major,
                })?,
        };
        Self::from_issue(config, forge, git, issue)
    }

    /// Open the release issue for `version`, or load it if it is already open.
    pub async fn create_issue(
        config: ReleaseConfig,
        forge: F,
        git: G,
        version: &str,
        rc: u32,
        date: NaiveDate,
    ) -> Result<Self> {
        let release = ReleaseVersion::parse(version, rc)?;
        let prefix = ReleaseVersion::title_prefix_for_major(release.major());
        if let Some(existing) = forge
            .find_release_issue(&config.repo, &prefix, &config.labels.release_issue)
            .await?
        {
            if existing.title.trim() == release.title() {
                log::info!("Release issue #{} already exists", existing.number);
                return Self::from_issue(config, forge, git, existing);
            }
            return Err(WorkflowError::IssueAlreadyOpen {
                title: existing.title,
            }
            .into());
        }

        let state = ReleaseState::new(release, date, config.companion_release.clone());
        let document = issue::serialize(&state);
        let created = forge
            .create_issue(
                &config.repo,
                &document.title,
                &document.body,
                std::slice::from_ref(&config.labels.release_issue),
                config.assignee.as_deref(),
            )
            .await?;
        log::info!("Created release issue #{}", created.number);

        Ok(Self {
            config,
            forge,
            git,
            state,
            issue: IssueHandle {
                number: created.number,
                url: created.url,
                last_uploaded: document.body,
            },
            progress: ProgressTracker::default(),
        })
    }

    fn from_issue(config: ReleaseConfig, forge: F, git: G, issue: Issue) -> Result<Self> {
        let document = IssueDocument {
            title: issue.title,
            body: issue.body,
        };
        let mut state = issue::parse(&document)?;
        let last_uploaded = render_body(&state);
        if !state.has_companion_release() && !config.companion_release.is_empty() {
            state.companion_release = config
                .companion_release
                .trim()
                .trim_start_matches('v')
                .to_string();
        }
        log::debug!("Loaded release issue #{} ({})", issue.number, state.release);

        Ok(Self {
            config,
            forge,
            git,
            state,
            issue: IssueHandle {
                number: issue.number,
                url: issue.url,
                last_uploaded,
            },
            progress: ProgressTracker::default(),
        })
    }

    /// Refuse to run actions against a working copy with local changes.
    pub async fn verify_working_copy(&self) -> Result<()> {
        if !self.git.is_clean(&self.config.working).await? {
            return Err(GitError::DirtyWorkingDirectory.into());
        }
        Ok(())
    }

    /// Run configuration
    pub fn config(&self) -> &ReleaseConfig {
        &self.config
    }

    /// Current release state
    pub fn state(&self) -> &ReleaseState {
        &self.state
    }

    /// Forge client
    pub fn forge(&self) -> &F {
        &self.forge
    }

    /// Repository client
    pub fn git(&self) -> &G {
        &self.git
    }

    /// Number of the release issue
    pub fn issue_number(&self) -> u64 {
        self.issue.number
    }

    /// Web URL of the release issue
    pub fn issue_url(&self) -> &str {
        &self.issue.url
    }

    /// Every phase with its step views
    pub fn phases(&self) -> Vec<PhaseGroup> {
        steps::phase_groups(&self.state, &self.config)
    }

    /// View of a single step
    pub fn step(&self, step: StepId) -> StepView {
        steps::step_view(&self.state, &self.config, step)
    }

    /// Step the operator should look at first
    pub fn cursor(&self) -> Option<StepId> {
        steps::cursor(&self.state)
    }

    /// Handle on the progress of the running step
    pub fn progress(&self) -> ProgressTracker {
        self.progress.clone()
    }

    /// Issue document as it would be uploaded now
    pub fn document(&self) -> IssueDocument {
        issue::serialize(&self.state)
    }

    /// Run a step.
    ///
    /// The issue body is uploaded after the action returns whenever the
    /// rendered text changed, including after a failure or a cancelled wait,
    /// so links recorded by completed sub-operations are never lost.
    pub async fn execute(&mut self, step: StepId, cancel: CancellationToken) -> Result<StepOutcome> {
        let gate = steps::gate(&self.state, step);
        if !gate.visible {
            return Err(WorkflowError::NotApplicable {
                step: step.id().to_string(),
            }
            .into());
        }
        if gate.done && step.kind() != StepKind::Repeatable {
            return Ok(StepOutcome::AlreadyDone);
        }
        if let Some(waiting_on) = gate.waiting_on {
            return Err(WorkflowError::Blocked {
                step: step.id().to_string(),
                waiting_on: waiting_on.id().to_string(),
            }
            .into());
        }

        log::info!("Running step '{}'", step.id());
        let mut ctx = StepContext {
            config: &self.config,
            forge: &self.forge,
            git: &self.git,
            state: &mut self.state,
            progress: &self.progress,
            cancel: &cancel,
            issue: &mut self.issue,
        };
        let result = actions::run(step, &mut ctx).await;
        let synced = self
            .issue
            .sync(&self.forge, &self.config.repo, &self.state)
            .await;

        match (result, synced) {
            (Ok(outcome), Ok(_)) => Ok(outcome),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(sync_error)) => {
                log::warn!(
                    "Could not update the release issue after '{}' failed: {}",
                    step.id(),
                    sync_error
                );
                Err(e)
            }
        }
    }
}
