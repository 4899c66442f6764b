//! Step execution with live progress.
//!
//! The step runs in a background task that owns the orchestrator. While the
//! action is in flight the task samples the progress tracker on a fixed tick
//! and sends snapshots to the UI loop, which prints new lines and turns
//! Ctrl-C into a cancellation of the running wait.

use crate::cli::RuntimeConfig;
use crate::error::{Result, WorkflowError};
use crate::forge::ForgeOperations;
use crate::git::GitOperations;
use crate::progress::ProgressSnapshot;
use crate::steps::StepId;
use crate::workflow::{Orchestrator, StepOutcome};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Interval between progress snapshots sent to the UI
const UI_REFRESH: Duration = Duration::from_millis(200);

/// Messages from the step task to the UI loop
#[derive(Debug)]
pub(super) enum UiMessage {
    /// Current progress of the running action
    Progress(ProgressSnapshot),
    /// The action returned and the issue is up to date
    Finished(Result<StepOutcome>),
}

/// Run `step` and report its outcome.
///
/// Returns the orchestrator so the caller can show where the checklist
/// stands afterwards.
pub(super) async fn run_step<F, G>(
    mut orchestrator: Orchestrator<F, G>,
    step: StepId,
    config: &RuntimeConfig,
) -> Result<(Orchestrator<F, G>, StepOutcome)>
where
    F: ForgeOperations + 'static,
    G: GitOperations + 'static,
{
    config.info_println(&format!("Running '{}': {}", step.id(), step.label()));
    config.verbose_println(&orchestrator.step(step).info);

    let (tx, mut rx) = mpsc::channel::<UiMessage>(32);
    let cancel = CancellationToken::new();
    let progress = orchestrator.progress();
    let task_cancel = cancel.clone();

    let task = tokio::spawn(async move {
        let result = {
            let execution = orchestrator.execute(step, task_cancel);
            tokio::pin!(execution);
            let mut ticker = tokio::time::interval(UI_REFRESH);
            loop {
                tokio::select! {
                    result = &mut execution => break result,
                    _ = ticker.tick() => {
                        let _ = tx.send(UiMessage::Progress(progress.snapshot())).await;
                    }
                }
            }
        };
        let _ = tx.send(UiMessage::Progress(progress.snapshot())).await;
        let _ = tx.send(UiMessage::Finished(result)).await;
        orchestrator
    });

    let mut printed = 0;
    let mut interrupts = 0;
    let result = loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(UiMessage::Progress(snapshot)) => {
                    for line in snapshot.lines.iter().skip(printed) {
                        let _ = config.output().progress(line);
                    }
                    printed = printed.max(snapshot.lines.len());
                }
                Some(UiMessage::Finished(result)) => break Some(result),
                None => break None,
            },
            _ = tokio::signal::ctrl_c() => {
                interrupts += 1;
                if interrupts == 1 {
                    config.warning_println("Cancelling; press Ctrl-C again to abort without updating the issue");
                    cancel.cancel();
                } else {
                    task.abort();
                }
            }
        }
    };

    let orchestrator = task.await.map_err(|e| WorkflowError::TaskAborted {
        reason: e.to_string(),
    })?;
    let outcome = match result {
        Some(result) => result?,
        None => {
            return Err(WorkflowError::TaskAborted {
                reason: "step task ended without a result".to_string(),
            }
            .into());
        }
    };

    report_outcome(step, &outcome, config);
    Ok((orchestrator, outcome))
}

fn report_outcome(step: StepId, outcome: &StepOutcome, config: &RuntimeConfig) {
    match outcome {
        StepOutcome::Done { url } => {
            config.success_println(&format!("'{}' done", step.id()));
            if let Some(url) = url {
                config.indent(url);
            }
        }
        StepOutcome::AlreadyDone => {
            config.info_println(&format!("'{}' is already done, nothing was run", step.id()))
        }
        StepOutcome::NothingToDo => config.success_println(&format!(
            "'{}' had nothing left to do and is marked done",
            step.id()
        )),
        StepOutcome::Cancelled => config.warning_println(&format!(
            "'{}' cancelled; what it recorded so far is saved on the issue, run it again to resume",
            step.id()
        )),
    }
}
