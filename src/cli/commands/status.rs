//! Read-only commands: checklist status and the raw issue document.

use crate::cli::{RuntimeConfig, StepMarker};
use crate::forge::ForgeOperations;
use crate::git::GitOperations;
use crate::steps::StepView;
use crate::workflow::Orchestrator;

/// Print every phase with its visible steps and the cursor
pub(super) fn print_status<F: ForgeOperations, G: GitOperations>(
    orchestrator: &Orchestrator<F, G>,
    config: &RuntimeConfig,
) {
    let state = orchestrator.state();
    config.println(&format!(
        "{} scheduled for {}",
        state.release,
        state.date.format("%a %b %-d %Y")
    ));
    if state.has_companion_release() {
        config.println(&format!("Companion release: v{}", state.companion_release));
    }
    config.println(&format!(
        "Issue #{}: {}",
        orchestrator.issue_number(),
        orchestrator.issue_url()
    ));

    let cursor = orchestrator.cursor();
    let output = config.output();
    for group in orchestrator.phases() {
        if group.visible_steps().next().is_none() {
            continue;
        }
        let _ = output.section(group.phase.title());
        for step in group.visible_steps() {
            let _ = output.step_line(marker(step, cursor == Some(step.id)), step.id.id(), step.label);
            for sub_item in &step.sub_items {
                config.indent(sub_item);
            }
            if config.is_verbose() || cursor == Some(step.id) {
                config.indent(&step.info);
            }
        }
    }

    config.println("");
    match cursor {
        Some(step) => config.info_println(&format!(
            "Next step: {} (run it with 'run {}' or 'next')",
            step.label(),
            step.id()
        )),
        None => config.success_println("Every step is done"),
    }
}

fn marker(step: &StepView, is_cursor: bool) -> StepMarker {
    if step.done {
        StepMarker::Done
    } else if is_cursor {
        StepMarker::Cursor
    } else if step.enabled {
        StepMarker::Ready
    } else {
        StepMarker::Blocked
    }
}

/// Print the issue title and body exactly as they would be uploaded
pub(super) fn print_document<F: ForgeOperations, G: GitOperations>(
    orchestrator: &Orchestrator<F, G>,
    config: &RuntimeConfig,
) {
    let document = orchestrator.document();
    config.println(&document.title);
    config.println("");
    config.println(document.body.trim_end());
}
