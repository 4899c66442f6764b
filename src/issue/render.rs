//! Release state to issue body.

use super::{COMPANION_PREFIX, DATE_FORMAT, DATE_PREFIX};
use crate::state::{ItemRef, ReleaseState};
use crate::steps::{Phase, StepId};

/// Render the issue body of a release.
///
/// Sections and items that do not apply to the release are left out; the
/// parser treats their absence as "not done".
pub fn render_body(state: &ReleaseState) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}{}.\n",
        DATE_PREFIX,
        state.date.format(DATE_FORMAT)
    ));
    if state.has_companion_release() {
        out.push_str(&format!("{}v{}.\n", COMPANION_PREFIX, state.companion_release));
    }

    for phase in Phase::ALL {
        let steps: Vec<StepId> = phase
            .steps()
            .iter()
            .copied()
            .filter(|step| step.is_relevant(state))
            .collect();
        if steps.is_empty() {
            continue;
        }

        out.push_str(&format!("\n### {}\n", phase.title()));
        for step in steps {
            render_item(&mut out, step, state.checklist.item(step));
        }
    }
    out
}

fn render_item(out: &mut String, step: StepId, item: ItemRef<'_>) {
    match item {
        ItemRef::Check(item) => push_checkbox(out, "", item.done, step.label()),
        ItemRef::Linked(item) => {
            push_checkbox(out, "", item.done, step.label());
            if let Some(url) = &item.url {
                push_child(out, url);
            }
        }
        ItemRef::MultiLinked(item) => {
            push_checkbox(out, "", item.done, step.label());
            for url in &item.urls {
                push_child(out, url);
            }
        }
        ItemRef::Group(group) => {
            push_checkbox(out, "", group.done, step.label());
            for entry in &group.items {
                push_checkbox(out, "  ", entry.done, &entry.url);
            }
        }
    }
}

fn push_checkbox(out: &mut String, indent: &str, done: bool, text: &str) {
    let mark = if done { "x" } else { " " };
    out.push_str(&format!("{}- [{}] {}\n", indent, mark, text));
}

fn push_child(out: &mut String, text: &str) {
    out.push_str(&format!("  - {}\n", text));
}
