//! Visibility, enablement and cursor placement of release steps.

use super::{Phase, StepId, StepKind};
use crate::config::ReleaseConfig;
use crate::state::ReleaseState;

/// Gate of one step for a given state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    /// Shown at all
    pub visible: bool,
    /// Completion state
    pub done: bool,
    /// Action may be invoked now
    pub enabled: bool,
    /// Earlier step of a sequential phase that is not done yet
    pub waiting_on: Option<StepId>,
}

/// Evaluate the gate of a step.
pub fn gate(state: &ReleaseState, step: StepId) -> Gate {
    let visible = step.is_relevant(state);
    let done = state.checklist.item(step).is_done();
    let waiting_on = if visible && step.phase().is_sequential() {
        first_pending_before(state, step)
    } else {
        None
    };
    let enabled =
        visible && (!done || step.kind() == StepKind::Repeatable) && waiting_on.is_none();

    Gate {
        visible,
        done,
        enabled,
        waiting_on,
    }
}

/// First visible, not-done step of the same phase that precedes `step`
fn first_pending_before(state: &ReleaseState, step: StepId) -> Option<StepId> {
    step.phase()
        .steps()
        .iter()
        .copied()
        .take_while(|candidate| *candidate != step)
        .filter(|candidate| candidate.is_relevant(state))
        .find(|candidate| !state.checklist.item(*candidate).is_done())
}

/// View model of one step, as handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    /// Step identifier
    pub id: StepId,
    /// Checklist label
    pub label: &'static str,
    /// Completion state
    pub done: bool,
    /// Shown at all
    pub visible: bool,
    /// Action may be invoked now
    pub enabled: bool,
    /// What the step does or what the operator has to do
    pub info: String,
    /// Links and children recorded for the step
    pub sub_items: Vec<String>,
}

/// Steps of one phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseGroup {
    /// Phase
    pub phase: Phase,
    /// Steps in document order, hidden ones included
    pub steps: Vec<StepView>,
}

impl PhaseGroup {
    /// Visible steps only
    pub fn visible_steps(&self) -> impl Iterator<Item = &StepView> {
        self.steps.iter().filter(|step| step.visible)
    }
}

/// Build the step list of every phase.
pub fn phase_groups(state: &ReleaseState, config: &ReleaseConfig) -> Vec<PhaseGroup> {
    Phase::ALL
        .iter()
        .map(|phase| PhaseGroup {
            phase: *phase,
            steps: phase
                .steps()
                .iter()
                .map(|step| step_view(state, config, *step))
                .collect(),
        })
        .collect()
}

/// View model of a single step
pub fn step_view(state: &ReleaseState, config: &ReleaseConfig, step: StepId) -> StepView {
    let gate = gate(state, step);
    StepView {
        id: step,
        label: step.label(),
        done: gate.done,
        visible: gate.visible,
        enabled: gate.enabled,
        info: super::info::step_info(state, config, step),
        sub_items: state.checklist.item(step).links(),
    }
}

/// Step the operator should look at first.
///
/// The first visible step that is not done, except that the perpetually
/// relevant PR/issue check is passed over when the step right after it is
/// already done. Falls back to that check when nothing else is pending.
pub fn cursor(state: &ReleaseState) -> Option<StepId> {
    let visible: Vec<(StepId, bool)> = StepId::ALL
        .iter()
        .copied()
        .filter(|step| step.is_relevant(state))
        .map(|step| (step, state.checklist.item(step).is_done()))
        .collect();

    let mut skipped = None;
    for (index, (step, done)) in visible.iter().enumerate() {
        if *done {
            continue;
        }
        if *step == StepId::CheckPrsIssues
            && visible.get(index + 1).is_some_and(|(_, next_done)| *next_done)
        {
            skipped = Some(*step);
            continue;
        }
        return Some(*step);
    }
    skipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ForgeRepo, WorkingContext};
    use crate::version::ReleaseVersion;
    use chrono::NaiveDate;

    fn state(rc: u32, version: &str, companion: &str) -> ReleaseState {
        ReleaseState::new(
            ReleaseVersion::parse(version, rc).unwrap(),
            NaiveDate::from_ymd_opt(2026, 11, 3).unwrap(),
            companion,
        )
    }

    fn config() -> ReleaseConfig {
        ReleaseConfig::new(
            ForgeRepo::parse("org/repo").unwrap(),
            20,
            WorkingContext::new("."),
        )
    }

    fn release_views(state: &ReleaseState) -> Vec<StepView> {
        phase_groups(state, &config())
            .into_iter()
            .find(|group| group.phase == Phase::Release)
            .map(|group| group.visible_steps().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_first_rc_only_steps() {
        let rc1 = state(1, "20.0.0", "");
        assert!(gate(&rc1, StepId::CopyBranchProtection).visible);
        assert!(gate(&rc1, StepId::CreateReleaseBranch).visible);

        let rc2 = state(2, "20.0.0", "");
        assert!(!gate(&rc2, StepId::CopyBranchProtection).visible);
        assert!(!gate(&rc2, StepId::CreateReleaseBranch).visible);
        assert!(!gate(&rc2, StepId::ReleaseNotesMain).visible);
        assert!(!gate(&rc2, StepId::CopyBranchProtection).enabled);
    }

    #[test]
    fn test_ga_and_companion_steps() {
        let ga = state(0, "20.0.0", "2.13.0");
        assert!(gate(&ga, StepId::BlogPostPr).visible);
        assert!(gate(&ga, StepId::CrossPostBlog).visible);
        assert!(gate(&ga, StepId::CompanionRelease).visible);

        let patch = state(0, "20.0.1", "");
        assert!(!gate(&patch, StepId::BlogPostPr).visible);
        assert!(!gate(&patch, StepId::CompanionRelease).visible);
    }

    #[test]
    fn test_release_phase_is_sequential() {
        let mut s = state(0, "20.0.0", "2.13.0");
        let views = release_views(&s);
        assert!(views[0].enabled);
        assert!(views[1..].iter().all(|view| !view.enabled));

        // A later step marked done by hand stays disabled while an earlier one is pending.
        s.checklist.close_milestone.done = true;
        s.checklist.merge_release_pr.done = true;
        let views = release_views(&s);
        assert_eq!(views[1].id, StepId::TagRelease);
        assert!(views[1].enabled);
        assert!(views[2..].iter().all(|view| !view.enabled));
        assert_eq!(
            gate(&s, StepId::BackToDevMode).waiting_on,
            Some(StepId::TagRelease)
        );
    }

    #[test]
    fn test_done_steps_are_disabled_except_repeatable() {
        let mut s = state(1, "20.0.0", "");
        s.checklist.code_freeze.done = true;
        s.checklist.check_prs_issues.refresh(&[]);
        assert!(!gate(&s, StepId::CodeFreeze).enabled);
        assert!(gate(&s, StepId::CheckPrsIssues).done);
        assert!(gate(&s, StepId::CheckPrsIssues).enabled);
    }

    #[test]
    fn test_merge_release_pr_hidden_when_nothing_was_committed() {
        let mut s = state(2, "20.0.0", "");
        assert!(gate(&s, StepId::MergeReleasePr).visible);
        s.checklist.create_release_pr.complete(None);
        assert!(!gate(&s, StepId::MergeReleasePr).visible);
        assert_eq!(
            release_views(&s).first().map(|view| view.id),
            Some(StepId::TagRelease)
        );
    }

    #[test]
    fn test_cursor_starts_at_first_pending_step() {
        let s = state(1, "20.0.0", "");
        assert_eq!(cursor(&s), Some(StepId::GeneralPrerequisites));
    }

    #[test]
    fn test_cursor_parks_on_check_when_next_step_is_pending() {
        let mut s = state(1, "20.0.0", "");
        s.checklist.general_prerequisites.done = true;
        s.checklist.slack_announcement.done = true;
        assert_eq!(cursor(&s), Some(StepId::CheckPrsIssues));
    }

    #[test]
    fn test_cursor_skips_check_when_next_step_is_done() {
        let mut s = state(1, "20.0.0", "");
        s.checklist.general_prerequisites.done = true;
        s.checklist.slack_announcement.done = true;
        s.checklist.create_release_branch.complete(None);
        assert_eq!(cursor(&s), Some(StepId::CopyBranchProtection));
    }

    #[test]
    fn test_cursor_falls_back_to_check() {
        let mut s = state(2, "20.0.1", "");
        for step in StepId::ALL {
            if step != StepId::CheckPrsIssues {
                s.checklist.item_mut(step).set_done(true);
            }
        }
        assert_eq!(cursor(&s), Some(StepId::CheckPrsIssues));
        s.checklist.check_prs_issues.refresh(&[]);
        assert_eq!(cursor(&s), None);
    }
}
