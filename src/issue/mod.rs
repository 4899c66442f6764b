//! Release issue document codec.
//!
//! A release issue is the single durable record of a release: the title names
//! the version, the body carries the scheduled date, the optional companion
//! release and one markdown checkbox per applicable step. [`serialize`] and
//! [`parse`] convert between that document and [`ReleaseState`]; parsing the
//! output of serialization always yields the same state back.

mod parser;
mod render;

pub use parser::{ParsedBody, ParserState, parse_body};
pub use render::render_body;

use crate::error::IssueError;
use crate::state::ReleaseState;
use crate::version::ReleaseVersion;

/// Prefix of the scheduled date line
pub const DATE_PREFIX: &str = "This release is scheduled for ";

/// Prefix of the companion release line
pub const COMPANION_PREFIX: &str = "Companion release: ";

/// Date format of the scheduled date line, e.g. `Tue Nov 3 2026`
pub const DATE_FORMAT: &str = "%a %b %-d %Y";

/// Title and body of a release issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDocument {
    /// Issue title
    pub title: String,
    /// Markdown body
    pub body: String,
}

/// Render a release state as an issue document.
pub fn serialize(state: &ReleaseState) -> IssueDocument {
    IssueDocument {
        title: state.title(),
        body: render_body(state),
    }
}

/// Rebuild a release state from an issue document.
///
/// Fails when the title does not name a release, when the date line is
/// missing, or when the date cannot be read. Anything else that cannot be
/// recognized is ignored.
pub fn parse(document: &IssueDocument) -> Result<ReleaseState, IssueError> {
    let release = ReleaseVersion::from_title(&document.title)?;
    let body = parse_body(&document.body)?;
    let date = body.date.ok_or(IssueError::MissingDate)?;

    Ok(ReleaseState {
        release,
        companion_release: body.companion_release,
        date,
        checklist: body.checklist,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{GroupEntry, ItemMut};
    use crate::steps::StepId;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, 3).unwrap()
    }

    fn state(version: &str, rc: u32, companion: &str) -> ReleaseState {
        ReleaseState::new(ReleaseVersion::parse(version, rc).unwrap(), date(), companion)
    }

    fn doc(title: &str, body: &str) -> IssueDocument {
        IssueDocument {
            title: title.to_string(),
            body: body.to_string(),
        }
    }

    /// Fill every applicable item with alternating progress and links.
    fn populate(state: &mut ReleaseState) {
        let relevant: Vec<StepId> = StepId::ALL
            .iter()
            .copied()
            .filter(|step| step.is_relevant(state))
            .collect();
        for (n, step) in relevant.into_iter().enumerate() {
            let done = n % 2 == 0;
            let url = format!("https://github.com/org/repo/pull/{}", 100 + n);
            match state.checklist.item_mut(step) {
                ItemMut::Check(item) => item.done = done,
                ItemMut::Linked(item) => {
                    item.done = done;
                    item.url = Some(url);
                }
                ItemMut::MultiLinked(item) => {
                    item.done = done;
                    item.push_url(url);
                    item.push_url("https://github.com/org/companion/releases/tag/v2.13.0");
                }
                ItemMut::Group(group) => {
                    group.done = done;
                    group.items = vec![
                        GroupEntry { done: true, url },
                        GroupEntry {
                            done: false,
                            url: "https://github.com/org/repo/issues/7".to_string(),
                        },
                    ];
                }
            }
        }
    }

    #[test]
    fn test_round_trip_across_release_shapes() {
        let shapes = [
            ("20.0.0", 0),
            ("20.0.3", 0),
            ("20.1.0", 0),
            ("20.0.0", 1),
            ("20.0.0", 2),
        ];
        for (version, rc) in shapes {
            for companion in ["", "2.13.0"] {
                let fresh = state(version, rc, companion);
                assert_eq!(parse(&serialize(&fresh)).unwrap(), fresh);

                let mut progressed = fresh.clone();
                populate(&mut progressed);
                let document = serialize(&progressed);
                let parsed = parse(&document).unwrap();
                assert_eq!(parsed, progressed, "{}\n{}", document.title, document.body);
                assert_eq!(serialize(&parsed), document);
            }
        }
    }

    #[test]
    fn test_rendered_layout() {
        let mut s = state("20.0.0", 0, "2.13.0");
        s.checklist.general_prerequisites.done = true;
        s.checklist.code_freeze.complete(Some("https://github.com/org/repo/pull/42".into()));
        let document = serialize(&s);

        assert_eq!(document.title, "Release of v20.0.0");
        let lines: Vec<&str> = document.body.lines().collect();
        assert_eq!(lines[0], "This release is scheduled for Tue Nov 3 2026.");
        assert_eq!(lines[1], "Companion release: v2.13.0.");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "### Prerequisites");
        assert_eq!(lines[4], "- [x] General prerequisites.");
        assert!(document.body.contains(
            "- [x] Code Freeze.\n  - https://github.com/org/repo/pull/42\n"
        ));
        assert!(document.body.contains("### Post-Release"));
    }

    #[test]
    fn test_linked_item_with_child_url() {
        let body = "This release is scheduled for Tue Nov 3 2026.\n\
                    - [x] Code Freeze.\n  - https://github.com/org/repo/pull/42\n";
        let parsed = parse(&doc("Release of v20.0.0-RC1", body)).unwrap();
        assert_eq!(parsed.rc(), 1);
        assert!(parsed.checklist.code_freeze.done);
        assert_eq!(
            parsed.checklist.code_freeze.url.as_deref(),
            Some("https://github.com/org/repo/pull/42")
        );
    }

    #[test]
    fn test_first_rc_only_items() {
        let rc1 = serialize(&state("20.0.0", 1, ""));
        assert!(rc1.body.contains("Copy branch protection rules."));

        let rc2 = serialize(&state("20.0.0", 2, ""));
        assert!(!rc2.body.contains("Copy branch protection rules."));
        assert!(!rc2.body.contains("Create the release branch."));
        assert!(!parse(&rc2).unwrap().checklist.copy_branch_protection.done);
    }

    #[test]
    fn test_empty_group_round_trips() {
        let mut s = state("20.0.1", 0, "");
        s.checklist.check_prs_issues.refresh(&[]);
        let document = serialize(&s);
        assert!(document.body.contains(
            "- [x] Make sure all Pull Requests and Issues on the milestone are closed, list below.\n\n### Pre-Release\n"
        ));
        let parsed = parse(&document).unwrap();
        assert!(parsed.checklist.check_prs_issues.items.is_empty());
        assert!(parsed.checklist.check_prs_issues.is_done());
    }

    #[test]
    fn test_human_edits_are_tolerated() {
        let body = "Hi all, release notes below.\r\n\
                    This release is scheduled for  Tue Nov 3 2026 .\r\n\
                    \r\n\
                    ### Pre-Release\r\n\
                    -   [X]  Create Release PR.  (opened by @bob)\r\n\
                    \t-  https://github.com/org/repo/pull/9 \r\n\
                    Some note a human added.\r\n\
                    - [ ] Tag the release.\r\n";
        let parsed = parse(&doc("Release of v20.0.2", body)).unwrap();
        assert!(parsed.checklist.create_release_pr.done);
        assert_eq!(
            parsed.checklist.create_release_pr.url.as_deref(),
            Some("https://github.com/org/repo/pull/9")
        );
        assert!(!parsed.checklist.tag_release.done);
        assert_eq!(parsed.companion_release, "");
    }

    #[test]
    fn test_missing_date_is_fatal() {
        let result = parse(&doc("Release of v20.0.0", "- [x] Code Freeze.\n"));
        assert!(matches!(result, Err(IssueError::MissingDate)));
    }

    #[test]
    fn test_unparsable_date_is_fatal() {
        let body = "This release is scheduled for someday.\n";
        assert!(matches!(
            parse(&doc("Release of v20.0.0", body)),
            Err(IssueError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_non_numeric_rc_suffix_is_fatal() {
        let body = "This release is scheduled for Tue Nov 3 2026.\n";
        assert!(matches!(
            parse(&doc("Release of v20.0.0-RCx", body)),
            Err(IssueError::InvalidRcSuffix { .. })
        ));
    }

    #[test]
    fn test_companion_line() {
        let body = "This release is scheduled for Tue Nov 3 2026.\nCompanion release: v2.13.0.\n";
        let parsed = parse(&doc("Release of v20.0.0", body)).unwrap();
        assert_eq!(parsed.companion_release, "2.13.0");
        assert!(parsed.has_companion_release());
    }
}
