//! Issue body to release state.
//!
//! The body is written by this tool but edited by humans in the forge UI, so
//! the scanner only relies on the fixed label substrings, the checkbox marker
//! before them, and the indented list items that follow them. Everything else
//! is ignored.

use super::{COMPANION_PREFIX, DATE_PREFIX};
use crate::error::IssueError;
use crate::state::{Checklist, GroupEntry, ItemMut};
use crate::steps::StepId;
use chrono::NaiveDate;
use std::sync::LazyLock;

/// Steps ordered by decreasing label length so the most specific label wins.
static LABELS_LONGEST_FIRST: LazyLock<Vec<StepId>> = LazyLock::new(|| {
    let mut steps = StepId::ALL.to_vec();
    steps.sort_by_key(|step| std::cmp::Reverse(step.label().len()));
    steps
});

/// Header fields and checklist recovered from a body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedBody {
    /// Scheduled date, if the date line was found
    pub date: Option<NaiveDate>,
    /// Companion release, empty when absent
    pub companion_release: String,
    /// Checklist items
    pub checklist: Checklist,
}

/// Scanner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Looking for header lines and item labels
    ReadingTopLevel,
    /// Collecting the indented children of the given item
    CollectingChild(StepId),
}

impl ParserState {
    /// Feed one line.
    ///
    /// Returns the next state and whether the line was consumed. A line that
    /// is not consumed must be fed again in the returned state.
    pub fn step(
        self,
        line: &str,
        parsed: &mut ParsedBody,
    ) -> Result<(ParserState, bool), IssueError> {
        match self {
            ParserState::ReadingTopLevel => read_top_level(line, parsed),
            ParserState::CollectingChild(step) => Ok(collect_child(step, line, parsed)),
        }
    }
}

fn read_top_level(
    line: &str,
    parsed: &mut ParsedBody,
) -> Result<(ParserState, bool), IssueError> {
    if let Some(index) = line.find(DATE_PREFIX) {
        parsed.date = Some(parse_date(&line[index + DATE_PREFIX.len()..])?);
        return Ok((ParserState::ReadingTopLevel, true));
    }
    if let Some(index) = line.find(COMPANION_PREFIX) {
        let value = strip_sentence_end(&line[index + COMPANION_PREFIX.len()..]);
        parsed.companion_release = value.trim_start_matches('v').to_string();
        return Ok((ParserState::ReadingTopLevel, true));
    }

    let Some((step, index)) = LABELS_LONGEST_FIRST
        .iter()
        .find_map(|step| line.find(step.label()).map(|index| (*step, index)))
    else {
        return Ok((ParserState::ReadingTopLevel, true));
    };

    let done = is_checked(&line[..index]);
    let mut item = parsed.checklist.item_mut(step);
    item.set_done(done);
    let next = match item {
        ItemMut::Check(_) => ParserState::ReadingTopLevel,
        _ => ParserState::CollectingChild(step),
    };
    Ok((next, true))
}

fn collect_child(step: StepId, line: &str, parsed: &mut ParsedBody) -> (ParserState, bool) {
    let Some(content) = child_content(line) else {
        return (ParserState::ReadingTopLevel, false);
    };

    match parsed.checklist.item_mut(step) {
        ItemMut::Check(_) => return (ParserState::ReadingTopLevel, false),
        ItemMut::Linked(item) => {
            let (_, text) = split_checkbox(content);
            if !text.is_empty() && item.url.is_none() {
                item.url = Some(text.to_string());
            }
        }
        ItemMut::MultiLinked(item) => {
            let (_, text) = split_checkbox(content);
            if !text.is_empty() {
                item.urls.push(text.to_string());
            }
        }
        ItemMut::Group(group) => {
            let (done, text) = split_checkbox(content);
            if !text.is_empty() {
                group.items.push(GroupEntry {
                    done: done.unwrap_or(false),
                    url: text.to_string(),
                });
            }
        }
    }
    (ParserState::CollectingChild(step), true)
}

/// Content of an indented list item, `None` for any other line shape
fn child_content(line: &str) -> Option<&str> {
    if !line.starts_with([' ', '\t']) {
        return None;
    }
    let rest = line.trim_start();
    let rest = rest.strip_prefix('-').or_else(|| rest.strip_prefix('*'))?;
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    Some(rest.trim())
}

/// Leading `[x]`/`[ ]` marker, if any, and the remaining text
fn split_checkbox(content: &str) -> (Option<bool>, &str) {
    let content = content.trim();
    for (marker, done) in [("[x]", true), ("[X]", true), ("[ ]", false), ("[]", false)] {
        if let Some(rest) = content.strip_prefix(marker) {
            return (Some(done), rest.trim());
        }
    }
    (None, content)
}

fn is_checked(prefix: &str) -> bool {
    prefix.contains("[x]") || prefix.contains("[X]")
}

fn strip_sentence_end(value: &str) -> String {
    let value = value.trim();
    value.strip_suffix('.').unwrap_or(value).trim().to_string()
}

/// Parse `Tue Nov 3 2026`. The weekday is optional and not cross-checked.
fn parse_date(raw: &str) -> Result<NaiveDate, IssueError> {
    let value = strip_sentence_end(raw);
    let tokens: Vec<&str> = value.split_whitespace().collect();
    let without_weekday = match tokens.as_slice() {
        [_, month, day, year] => format!("{} {} {}", month, day, year),
        _ => tokens.join(" "),
    };
    NaiveDate::parse_from_str(&without_weekday, "%b %d %Y").map_err(|e| {
        IssueError::InvalidDate {
            value,
            reason: e.to_string(),
        }
    })
}

/// Scan a whole body.
pub fn parse_body(body: &str) -> Result<ParsedBody, IssueError> {
    let mut parsed = ParsedBody::default();
    let mut state = ParserState::ReadingTopLevel;
    for line in body.lines() {
        loop {
            let (next, consumed) = state.step(line, &mut parsed)?;
            state = next;
            if consumed {
                break;
            }
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_label_enters_child_collection() {
        let mut parsed = ParsedBody::default();
        let (next, consumed) = ParserState::ReadingTopLevel
            .step("- [x] Code Freeze.", &mut parsed)
            .unwrap();
        assert!(consumed);
        assert_eq!(next, ParserState::CollectingChild(StepId::CodeFreeze));
        assert!(parsed.checklist.code_freeze.done);
    }

    #[test]
    fn test_check_item_stays_top_level() {
        let mut parsed = ParsedBody::default();
        let (next, _) = ParserState::ReadingTopLevel
            .step("- [ ] Copy branch protection rules.", &mut parsed)
            .unwrap();
        assert_eq!(next, ParserState::ReadingTopLevel);
        assert!(!parsed.checklist.copy_branch_protection.done);
    }

    #[test]
    fn test_non_child_line_is_handed_back() {
        let mut parsed = ParsedBody::default();
        let state = ParserState::CollectingChild(StepId::CodeFreeze);
        let (next, consumed) = state.step("- [x] Tag the release.", &mut parsed).unwrap();
        assert_eq!(next, ParserState::ReadingTopLevel);
        assert!(!consumed);
        assert!(!parsed.checklist.tag_release.done);
    }

    #[test]
    fn test_group_children_keep_their_checkboxes() {
        let mut parsed = ParsedBody::default();
        let state = ParserState::CollectingChild(StepId::CheckPrsIssues);
        let (state, _) = state
            .step("  - [x] https://github.com/org/repo/pull/1", &mut parsed)
            .unwrap();
        let (state, _) = state
            .step("\t- [ ]   https://github.com/org/repo/issues/2  ", &mut parsed)
            .unwrap();
        assert_eq!(state, ParserState::CollectingChild(StepId::CheckPrsIssues));
        let items = &parsed.checklist.check_prs_issues.items;
        assert_eq!(items.len(), 2);
        assert!(items[0].done);
        assert!(!items[1].done);
        assert_eq!(items[1].url, "https://github.com/org/repo/issues/2");
    }

    #[test]
    fn test_child_shape() {
        assert_eq!(child_content("  - url"), Some("url"));
        assert_eq!(child_content("    * url"), Some("url"));
        assert_eq!(child_content("- url"), None);
        assert_eq!(child_content("  -url"), None);
        assert_eq!(child_content(""), None);
        assert_eq!(child_content("  text"), None);
    }

    #[test]
    fn test_labels_tolerate_surrounding_text() {
        let parsed = parse_body(
            "This release is scheduled for Tue Nov 3 2026.\n\
             *  [X]   ~~Notify the community on Slack.~~ (done by @alice)\n\
             - [ ] Notify the community on Slack for the new release.\r\n",
        )
        .unwrap();
        assert!(parsed.checklist.slack_announcement.done);
        assert!(!parsed.checklist.slack_post_release.done);
    }

    #[test]
    fn test_date_parsing() {
        let expected = NaiveDate::from_ymd_opt(2026, 11, 3).unwrap();
        assert_eq!(parse_date("Tue Nov 3 2026.").unwrap(), expected);
        assert_eq!(parse_date("  Tue Nov 03 2026 ").unwrap(), expected);
        assert_eq!(parse_date("Nov 3 2026").unwrap(), expected);
        assert!(matches!(
            parse_date("next Tuesday"),
            Err(IssueError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_invalid_date_is_an_error() {
        assert!(parse_body("This release is scheduled for soon.\n").is_err());
    }
}
