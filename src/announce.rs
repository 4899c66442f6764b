//! Community announcement texts.

use crate::config::ReleaseConfig;
use crate::state::ReleaseState;

/// Message announcing the upcoming release and its schedule
pub fn slack_pre_release(state: &ReleaseState, config: &ReleaseConfig) -> String {
    let mut message = format!(
        "Hello everyone, the release of {} is scheduled for {}.",
        state.release,
        state.date.format("%A %B %-d, %Y")
    );
    if state.rc() == 1 {
        message.push_str(&format!(
            " The {} branch will be created and frozen ahead of the release.",
            config.release_branch(&state.release)
        ));
    } else {
        message.push_str(&format!(
            " {} will be frozen ahead of the release.",
            config.release_branch(&state.release)
        ));
    }
    message.push_str(" Please make sure your pending backports are merged before then.");
    message
}

/// Message announcing the published release
pub fn slack_post_release(state: &ReleaseState, config: &ReleaseConfig) -> String {
    let mut message = format!(
        "{} is now available: https://github.com/{}/releases/tag/{}",
        state.release,
        config.repo,
        state.release.tag()
    );
    if state.has_companion_release() {
        message.push_str(&format!(
            "\nThe companion release v{} is out as well.",
            state.companion_release.trim_start_matches('v')
        ));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ForgeRepo, WorkingContext};
    use crate::version::ReleaseVersion;
    use chrono::NaiveDate;

    #[test]
    fn test_post_release_mentions_tag_and_companion() {
        let config = ReleaseConfig::new(
            ForgeRepo::parse("org/repo").unwrap(),
            20,
            WorkingContext::new("."),
        );
        let state = ReleaseState::new(
            ReleaseVersion::parse("20.0.0", 0).unwrap(),
            NaiveDate::from_ymd_opt(2026, 11, 3).unwrap(),
            "2.13.0",
        );
        let message = slack_post_release(&state, &config);
        assert!(message.contains("https://github.com/org/repo/releases/tag/v20.0.0"));
        assert!(message.contains("v2.13.0"));
    }
}
