//! Release identifier handling.
//!
//! A release is identified by a semantic version plus an optional release
//! candidate increment. Everything that is named after the release (issue
//! title, tag, branch, milestones, SNAPSHOT versions) is derived here so that
//! step actions and the document codec agree on the exact spelling.

mod updater;

pub use updater::{enable_code_freeze, set_version_in_file, write_release_notes_stub};

use crate::error::{ConfigError, IssueError, Result};
use regex::Regex;
use semver::Version;
use std::fmt;
use std::sync::LazyLock;

/// Prefix every release issue title starts with
pub const TITLE_PREFIX: &str = "Release of v";

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Release of v(?P<version>\d+\.\d+\.\d+)(?:-RC(?P<rc>\S*))?")
        .expect("title regex is valid")
});

/// Version being released, with its release candidate increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVersion {
    version: Version,
    rc: u32,
}

impl ReleaseVersion {
    /// Create a release version. `rc == 0` means "not a release candidate".
    pub fn new(version: Version, rc: u32) -> Self {
        Self { version, rc }
    }

    /// Parse `X.Y.Z` (a leading `v` is accepted).
    pub fn parse(version: &str, rc: u32) -> Result<Self> {
        let trimmed = version.trim().trim_start_matches('v');
        let parsed = Version::parse(trimmed).map_err(|e| ConfigError::InvalidVersion {
            version: version.to_string(),
            reason: e.to_string(),
        })?;
        if !parsed.pre.is_empty() || !parsed.build.is_empty() {
            return Err(ConfigError::InvalidVersion {
                version: version.to_string(),
                reason: "pass the bare X.Y.Z version and use --rc for candidates".to_string(),
            }
            .into());
        }
        Ok(Self::new(parsed, rc))
    }

    /// Recover the release version from an issue title.
    ///
    /// The RC suffix is the only source of the RC increment, so a suffix that
    /// is not an integer is reported as a hard error.
    pub fn from_title(title: &str) -> std::result::Result<Self, IssueError> {
        let caps = TITLE_RE.captures(title).ok_or_else(|| IssueError::InvalidTitle {
            title: title.to_string(),
        })?;
        let version =
            Version::parse(&caps["version"]).map_err(|_| IssueError::InvalidTitle {
                title: title.to_string(),
            })?;
        let rc = match caps.name("rc") {
            Some(suffix) => {
                suffix
                    .as_str()
                    .parse::<u32>()
                    .map_err(|_| IssueError::InvalidRcSuffix {
                        title: title.to_string(),
                        suffix: suffix.as_str().to_string(),
                    })?
            }
            None => 0,
        };
        Ok(Self::new(version, rc))
    }

    /// Underlying semantic version
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Release candidate increment (0 = not an RC)
    pub fn rc(&self) -> u32 {
        self.rc
    }

    /// Major version
    pub fn major(&self) -> u64 {
        self.version.major
    }

    /// General availability release: `X.0.0` without an RC increment
    pub fn is_ga(&self) -> bool {
        self.rc == 0 && self.version.minor == 0 && self.version.patch == 0
    }

    /// Patch release: `X.Y.Z` with `Z > 0`
    pub fn is_patch(&self) -> bool {
        self.rc == 0 && self.version.patch > 0
    }

    /// Issue title, `Release of vX.Y.Z[-RCN]`
    pub fn title(&self) -> String {
        format!("{}{}", TITLE_PREFIX, self.display_suffix())
    }

    /// Title prefix shared by every issue of a major release line
    pub fn title_prefix_for_major(major: u64) -> String {
        format!("{}{}.", TITLE_PREFIX, major)
    }

    fn display_suffix(&self) -> String {
        if self.rc > 0 {
            format!("{}-RC{}", self.version, self.rc)
        } else {
            self.version.to_string()
        }
    }

    /// Git tag, `vX.Y.Z` or `vX.Y.Z-rcN`
    pub fn tag(&self) -> String {
        if self.rc > 0 {
            format!("v{}-rc{}", self.version, self.rc)
        } else {
            format!("v{}", self.version)
        }
    }

    /// Version string written into the version file for the release commit
    pub fn release_version_string(&self) -> String {
        if self.rc > 0 {
            format!("{}-rc{}", self.version, self.rc)
        } else {
            self.version.to_string()
        }
    }

    /// Release branch, `<prefix>X.0`
    pub fn release_branch(&self, prefix: &str) -> String {
        format!("{}{}.0", prefix, self.version.major)
    }

    /// Milestone of this release
    pub fn milestone(&self) -> String {
        format!("v{}", self.version)
    }

    /// Milestone of the release that follows this one on the same branch
    pub fn next_milestone(&self) -> String {
        format!("v{}", self.next_patch())
    }

    fn next_patch(&self) -> Version {
        Version::new(
            self.version.major,
            self.version.minor,
            self.version.patch + 1,
        )
    }

    /// Development version of the release branch once this release is out
    pub fn dev_version(&self) -> String {
        if self.rc > 0 {
            format!("{}-SNAPSHOT", self.version)
        } else {
            format!("{}-SNAPSHOT", self.next_patch())
        }
    }

    /// Development version of the default branch once the release branch is cut
    pub fn next_main_dev_version(&self) -> String {
        format!("{}.0.0-SNAPSHOT", self.version.major + 1)
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.display_suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_round_trip() {
        let rc1 = ReleaseVersion::parse("20.0.0", 1).unwrap();
        assert_eq!(rc1.title(), "Release of v20.0.0-RC1");
        assert_eq!(ReleaseVersion::from_title(&rc1.title()).unwrap(), rc1);

        let patch = ReleaseVersion::parse("v19.0.4", 0).unwrap();
        assert_eq!(patch.title(), "Release of v19.0.4");
        assert_eq!(ReleaseVersion::from_title(&patch.title()).unwrap(), patch);
    }

    #[test]
    fn test_title_with_surrounding_text() {
        let parsed = ReleaseVersion::from_title("[WIP] Release of v21.0.0-RC2 (tracking)").unwrap();
        assert_eq!(parsed.rc(), 2);
        assert_eq!(parsed.major(), 21);
    }

    #[test]
    fn test_invalid_rc_suffix_is_rejected() {
        let err = ReleaseVersion::from_title("Release of v20.0.0-RCx").unwrap_err();
        assert!(matches!(err, IssueError::InvalidRcSuffix { ref suffix, .. } if suffix == "x"));
    }

    #[test]
    fn test_invalid_title() {
        assert!(matches!(
            ReleaseVersion::from_title("Quarterly planning"),
            Err(IssueError::InvalidTitle { .. })
        ));
    }

    #[test]
    fn test_release_kinds() {
        assert!(ReleaseVersion::parse("20.0.0", 0).unwrap().is_ga());
        assert!(!ReleaseVersion::parse("20.0.0", 2).unwrap().is_ga());
        assert!(ReleaseVersion::parse("20.0.3", 0).unwrap().is_patch());
        assert!(!ReleaseVersion::parse("20.0.3", 0).unwrap().is_ga());
    }

    #[test]
    fn test_derived_names() {
        let rc1 = ReleaseVersion::parse("20.0.0", 1).unwrap();
        assert_eq!(rc1.tag(), "v20.0.0-rc1");
        assert_eq!(rc1.tag(), format!("v{}", rc1.release_version_string()));
        assert_eq!(rc1.release_branch("release-"), "release-20.0");
        assert_eq!(rc1.milestone(), "v20.0.0");
        assert_eq!(rc1.next_milestone(), "v20.0.1");
        assert_eq!(rc1.dev_version(), "20.0.0-SNAPSHOT");
        assert_eq!(rc1.next_main_dev_version(), "21.0.0-SNAPSHOT");

        let ga = ReleaseVersion::parse("20.0.0", 0).unwrap();
        assert_eq!(ga.tag(), "v20.0.0");
        assert_eq!(ga.dev_version(), "20.0.1-SNAPSHOT");
    }

    #[test]
    fn test_prerelease_versions_are_rejected() {
        assert!(ReleaseVersion::parse("20.0.0-rc1", 0).is_err());
    }
}
