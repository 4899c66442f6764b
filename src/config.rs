//! Release configuration.
//!
//! [`ReleaseConfig`] is built once at startup from built-in defaults, an
//! optional TOML file and command line flags (in that order of precedence),
//! then handed to the orchestrator by reference.

use crate::error::{ConfigError, Result};
use crate::version::ReleaseVersion;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

/// Config file looked up in the repository root
pub const REPO_CONFIG_FILE: &str = ".release-captain.toml";

/// Forge repository, `owner/name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgeRepo {
    /// Owner or organization
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl ForgeRepo {
    /// Parse `owner/name`, a GitHub URL or an SSH remote
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if let Some(repo) = Self::from_remote_url(input) {
            return Ok(repo);
        }
        match input.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.trim_end_matches(".git").to_string(),
                })
            }
            _ => Err(ConfigError::InvalidRepository {
                value: input.to_string(),
            }
            .into()),
        }
    }

    /// Extract the repository from a git remote URL
    pub fn from_remote_url(url: &str) -> Option<Self> {
        static REMOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"github\.com[:/](?P<owner>[^/\s]+)/(?P<name>[^/\s]+?)(?:\.git)?/?$")
                .expect("remote URL regex is valid")
        });
        let caps = REMOTE_RE.captures(url.trim())?;
        Some(Self {
            owner: caps["owner"].to_string(),
            name: caps["name"].to_string(),
        })
    }
}

impl fmt::Display for ForgeRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Local working copy that git commands run against.
///
/// Threaded explicitly through every repository call so the process working
/// directory never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingContext {
    /// Root of the working copy
    pub repo_path: PathBuf,
}

impl WorkingContext {
    /// Context rooted at `repo_path`
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    /// Absolute path of a repository-relative file
    pub fn path(&self, relative: &Path) -> PathBuf {
        self.repo_path.join(relative)
    }
}

/// Policy for marking the forge release as "latest"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LatestPolicy {
    /// Latest for every non-RC release
    #[default]
    Auto,
    /// Always latest
    Always,
    /// Never latest (e.g. patch release on an older branch)
    Never,
}

impl LatestPolicy {
    /// Whether the release should be marked latest
    pub fn is_latest(&self, release: &ReleaseVersion) -> bool {
        match self {
            LatestPolicy::Auto => release.rc() == 0,
            LatestPolicy::Always => true,
            LatestPolicy::Never => false,
        }
    }
}

/// Companion project released in lockstep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionConfig {
    /// Forge repository of the companion project
    pub repo: ForgeRepo,
    /// Local working copy of the companion project
    pub working: WorkingContext,
    /// Version file inside the companion working copy
    pub version_file: PathBuf,
    /// Default branch of the companion project
    pub default_branch: String,
    /// Git remote of the companion working copy
    pub remote: String,
}

impl CompanionConfig {
    /// `remote/branch` in the companion working copy
    pub fn remote_ref(&self, branch: &str) -> String {
        format!("{}/{}", self.remote, branch)
    }
}

/// Repository-relative files edited by step actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFiles {
    /// File holding the project version string
    pub version_file: PathBuf,
    /// Workflow that fails while the branch is frozen
    pub code_freeze_workflow: PathBuf,
    /// Root directory of per-release notes
    pub release_notes_dir: PathBuf,
}

impl Default for ReleaseFiles {
    fn default() -> Self {
        Self {
            version_file: PathBuf::from("VERSION"),
            code_freeze_workflow: PathBuf::from(".github/workflows/code_freeze.yml"),
            release_notes_dir: PathBuf::from("changelog"),
        }
    }
}

/// Labels applied by the tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLabels {
    /// Label of the release issue
    pub release_issue: String,
    /// Labels of PRs opened by the tool
    pub pull_requests: Vec<String>,
    /// Prefix of the backport label, followed by the release branch
    pub backport_prefix: String,
}

impl Default for ReleaseLabels {
    fn default() -> Self {
        Self {
            release_issue: "Release".to_string(),
            pull_requests: vec!["Type: Release".to_string()],
            backport_prefix: "Backport to: ".to_string(),
        }
    }
}

/// Configuration of one tool invocation
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    /// Forge repository of the project
    pub repo: ForgeRepo,
    /// Git remote name
    pub remote: String,
    /// Default branch
    pub default_branch: String,
    /// Release branch prefix, followed by `X.0`
    pub branch_prefix: String,
    /// Target major version
    pub major: u64,
    /// Companion release version given on the command line; empty when none
    pub companion_release: String,
    /// Companion project settings
    pub companion: Option<CompanionConfig>,
    /// Release issue number override
    pub issue: Option<u64>,
    /// Working copy of the project
    pub working: WorkingContext,
    /// Latest-release policy
    pub mark_latest: LatestPolicy,
    /// Interval between merge status polls
    pub poll_interval: Duration,
    /// Assignee of the release issue
    pub assignee: Option<String>,
    /// Files edited by actions
    pub files: ReleaseFiles,
    /// Labels applied by actions
    pub labels: ReleaseLabels,
}

impl ReleaseConfig {
    /// Configuration with built-in defaults
    pub fn new(repo: ForgeRepo, major: u64, working: WorkingContext) -> Self {
        Self {
            repo,
            remote: "origin".to_string(),
            default_branch: "main".to_string(),
            branch_prefix: "release-".to_string(),
            major,
            companion_release: String::new(),
            companion: None,
            issue: None,
            working,
            mark_latest: LatestPolicy::Auto,
            poll_interval: Duration::from_secs(5),
            assignee: None,
            files: ReleaseFiles::default(),
            labels: ReleaseLabels::default(),
        }
    }

    /// Overlay the values present in a config file
    pub fn apply_file(&mut self, file: FileConfig) -> Result<()> {
        if let Some(remote) = file.remote {
            self.remote = remote;
        }
        if let Some(branch) = file.default_branch {
            self.default_branch = branch;
        }
        if let Some(prefix) = file.branch_prefix {
            self.branch_prefix = prefix;
        }
        if let Some(policy) = file.mark_latest {
            self.mark_latest = policy;
        }
        if let Some(secs) = file.poll_interval_secs {
            self.poll_interval = Duration::from_secs(secs.max(1));
        }
        if file.assignee.is_some() {
            self.assignee = file.assignee;
        }
        if let Some(path) = file.version_file {
            self.files.version_file = path;
        }
        if let Some(path) = file.code_freeze_workflow {
            self.files.code_freeze_workflow = path;
        }
        if let Some(path) = file.release_notes_dir {
            self.files.release_notes_dir = path;
        }
        if let Some(label) = file.release_issue_label {
            self.labels.release_issue = label;
        }
        if let Some(labels) = file.pull_request_labels {
            self.labels.pull_requests = labels;
        }
        if let Some(companion) = file.companion {
            let working = if companion.path.is_absolute() {
                WorkingContext::new(companion.path)
            } else {
                WorkingContext::new(self.working.repo_path.join(companion.path))
            };
            self.companion = Some(CompanionConfig {
                repo: ForgeRepo::parse(&companion.repo)?,
                working,
                version_file: companion
                    .version_file
                    .unwrap_or_else(|| PathBuf::from("VERSION")),
                default_branch: companion.default_branch.unwrap_or_else(|| "main".to_string()),
                remote: companion.remote.unwrap_or_else(|| "origin".to_string()),
            });
        }
        Ok(())
    }

    /// Release branch of a release
    pub fn release_branch(&self, release: &ReleaseVersion) -> String {
        release.release_branch(&self.branch_prefix)
    }

    /// Backport label of a release branch
    pub fn backport_label(&self, release: &ReleaseVersion) -> String {
        format!("{}{}", self.labels.backport_prefix, self.release_branch(release))
    }

    /// Repository-relative path of the release notes of a release
    pub fn release_notes_path(&self, release: &ReleaseVersion) -> PathBuf {
        self.files
            .release_notes_dir
            .join(format!("{}.0", release.major()))
            .join(release.release_version_string())
            .join("release_notes.md")
    }

    /// `remote/branch`
    pub fn remote_ref(&self, branch: &str) -> String {
        format!("{}/{}", self.remote, branch)
    }
}

/// Companion section of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanionFileConfig {
    /// `owner/name` of the companion repository
    pub repo: String,
    /// Path of the companion working copy, relative to the project
    pub path: PathBuf,
    /// Version file inside the companion working copy
    pub version_file: Option<PathBuf>,
    /// Default branch of the companion project
    pub default_branch: Option<String>,
    /// Git remote of the companion working copy
    pub remote: Option<String>,
}

/// Contents of `.release-captain.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// `owner/name` of the project
    pub repo: Option<String>,
    /// Git remote name
    pub remote: Option<String>,
    /// Default branch
    pub default_branch: Option<String>,
    /// Release branch prefix
    pub branch_prefix: Option<String>,
    /// Latest-release policy
    pub mark_latest: Option<LatestPolicy>,
    /// Seconds between merge polls
    pub poll_interval_secs: Option<u64>,
    /// Release issue assignee
    pub assignee: Option<String>,
    /// Version file path
    pub version_file: Option<PathBuf>,
    /// Code freeze workflow path
    pub code_freeze_workflow: Option<PathBuf>,
    /// Release notes root
    pub release_notes_dir: Option<PathBuf>,
    /// Release issue label
    pub release_issue_label: Option<String>,
    /// Labels of PRs opened by the tool
    pub pull_request_labels: Option<Vec<String>>,
    /// Companion project
    pub companion: Option<CompanionFileConfig>,
}

impl FileConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| {
            ConfigError::InvalidFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Locate and parse the config file.
    ///
    /// An explicit path must exist. Otherwise the repository file wins over
    /// the user file, and no file at all yields the defaults.
    pub fn discover(explicit: Option<&Path>, repo_path: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidates = [
            Some(repo_path.join(REPO_CONFIG_FILE)),
            dirs::config_dir().map(|dir| dir.join("kodegen").join("release-captain.toml")),
        ];
        for candidate in candidates.into_iter().flatten() {
            if candidate.is_file() {
                log::debug!("Using config file {}", candidate.display());
                return Self::load(&candidate);
            }
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_parsing() {
        let expected = ForgeRepo {
            owner: "vitessio".to_string(),
            name: "vitess".to_string(),
        };
        assert_eq!(ForgeRepo::parse("vitessio/vitess").unwrap(), expected);
        assert_eq!(
            ForgeRepo::parse("https://github.com/vitessio/vitess.git").unwrap(),
            expected
        );
        assert_eq!(
            ForgeRepo::parse("git@github.com:vitessio/vitess.git").unwrap(),
            expected
        );
        assert!(ForgeRepo::parse("vitess").is_err());
    }

    #[test]
    fn test_latest_policy() {
        let rc = ReleaseVersion::parse("20.0.0", 1).unwrap();
        let ga = ReleaseVersion::parse("20.0.0", 0).unwrap();
        assert!(!LatestPolicy::Auto.is_latest(&rc));
        assert!(LatestPolicy::Auto.is_latest(&ga));
        assert!(!LatestPolicy::Never.is_latest(&ga));
        assert!(LatestPolicy::Always.is_latest(&rc));
    }

    #[test]
    fn test_file_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(REPO_CONFIG_FILE);
        std::fs::write(
            &path,
            r#"
remote = "upstream"
mark_latest = "never"
poll_interval_secs = 30
version_file = "go/vt/servenv/version.go"

[companion]
repo = "planetscale/vitess-operator"
path = "../vitess-operator"
"#,
        )
        .unwrap();

        let file = FileConfig::discover(None, dir.path()).unwrap();
        let mut config = ReleaseConfig::new(
            ForgeRepo::parse("vitessio/vitess").unwrap(),
            20,
            WorkingContext::new(dir.path()),
        );
        config.apply_file(file).unwrap();

        assert_eq!(config.remote, "upstream");
        assert_eq!(config.mark_latest, LatestPolicy::Never);
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(
            config.files.version_file,
            PathBuf::from("go/vt/servenv/version.go")
        );
        let companion = config.companion.unwrap();
        assert_eq!(companion.repo.to_string(), "planetscale/vitess-operator");
        assert_eq!(
            companion.working.repo_path,
            dir.path().join("../vitess-operator")
        );
        assert_eq!(companion.remote, "origin");
        assert_eq!(companion.remote_ref("main"), "origin/main");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "remot = \"origin\"\n").unwrap();
        let err = FileConfig::discover(Some(&path), dir.path()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReleaseError::Config(ConfigError::InvalidFile { .. })
        ));
    }

    #[test]
    fn test_release_paths() {
        let config = ReleaseConfig::new(
            ForgeRepo::parse("org/repo").unwrap(),
            20,
            WorkingContext::new("/tmp/repo"),
        );
        let rc1 = ReleaseVersion::parse("20.0.0", 1).unwrap();
        assert_eq!(config.release_branch(&rc1), "release-20.0");
        assert_eq!(config.backport_label(&rc1), "Backport to: release-20.0");
        assert_eq!(
            config.release_notes_path(&rc1),
            PathBuf::from("changelog/20.0/20.0.0-rc1/release_notes.md")
        );
    }
}
