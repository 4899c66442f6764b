//! In-memory forge and repository used by the integration tests.
//!
//! Both fakes are cheap handles over shared state so a test can keep one
//! clone for assertions while the orchestrator owns another.

#![allow(dead_code)]

use chrono::NaiveDate;
use kodegen_release_captain::config::{ForgeRepo, ReleaseConfig, WorkingContext};
use kodegen_release_captain::error::{ForgeError, GitError, Result};
use kodegen_release_captain::forge::{ForgeOperations, Issue, NewPullRequest, NewRelease, PullRequest};
use kodegen_release_captain::git::{CommitOutcome, GitOperations};
use kodegen_release_captain::issue;
use kodegen_release_captain::state::ReleaseState;
use kodegen_release_captain::version::ReleaseVersion;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tempfile::TempDir;

pub const REPO: &str = "vitessio/vitess";
pub const RELEASE_LABEL: &str = "Release";

#[derive(Debug, Clone)]
pub struct StoredIssue {
    pub issue: Issue,
    pub labels: Vec<String>,
    pub open: bool,
}

#[derive(Debug, Default)]
pub struct ForgeInner {
    pub issues: BTreeMap<u64, StoredIssue>,
    pub next_number: u64,
    pub open_prs: Vec<PullRequest>,
    pub created_prs: Vec<NewPullRequest>,
    pub merged: BTreeSet<String>,
    /// Merge every PR after this many polls; `None` never merges on its own
    pub merge_after_polls: Option<usize>,
    pub polls: HashMap<String, usize>,
    pub milestone_items: BTreeMap<String, Vec<String>>,
    pub milestones: BTreeMap<String, bool>,
    pub labels: BTreeSet<String>,
    pub releases: BTreeMap<String, NewRelease>,
    /// Names of write calls, in order
    pub writes: Vec<String>,
    /// Write calls that fail the next time they are made
    pub fail_next: BTreeSet<String>,
}

impl ForgeInner {
    /// Record a write, or fail it once if it was armed with [`FakeForge::fail_next`]
    fn write(&mut self, name: &str) -> Result<()> {
        if self.fail_next.remove(name) {
            return Err(ForgeError::CommandFailed {
                command: format!("gh {}", name),
                stderr: "HTTP 502".to_string(),
            }
            .into());
        }
        self.writes.push(name.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeForge {
    inner: Arc<Mutex<ForgeInner>>,
}

impl FakeForge {
    pub fn new() -> Self {
        let forge = Self::default();
        {
            let mut inner = forge.lock();
            inner.next_number = 1000;
            inner.merge_after_polls = Some(0);
        }
        forge
    }

    pub fn lock(&self) -> MutexGuard<'_, ForgeInner> {
        self.inner.lock().unwrap()
    }

    /// Store an open, labelled release issue rendered from `state`
    pub fn seed_issue(&self, state: &ReleaseState) -> u64 {
        let document = issue::serialize(state);
        let mut inner = self.lock();
        inner.next_number += 1;
        let number = inner.next_number;
        inner.issues.insert(
            number,
            StoredIssue {
                issue: Issue {
                    number,
                    title: document.title,
                    body: document.body,
                    url: issue_url(number),
                },
                labels: vec![RELEASE_LABEL.to_string()],
                open: true,
            },
        );
        number
    }

    pub fn body(&self, number: u64) -> String {
        self.lock().issues[&number].issue.body.clone()
    }

    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    pub fn write_count(&self, name: &str) -> usize {
        self.lock().writes.iter().filter(|w| *w == name).count()
    }

    pub fn add_open_pr(&self, title: &str, url: &str) {
        self.lock().open_prs.push(PullRequest {
            number: pr_number(url),
            title: title.to_string(),
            url: url.to_string(),
        });
    }

    pub fn never_merge(&self) {
        self.lock().merge_after_polls = None;
    }

    pub fn merge_after(&self, polls: usize) {
        self.lock().merge_after_polls = Some(polls);
    }

    /// Make the next call of the write `name` fail with a server error
    pub fn fail_next(&self, name: &str) {
        self.lock().fail_next.insert(name.to_string());
    }

    pub fn is_open(&self, number: u64) -> bool {
        self.lock().issues[&number].open
    }

    pub fn set_milestone_items(&self, milestone: &str, urls: &[&str]) {
        self.lock().milestone_items.insert(
            milestone.to_string(),
            urls.iter().map(|u| u.to_string()).collect(),
        );
    }
}

pub fn issue_url(number: u64) -> String {
    format!("https://github.com/{}/issues/{}", REPO, number)
}

pub fn pr_url(number: u64) -> String {
    format!("https://github.com/{}/pull/{}", REPO, number)
}

fn pr_number(url: &str) -> u64 {
    url.rsplit('/').next().and_then(|n| n.parse().ok()).unwrap_or(0)
}

impl ForgeOperations for FakeForge {
    async fn fetch_issue(&self, _repo: &ForgeRepo, number: u64) -> Result<Issue> {
        self.lock()
            .issues
            .get(&number)
            .map(|stored| stored.issue.clone())
            .ok_or_else(|| ForgeError::IssueNotFound { number }.into())
    }

    async fn find_release_issue(
        &self,
        _repo: &ForgeRepo,
        title_prefix: &str,
        label: &str,
    ) -> Result<Option<Issue>> {
        let inner = self.lock();
        let matches: Vec<&StoredIssue> = inner
            .issues
            .values()
            .filter(|stored| {
                stored.open
                    && stored.labels.iter().any(|l| l == label)
                    && stored.issue.title.starts_with(title_prefix)
            })
            .collect();
        match matches.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(single.issue.clone())),
            many => Err(ForgeError::AmbiguousIssue {
                title: title_prefix.to_string(),
                count: many.len(),
            }
            .into()),
        }
    }

    async fn create_issue(
        &self,
        _repo: &ForgeRepo,
        title: &str,
        body: &str,
        labels: &[String],
        _assignee: Option<&str>,
    ) -> Result<Issue> {
        let mut inner = self.lock();
        inner.write("create_issue")?;
        inner.next_number += 1;
        let number = inner.next_number;
        let issue = Issue {
            number,
            title: title.to_string(),
            body: body.to_string(),
            url: issue_url(number),
        };
        inner.issues.insert(
            number,
            StoredIssue {
                issue: issue.clone(),
                labels: labels.to_vec(),
                open: true,
            },
        );
        Ok(issue)
    }

    async fn update_issue_body(&self, _repo: &ForgeRepo, number: u64, body: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.write("update_issue_body")?;
        let stored = inner
            .issues
            .get_mut(&number)
            .ok_or(ForgeError::IssueNotFound { number })?;
        stored.issue.body = body.to_string();
        Ok(())
    }

    async fn close_issue(&self, _repo: &ForgeRepo, number: u64) -> Result<()> {
        let mut inner = self.lock();
        inner.write("close_issue")?;
        let stored = inner
            .issues
            .get_mut(&number)
            .ok_or(ForgeError::IssueNotFound { number })?;
        stored.open = false;
        Ok(())
    }

    async fn find_open_pr_by_title(
        &self,
        _repo: &ForgeRepo,
        title: &str,
    ) -> Result<Option<PullRequest>> {
        let inner = self.lock();
        let matches: Vec<&PullRequest> = inner
            .open_prs
            .iter()
            .filter(|pr| pr.title == title && !inner.merged.contains(&pr.url))
            .collect();
        Ok(match matches.as_slice() {
            [single] => Some((*single).clone()),
            _ => None,
        })
    }

    async fn is_pr_merged(&self, _repo: &ForgeRepo, url: &str) -> Result<bool> {
        let mut inner = self.lock();
        if inner.merged.contains(url) {
            return Ok(true);
        }
        let polls = {
            let count = inner.polls.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        let merge_after = inner.merge_after_polls;
        match merge_after {
            Some(after) if polls > after => {
                inner.merged.insert(url.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create_pr(&self, _repo: &ForgeRepo, pr: &NewPullRequest) -> Result<PullRequest> {
        let mut inner = self.lock();
        inner.write("create_pr")?;
        let number = 2000 + inner.created_prs.len() as u64;
        inner.created_prs.push(pr.clone());
        let created = PullRequest {
            number,
            title: pr.title.clone(),
            url: pr_url(number),
        };
        inner.open_prs.push(created.clone());
        Ok(created)
    }

    async fn list_open_on_milestone(&self, _repo: &ForgeRepo, milestone: &str) -> Result<Vec<String>> {
        Ok(self
            .lock()
            .milestone_items
            .get(milestone)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_label(&self, _repo: &ForgeRepo, name: &str, _color: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.write("create_label")?;
        inner.labels.insert(name.to_string());
        Ok(())
    }

    async fn create_milestone(&self, _repo: &ForgeRepo, title: &str) -> Result<String> {
        let mut inner = self.lock();
        if !inner.milestones.contains_key(title) {
            inner.writes.push("create_milestone".to_string());
            inner.milestones.insert(title.to_string(), false);
        }
        let index = inner.milestones.keys().position(|t| t == title).unwrap_or(0) + 1;
        Ok(format!("https://github.com/{}/milestone/{}", REPO, index))
    }

    async fn close_milestone(&self, _repo: &ForgeRepo, title: &str) -> Result<String> {
        let mut inner = self.lock();
        inner.writes.push("close_milestone".to_string());
        let closed = inner
            .milestones
            .get_mut(title)
            .ok_or_else(|| ForgeError::MilestoneNotFound {
                title: title.to_string(),
            })?;
        *closed = true;
        Ok(format!("https://github.com/{}/milestone/{}", REPO, title))
    }

    async fn reassign_milestone(&self, _repo: &ForgeRepo, from: &str, to: &str) -> Result<usize> {
        let mut inner = self.lock();
        let moved = inner.milestone_items.remove(from).unwrap_or_default();
        let count = moved.len();
        if count > 0 {
            inner.writes.push("reassign_milestone".to_string());
            inner
                .milestone_items
                .entry(to.to_string())
                .or_default()
                .extend(moved);
        }
        Ok(count)
    }

    async fn find_release(&self, _repo: &ForgeRepo, tag: &str) -> Result<Option<String>> {
        Ok(self
            .lock()
            .releases
            .contains_key(tag)
            .then(|| release_url(tag)))
    }

    async fn create_release(&self, _repo: &ForgeRepo, release: &NewRelease) -> Result<String> {
        let mut inner = self.lock();
        inner.write("create_release")?;
        inner.releases.insert(release.tag.clone(), release.clone());
        Ok(release_url(&release.tag))
    }
}

pub fn release_url(tag: &str) -> String {
    format!("https://github.com/{}/releases/tag/{}", REPO, tag)
}

#[derive(Debug, Default)]
pub struct GitInner {
    pub dirty: bool,
    pub nothing_to_commit: bool,
    pub remote_branches: BTreeSet<String>,
    pub remote_tags: BTreeSet<String>,
    pub files_at: HashMap<String, String>,
    pub commits: usize,
    /// Every call, as `name arg`
    pub calls: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeGit {
    inner: Arc<Mutex<GitInner>>,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, GitInner> {
        self.inner.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn called(&self, name: &str) -> bool {
        self.lock()
            .calls
            .iter()
            .any(|call| call.split(' ').next() == Some(name))
    }

    fn record(&self, call: String) {
        self.lock().calls.push(call);
    }
}

impl GitOperations for FakeGit {
    async fn is_clean(&self, _ctx: &WorkingContext) -> Result<bool> {
        Ok(!self.lock().dirty)
    }

    async fn remote_url(&self, _ctx: &WorkingContext, _remote: &str) -> Result<String> {
        Ok(format!("git@github.com:{}.git", REPO))
    }

    async fn fetch(&self, _ctx: &WorkingContext, remote: &str) -> Result<()> {
        self.record(format!("fetch {}", remote));
        Ok(())
    }

    async fn checkout(&self, _ctx: &WorkingContext, branch: &str) -> Result<()> {
        self.record(format!("checkout {}", branch));
        Ok(())
    }

    async fn reset_hard(&self, _ctx: &WorkingContext, target: &str) -> Result<()> {
        self.record(format!("reset_hard {}", target));
        Ok(())
    }

    async fn create_branch(&self, _ctx: &WorkingContext, branch: &str) -> Result<()> {
        self.record(format!("create_branch {}", branch));
        Ok(())
    }

    async fn branch_exists_on_remote(
        &self,
        _ctx: &WorkingContext,
        _remote: &str,
        branch: &str,
    ) -> Result<bool> {
        Ok(self.lock().remote_branches.contains(branch))
    }

    async fn commit_all(&self, _ctx: &WorkingContext, message: &str) -> Result<CommitOutcome> {
        self.record(format!("commit_all {}", message));
        let mut inner = self.lock();
        if inner.nothing_to_commit {
            return Ok(CommitOutcome::NothingToCommit);
        }
        inner.commits += 1;
        Ok(CommitOutcome::Committed {
            sha: format!("{:040x}", inner.commits),
        })
    }

    async fn push_branch(&self, _ctx: &WorkingContext, _remote: &str, branch: &str) -> Result<()> {
        self.record(format!("push_branch {}", branch));
        let mut inner = self.lock();
        // Every commit is new, so an existing remote branch never fast-forwards
        if inner.remote_branches.contains(branch) {
            return Err(GitError::CommandFailed {
                command: format!("push {}", branch),
                stderr: "! [rejected] (non-fast-forward)".to_string(),
            }
            .into());
        }
        inner.remote_branches.insert(branch.to_string());
        Ok(())
    }

    async fn force_push_branch(
        &self,
        _ctx: &WorkingContext,
        _remote: &str,
        branch: &str,
    ) -> Result<()> {
        self.record(format!("force_push_branch {}", branch));
        self.lock().remote_branches.insert(branch.to_string());
        Ok(())
    }

    async fn tag_exists_on_remote(
        &self,
        _ctx: &WorkingContext,
        _remote: &str,
        tag: &str,
    ) -> Result<bool> {
        Ok(self.lock().remote_tags.contains(tag))
    }

    async fn tag_and_push(
        &self,
        _ctx: &WorkingContext,
        _remote: &str,
        tag: &str,
        target: &str,
        _message: &str,
    ) -> Result<()> {
        self.record(format!("tag_and_push {} {}", tag, target));
        self.lock().remote_tags.insert(tag.to_string());
        Ok(())
    }

    async fn read_file_at(&self, _ctx: &WorkingContext, revision: &str, path: &Path) -> Result<String> {
        let key = format!("{}:{}", revision, path.display());
        self.lock().files_at.get(&key).cloned().ok_or_else(|| {
            GitError::CommandFailed {
                command: format!("show {}", key),
                stderr: "path does not exist".to_string(),
            }
            .into()
        })
    }
}

/// Working copy with the files the actions edit
pub fn working_copy() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("VERSION"), "20.0.0-SNAPSHOT\n").unwrap();
    let workflows = dir.path().join(".github/workflows");
    std::fs::create_dir_all(&workflows).unwrap();
    std::fs::write(
        workflows.join("code_freeze.yml"),
        "jobs:\n  freeze:\n    steps:\n      - run: exit 0\n",
    )
    .unwrap();
    dir
}

pub fn config_for(dir: &TempDir) -> ReleaseConfig {
    let mut config = ReleaseConfig::new(
        ForgeRepo::parse(REPO).unwrap(),
        20,
        WorkingContext::new(dir.path()),
    );
    config.poll_interval = Duration::from_millis(5);
    config
}

pub fn release_state(version: &str, rc: u32) -> ReleaseState {
    ReleaseState::new(
        ReleaseVersion::parse(version, rc).unwrap(),
        NaiveDate::from_ymd_opt(2026, 11, 3).unwrap(),
        "",
    )
}
