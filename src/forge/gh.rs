//! [`ForgeOperations`] over the `gh` command line client.

use super::{ForgeOperations, Issue, NewPullRequest, NewRelease, PullRequest};
use crate::config::ForgeRepo;
use crate::error::{ConfigError, ForgeError, ReleaseError, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Longest argument echoed verbatim in error messages
const MAX_ARG_DISPLAY: usize = 60;

/// Forge client that shells out to `gh`.
///
/// Authentication is whatever `gh auth status` reports; prompts, colors and
/// update notices are disabled for every call.
#[derive(Debug, Clone)]
pub struct GhForge {
    program: PathBuf,
}

#[derive(Debug, Deserialize)]
struct IssueJson {
    number: u64,
    title: String,
    #[serde(default)]
    body: String,
    url: String,
}

impl From<IssueJson> for Issue {
    fn from(json: IssueJson) -> Self {
        Issue {
            number: json.number,
            title: json.title,
            body: json.body,
            url: json.url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PrJson {
    number: u64,
    title: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct UrlJson {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrStateJson {
    state: String,
    #[serde(default)]
    merged_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct MilestoneJson {
    number: u64,
    title: String,
    html_url: String,
    state: String,
}

impl GhForge {
    /// Locate `gh` on the PATH.
    pub fn new() -> Result<Self> {
        let program = which::which("gh").map_err(|_| ConfigError::ToolNotFound {
            tool: "gh".to_string(),
        })?;
        Ok(Self { program })
    }

    async fn run(&self, args: &[String], stdin: Option<&str>) -> Result<String> {
        let command = describe(args);
        log::debug!("Running {}", command);

        let mut child = Command::new(&self.program)
            .args(args)
            .env("GH_PROMPT_DISABLED", "1")
            .env("NO_COLOR", "1")
            .env("GH_NO_UPDATE_NOTIFIER", "1")
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(ForgeError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn run_json<T: DeserializeOwned>(&self, args: &[String]) -> Result<T> {
        let raw = self.run(args, None).await?;
        decode(&describe(args), &raw)
    }

    async fn milestone(&self, repo: &ForgeRepo, title: &str) -> Result<Option<MilestoneJson>> {
        let args = strings(&[
            "api",
            "--paginate",
            &format!("repos/{}/milestones?state=all&per_page=100", repo),
        ]);
        let raw = self.run(&args, None).await?;
        let milestones = decode_pages::<MilestoneJson>(&describe(&args), &raw)?;
        Ok(milestones.into_iter().find(|m| m.title == title))
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

fn describe(args: &[String]) -> String {
    let shown: Vec<&str> = args
        .iter()
        .map(|arg| {
            if arg.len() > MAX_ARG_DISPLAY {
                "<...>"
            } else {
                arg.as_str()
            }
        })
        .collect();
    format!("gh {}", shown.join(" "))
}

fn decode<T: DeserializeOwned>(command: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| {
        ForgeError::UnexpectedOutput {
            command: command.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// `gh api --paginate` prints one JSON array per page back to back.
fn decode_pages<T: DeserializeOwned>(command: &str, raw: &str) -> Result<Vec<T>> {
    let mut items = Vec::new();
    for page in serde_json::Deserializer::from_str(raw).into_iter::<Vec<T>>() {
        let page = page.map_err(|e| ForgeError::UnexpectedOutput {
            command: command.to_string(),
            reason: e.to_string(),
        })?;
        items.extend(page);
    }
    Ok(items)
}

/// Trailing number of an issue or pull request URL
fn number_from_url(url: &str) -> Option<u64> {
    url.trim().trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

/// Last non-empty output line, which is where `gh ... create` prints the URL
fn created_url(command: &str, stdout: &str) -> Result<String> {
    stdout
        .lines()
        .map(str::trim)
        .rfind(|line| line.starts_with("http"))
        .map(str::to_string)
        .ok_or_else(|| {
            ForgeError::UnexpectedOutput {
                command: command.to_string(),
                reason: "no URL in output".to_string(),
            }
            .into()
        })
}

fn select_release_issue(issues: Vec<IssueJson>, title_prefix: &str) -> Result<Option<Issue>> {
    let mut matches: Vec<Issue> = issues
        .into_iter()
        .filter(|issue| issue.title.starts_with(title_prefix))
        .map(Issue::from)
        .collect();
    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        count => Err(ForgeError::AmbiguousIssue {
            title: title_prefix.to_string(),
            count,
        }
        .into()),
    }
}

fn select_pr_by_title(prs: Vec<PrJson>, title: &str) -> Option<PullRequest> {
    let mut matches: Vec<PrJson> = prs.into_iter().filter(|pr| pr.title == title).collect();
    if matches.len() != 1 {
        if matches.len() > 1 {
            log::warn!("{} open pull requests titled '{}'", matches.len(), title);
        }
        return None;
    }
    matches.pop().map(|pr| PullRequest {
        number: pr.number,
        title: pr.title,
        url: pr.url,
    })
}

fn is_not_found(error: &ReleaseError, needle: &str) -> bool {
    matches!(
        error,
        ReleaseError::Forge(ForgeError::CommandFailed { stderr, .. }) if stderr.contains(needle)
    )
}

impl ForgeOperations for GhForge {
    async fn fetch_issue(&self, repo: &ForgeRepo, number: u64) -> Result<Issue> {
        let args = strings(&[
            "issue",
            "view",
            &number.to_string(),
            "--repo",
            &repo.to_string(),
            "--json",
            "number,title,body,url",
        ]);
        match self.run_json::<IssueJson>(&args).await {
            Ok(issue) => Ok(issue.into()),
            Err(e) if is_not_found(&e, "Could not resolve") => {
                Err(ForgeError::IssueNotFound { number }.into())
            }
            Err(e) => Err(e),
        }
    }

    async fn find_release_issue(
        &self,
        repo: &ForgeRepo,
        title_prefix: &str,
        label: &str,
    ) -> Result<Option<Issue>> {
        let args = strings(&[
            "issue",
            "list",
            "--repo",
            &repo.to_string(),
            "--state",
            "open",
            "--label",
            label,
            "--search",
            &format!("\"{}\" in:title", title_prefix),
            "--json",
            "number,title,body,url",
            "--limit",
            "100",
        ]);
        let issues: Vec<IssueJson> = self.run_json(&args).await?;
        select_release_issue(issues, title_prefix)
    }

    async fn create_issue(
        &self,
        repo: &ForgeRepo,
        title: &str,
        body: &str,
        labels: &[String],
        assignee: Option<&str>,
    ) -> Result<Issue> {
        let mut args = strings(&[
            "issue",
            "create",
            "--repo",
            &repo.to_string(),
            "--title",
            title,
            "--body-file",
            "-",
        ]);
        for label in labels {
            args.push("--label".to_string());
            args.push(label.clone());
        }
        if let Some(assignee) = assignee {
            args.push("--assignee".to_string());
            args.push(assignee.to_string());
        }

        let stdout = self.run(&args, Some(body)).await?;
        let url = created_url(&describe(&args), &stdout)?;
        let number = number_from_url(&url).ok_or_else(|| ForgeError::UnexpectedOutput {
            command: describe(&args),
            reason: format!("no issue number in {}", url),
        })?;
        Ok(Issue {
            number,
            title: title.to_string(),
            body: body.to_string(),
            url,
        })
    }

    async fn update_issue_body(&self, repo: &ForgeRepo, number: u64, body: &str) -> Result<()> {
        let args = strings(&[
            "issue",
            "edit",
            &number.to_string(),
            "--repo",
            &repo.to_string(),
            "--body-file",
            "-",
        ]);
        self.run(&args, Some(body)).await?;
        Ok(())
    }

    async fn close_issue(&self, repo: &ForgeRepo, number: u64) -> Result<()> {
        let args = strings(&[
            "issue",
            "close",
            &number.to_string(),
            "--repo",
            &repo.to_string(),
        ]);
        self.run(&args, None).await?;
        Ok(())
    }

    async fn find_open_pr_by_title(
        &self,
        repo: &ForgeRepo,
        title: &str,
    ) -> Result<Option<PullRequest>> {
        let args = strings(&[
            "pr",
            "list",
            "--repo",
            &repo.to_string(),
            "--state",
            "open",
            "--search",
            &format!("\"{}\" in:title", title),
            "--json",
            "number,title,url",
            "--limit",
            "100",
        ]);
        let prs: Vec<PrJson> = self.run_json(&args).await?;
        Ok(select_pr_by_title(prs, title))
    }

    async fn is_pr_merged(&self, _repo: &ForgeRepo, url: &str) -> Result<bool> {
        if !url.contains("/pull/") {
            return Err(ForgeError::InvalidPullRequestUrl {
                url: url.to_string(),
            }
            .into());
        }
        let args = strings(&["pr", "view", url, "--json", "state,mergedAt"]);
        let state: PrStateJson = self.run_json(&args).await?;
        Ok(state.state == "MERGED" || state.merged_at.is_some())
    }

    async fn create_pr(&self, repo: &ForgeRepo, pr: &NewPullRequest) -> Result<PullRequest> {
        let mut args = strings(&[
            "pr",
            "create",
            "--repo",
            &repo.to_string(),
            "--base",
            &pr.base,
            "--head",
            &pr.head,
            "--title",
            &pr.title,
            "--body-file",
            "-",
        ]);
        for label in &pr.labels {
            args.push("--label".to_string());
            args.push(label.clone());
        }

        let stdout = self.run(&args, Some(&pr.body)).await?;
        let url = created_url(&describe(&args), &stdout)?;
        let number = number_from_url(&url)
            .ok_or_else(|| ForgeError::InvalidPullRequestUrl { url: url.clone() })?;
        Ok(PullRequest {
            number,
            title: pr.title.clone(),
            url,
        })
    }

    async fn list_open_on_milestone(&self, repo: &ForgeRepo, milestone: &str) -> Result<Vec<String>> {
        let repo = repo.to_string();
        let search = format!("milestone:\"{}\"", milestone);
        let mut urls = Vec::new();
        for kind in ["issue", "pr"] {
            let args = strings(&[
                kind, "list", "--repo", &repo, "--state", "open", "--search", &search, "--json",
                "url", "--limit", "500",
            ]);
            let items: Vec<UrlJson> = self.run_json(&args).await?;
            urls.extend(items.into_iter().map(|item| item.url));
        }
        Ok(urls)
    }

    async fn create_label(&self, repo: &ForgeRepo, name: &str, color: &str) -> Result<()> {
        let args = strings(&[
            "label",
            "create",
            name,
            "--repo",
            &repo.to_string(),
            "--color",
            color,
            "--force",
        ]);
        self.run(&args, None).await?;
        Ok(())
    }

    async fn create_milestone(&self, repo: &ForgeRepo, title: &str) -> Result<String> {
        if let Some(existing) = self.milestone(repo, title).await? {
            log::info!("Milestone {} already exists", title);
            return Ok(existing.html_url);
        }
        let args = strings(&[
            "api",
            &format!("repos/{}/milestones", repo),
            "-f",
            &format!("title={}", title),
        ]);
        let created: MilestoneJson = self.run_json(&args).await?;
        Ok(created.html_url)
    }

    async fn close_milestone(&self, repo: &ForgeRepo, title: &str) -> Result<String> {
        let milestone = self
            .milestone(repo, title)
            .await?
            .ok_or_else(|| ForgeError::MilestoneNotFound {
                title: title.to_string(),
            })?;
        if milestone.state == "closed" {
            return Ok(milestone.html_url);
        }
        let args = strings(&[
            "api",
            "-X",
            "PATCH",
            &format!("repos/{}/milestones/{}", repo, milestone.number),
            "-f",
            "state=closed",
        ]);
        self.run(&args, None).await?;
        Ok(milestone.html_url)
    }

    async fn reassign_milestone(&self, repo: &ForgeRepo, from: &str, to: &str) -> Result<usize> {
        let open = self.list_open_on_milestone(repo, from).await?;
        for url in &open {
            let kind = if url.contains("/pull/") { "pr" } else { "issue" };
            let args = strings(&[kind, "edit", url, "--milestone", to]);
            self.run(&args, None).await?;
        }
        Ok(open.len())
    }

    async fn find_release(&self, repo: &ForgeRepo, tag: &str) -> Result<Option<String>> {
        let args = strings(&[
            "release",
            "view",
            tag,
            "--repo",
            &repo.to_string(),
            "--json",
            "url",
        ]);
        match self.run_json::<UrlJson>(&args).await {
            Ok(release) => Ok(Some(release.url)),
            Err(e) if is_not_found(&e, "not found") => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_release(&self, repo: &ForgeRepo, release: &NewRelease) -> Result<String> {
        let mut args = strings(&[
            "release",
            "create",
            &release.tag,
            "--repo",
            &repo.to_string(),
            "--title",
            &release.title,
            "--notes-file",
            &release.notes_path.to_string_lossy(),
            "--verify-tag",
            &format!("--latest={}", release.is_latest),
        ]);
        if release.is_prerelease {
            args.push("--prerelease".to_string());
        }
        let stdout = self.run(&args, None).await?;
        created_url(&describe(&args), &stdout)
    }
}
