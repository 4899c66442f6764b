//! [`GitOperations`] over the `git` executable.

use super::{CommitOutcome, GitOperations};
use crate::config::WorkingContext;
use crate::error::{ConfigError, GitError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Git client that runs `git -C <working copy>`.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl GitCli {
    /// Locate `git` on the PATH.
    pub fn new() -> Result<Self> {
        let program = which::which("git").map_err(|_| ConfigError::ToolNotFound {
            tool: "git".to_string(),
        })?;
        Ok(Self { program })
    }

    async fn git(&self, ctx: &WorkingContext, args: &[&str]) -> Result<String> {
        log::debug!("git -C {} {}", ctx.repo_path.display(), args.join(" "));
        let output = Command::new(&self.program)
            .arg("-C")
            .arg(&ctx.repo_path)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.contains("not a git repository") {
                return Err(GitError::NotRepository {
                    path: ctx.repo_path.clone(),
                }
                .into());
            }
            return Err(GitError::CommandFailed {
                command: args.join(" "),
                stderr,
            }
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// `git show` wants forward slashes on every platform
fn revision_path(revision: &str, path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    format!("{}:{}", revision, path)
}

impl GitOperations for GitCli {
    async fn is_clean(&self, ctx: &WorkingContext) -> Result<bool> {
        let status = self.git(ctx, &["status", "--porcelain"]).await?;
        Ok(status.trim().is_empty())
    }

    async fn remote_url(&self, ctx: &WorkingContext, remote: &str) -> Result<String> {
        let url = self.git(ctx, &["remote", "get-url", remote]).await?;
        Ok(url.trim().to_string())
    }

    async fn fetch(&self, ctx: &WorkingContext, remote: &str) -> Result<()> {
        self.git(ctx, &["fetch", "--tags", remote]).await?;
        Ok(())
    }

    async fn checkout(&self, ctx: &WorkingContext, branch: &str) -> Result<()> {
        self.git(ctx, &["checkout", branch]).await?;
        Ok(())
    }

    async fn reset_hard(&self, ctx: &WorkingContext, target: &str) -> Result<()> {
        self.git(ctx, &["reset", "--hard", target]).await?;
        Ok(())
    }

    async fn create_branch(&self, ctx: &WorkingContext, branch: &str) -> Result<()> {
        // -B so a branch left behind by an interrupted run is reset rather than rejected
        self.git(ctx, &["checkout", "-B", branch]).await?;
        Ok(())
    }

    async fn branch_exists_on_remote(
        &self,
        ctx: &WorkingContext,
        remote: &str,
        branch: &str,
    ) -> Result<bool> {
        let refname = format!("refs/heads/{}", branch);
        let listed = self.git(ctx, &["ls-remote", "--heads", remote, &refname]).await?;
        Ok(!listed.trim().is_empty())
    }

    async fn commit_all(&self, ctx: &WorkingContext, message: &str) -> Result<CommitOutcome> {
        self.git(ctx, &["add", "-A"]).await?;
        let staged = self.git(ctx, &["status", "--porcelain"]).await?;
        if staged.trim().is_empty() {
            return Ok(CommitOutcome::NothingToCommit);
        }
        self.git(ctx, &["commit", "-m", message]).await?;
        let sha = self.git(ctx, &["rev-parse", "HEAD"]).await?;
        Ok(CommitOutcome::Committed {
            sha: sha.trim().to_string(),
        })
    }

    async fn push_branch(&self, ctx: &WorkingContext, remote: &str, branch: &str) -> Result<()> {
        self.git(ctx, &["push", "--set-upstream", remote, branch]).await?;
        Ok(())
    }

    async fn force_push_branch(
        &self,
        ctx: &WorkingContext,
        remote: &str,
        branch: &str,
    ) -> Result<()> {
        self.git(
            ctx,
            &["push", "--force-with-lease", "--set-upstream", remote, branch],
        )
        .await?;
        Ok(())
    }

    async fn tag_exists_on_remote(
        &self,
        ctx: &WorkingContext,
        remote: &str,
        tag: &str,
    ) -> Result<bool> {
        let refname = format!("refs/tags/{}", tag);
        let listed = self.git(ctx, &["ls-remote", "--tags", remote, &refname]).await?;
        Ok(!listed.trim().is_empty())
    }

    async fn tag_and_push(
        &self,
        ctx: &WorkingContext,
        remote: &str,
        tag: &str,
        target: &str,
        message: &str,
    ) -> Result<()> {
        self.git(ctx, &["tag", "-f", "-a", tag, target, "-m", message])
            .await?;
        let refname = format!("refs/tags/{}", tag);
        self.git(ctx, &["push", remote, &refname]).await?;
        Ok(())
    }

    async fn read_file_at(&self, ctx: &WorkingContext, revision: &str, path: &Path) -> Result<String> {
        self.git(ctx, &["show", &revision_path(revision, path)]).await
    }
}
