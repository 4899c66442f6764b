//! Building the run configuration and the forge and git clients.

use crate::cli::Args;
use crate::config::{FileConfig, ForgeRepo, ReleaseConfig, WorkingContext};
use crate::error::{ConfigError, Result};
use crate::forge::GhForge;
use crate::git::{GitCli, GitOperations};
use anyhow::Context;

/// Everything a command needs to build an orchestrator
pub(super) struct Session {
    pub config: ReleaseConfig,
    pub forge: GhForge,
    pub git: GitCli,
}

/// Resolve the configuration for `major` from defaults, the config file and flags.
pub(super) async fn prepare(args: &Args, major: u64) -> Result<Session> {
    let repo_path = args
        .path
        .canonicalize()
        .with_context(|| format!("Cannot open working copy {}", args.path.display()))?;
    let working = WorkingContext::new(repo_path);

    let git = GitCli::new()?;
    let forge = GhForge::new()?;

    let file = FileConfig::discover(args.config.as_deref(), &working.repo_path)?;
    let remote = args
        .remote
        .clone()
        .or_else(|| file.remote.clone())
        .unwrap_or_else(|| "origin".to_string());
    let repo = resolve_repo(args.repo.as_deref(), file.repo.as_deref(), &git, &working, &remote)
        .await?;
    log::debug!("Forge repository {} via remote {}", repo, remote);

    let mut config = ReleaseConfig::new(repo, major, working);
    config.apply_file(file)?;
    config.remote = remote;
    if let Some(companion) = &args.companion_release {
        config.companion_release = companion.clone();
    }
    if args.issue.is_some() {
        config.issue = args.issue;
    }
    if let Some(policy) = args.latest {
        config.mark_latest = policy;
    }

    Ok(Session { config, forge, git })
}

/// Flag, then config file, then the URL of the git remote
async fn resolve_repo<G: GitOperations>(
    flag: Option<&str>,
    file: Option<&str>,
    git: &G,
    working: &WorkingContext,
    remote: &str,
) -> Result<ForgeRepo> {
    if let Some(value) = flag.or(file) {
        return ForgeRepo::parse(value);
    }

    let url = git.remote_url(working, remote).await.map_err(|e| {
        ConfigError::UnknownRepository {
            reason: format!("no --repo given and remote '{}' is unreadable: {}", remote, e),
        }
    })?;
    ForgeRepo::from_remote_url(&url).ok_or_else(|| {
        ConfigError::UnknownRepository {
            reason: format!("remote '{}' ({}) is not a GitHub repository", remote, url),
        }
        .into()
    })
}
