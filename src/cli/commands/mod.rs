//! Command execution.
//!
//! Each command resolves the configuration, loads (or creates) the release
//! issue through the orchestrator and reports the result. Errors are printed
//! here with their recovery suggestions and turned into the exit code.

mod run;
mod setup;
mod status;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;
use crate::forge::GhForge;
use crate::git::GitCli;
use crate::steps::StepId;
use crate::version::ReleaseVersion;
use crate::workflow::{Orchestrator, StepOutcome};
use run::run_step;
use setup::prepare;
use status::{print_document, print_status};

/// Exit code of a step that was cancelled by the operator
const EXIT_CANCELLED: i32 = 130;

/// Execute the main command based on parsed arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    if let Err(validation_error) = args.validate() {
        // Create output for validation errors (never quiet)
        let output = super::OutputManager::new(false, false);
        output.error(&format!("Invalid arguments: {}", validation_error));
        return Ok(2);
    }

    let config = RuntimeConfig::from(&args);

    match dispatch(&args, &config).await {
        Ok(exit_code) => Ok(exit_code),
        Err(e) => {
            config.error_println(&format!(
                "Command '{}' failed: {}",
                args.command.name(),
                e
            ));

            if e.is_fatal() || config.is_verbose() {
                let suggestions = e.recovery_suggestions();
                if !suggestions.is_empty() {
                    config.println("\n💡 Recovery suggestions:");
                    for suggestion in suggestions {
                        config.println(&format!("  • {}", suggestion));
                    }
                }
            }

            Ok(1)
        }
    }
}

async fn dispatch(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    match &args.command {
        Command::CreateIssue { version, rc, date } => {
            let release = ReleaseVersion::parse(version, *rc)?;
            let session = prepare(args, release.major()).await?;
            config.verbose_println(&format!(
                "Creating the release issue for {} in {}",
                release, session.config.repo
            ));
            let orchestrator = Orchestrator::create_issue(
                session.config,
                session.forge,
                session.git,
                version,
                *rc,
                *date,
            )
            .await?;
            config.success_println(&format!(
                "Release issue #{} is ready: {}",
                orchestrator.issue_number(),
                orchestrator.issue_url()
            ));
            print_status(&orchestrator, config);
            Ok(0)
        }
        Command::Status => {
            let orchestrator = load(args).await?;
            print_status(&orchestrator, config);
            Ok(0)
        }
        Command::Show => {
            let orchestrator = load(args).await?;
            print_document(&orchestrator, config);
            Ok(0)
        }
        Command::Run { step } => {
            let step: StepId = step.parse()?;
            let orchestrator = load(args).await?;
            orchestrator.verify_working_copy().await?;
            execute_and_report(orchestrator, step, config).await
        }
        Command::Next => {
            let orchestrator = load(args).await?;
            let Some(step) = orchestrator.cursor() else {
                config.success_println("Every step is done; nothing to run");
                return Ok(0);
            };
            orchestrator.verify_working_copy().await?;
            execute_and_report(orchestrator, step, config).await
        }
    }
}

async fn load(args: &Args) -> Result<Orchestrator<GhForge, GitCli>> {
    let session = prepare(args, args.major.unwrap_or_default()).await?;
    Orchestrator::load(session.config, session.forge, session.git).await
}

async fn execute_and_report(
    orchestrator: Orchestrator<GhForge, GitCli>,
    step: StepId,
    config: &RuntimeConfig,
) -> Result<i32> {
    let (orchestrator, outcome) = run_step(orchestrator, step, config).await?;
    match orchestrator.cursor() {
        Some(next) => config.info_println(&format!("Next step: {} ({})", next.label(), next.id())),
        None => config.success_println("Every step is done"),
    }
    Ok(match outcome {
        StepOutcome::Cancelled => EXIT_CANCELLED,
        _ => 0,
    })
}
