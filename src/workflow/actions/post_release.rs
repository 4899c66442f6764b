//! Post-Release actions.

use crate::error::Result;
use crate::forge::ForgeOperations;
use crate::git::GitOperations;
use crate::workflow::StepOutcome;
use crate::workflow::context::StepContext;

/// Close the issue, then tick the last box and upload it.
pub(super) async fn close_issue<F: ForgeOperations, G: GitOperations>(
    ctx: &mut StepContext<'_, F, G>,
) -> Result<StepOutcome> {
    ctx.progress.start(2);
    ctx.forge
        .close_issue(&ctx.config.repo, ctx.issue.number)
        .await?;
    ctx.progress
        .report_step(format!("Closed issue #{}", ctx.issue.number));

    ctx.state.checklist.close_issue.done = true;
    ctx.persist().await?;
    ctx.progress.report_step("Checklist complete");
    Ok(StepOutcome::Done {
        url: Some(ctx.issue.url.clone()),
    })
}
