use daytask_core::workspace::{MergeSummary, SyncSummary};

use crate::commands::common::CliWorkspace;
use crate::error::CliError;

/// Run a due merge, then replay both pending logs
pub async fn run_sync(workspace: &CliWorkspace) -> Result<(), CliError> {
    if workspace.merge_due() {
        let merged = workspace.merge_all().await?;
        println!("{}", format_merge_summary(&merged));
    }

    let summary = workspace.sync_all().await?;
    println!("{}", format_sync_summary(&summary));
    Ok(())
}

pub fn format_sync_summary(summary: &SyncSummary) -> String {
    if summary.tasks.replayed == 0 && summary.notes.replayed == 0 {
        return "Sync completed; nothing queued".to_string();
    }
    format!(
        "Sync completed: {} task change(s), {} note change(s) replayed",
        summary.tasks.replayed, summary.notes.replayed
    )
}

pub fn format_merge_summary(summary: &MergeSummary) -> String {
    format!(
        "Merge completed: tasks {} adopted, {} kept local, {} taken from server; \
         notes {} adopted, {} kept local, {} taken from server",
        summary.tasks.adopted,
        summary.tasks.local_wins,
        summary.tasks.remote_wins + summary.tasks.remote_only,
        summary.notes.adopted,
        summary.notes.local_wins,
        summary.notes.remote_wins + summary.notes.remote_only,
    )
}
