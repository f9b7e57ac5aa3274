use serde::Serialize;

use crate::commands::common::Context;
use crate::error::CliError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub mode: String,
    pub online: bool,
    pub activity: String,
    pub api_base_url: String,
    pub data_dir: String,
    pub user: Option<String>,
    pub pending_tasks: usize,
    pub pending_notes: usize,
    pub merge_due: bool,
    pub unread_notifications: usize,
    pub last_error: Option<String>,
}

pub async fn collect_status(context: &Context) -> Result<StatusReport, CliError> {
    let workspace = &context.workspace;
    let status = workspace.status();
    let user = workspace
        .identity()
        .session()
        .map(|session| format!("{} <{}>", session.user.username, session.user.email));

    Ok(StatusReport {
        mode: workspace.mode().to_string(),
        online: status.online,
        activity: status.activity.to_string(),
        api_base_url: context.config.api_base_url.clone(),
        data_dir: context.data_dir.display().to_string(),
        user,
        pending_tasks: status.pending_tasks,
        pending_notes: status.pending_notes,
        merge_due: workspace.merge_due(),
        unread_notifications: workspace.notifications().unread_count().await?,
        last_error: status.last_error,
    })
}

pub fn format_status_lines(report: &StatusReport) -> Vec<String> {
    let mut lines = vec![
        format!("Mode:        {}", report.mode),
        format!(
            "Server:      {} ({})",
            report.api_base_url,
            if report.online { "reachable" } else { "unreachable" }
        ),
        format!(
            "Account:     {}",
            report.user.as_deref().unwrap_or("guest")
        ),
        format!(
            "Queued:      {} task(s), {} note(s)",
            report.pending_tasks, report.pending_notes
        ),
        format!("Unread:      {}", report.unread_notifications),
        format!("Data:        {}", report.data_dir),
    ];
    if report.merge_due {
        lines.push("Merge:       due on next sync".to_string());
    }
    if let Some(error) = &report.last_error {
        lines.push(format!("Last error:  {error}"));
    }
    lines
}

pub async fn run_status(as_json: bool, context: &Context) -> Result<(), CliError> {
    let report = collect_status(context).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for line in format_status_lines(&report) {
        println!("{line}");
    }
    Ok(())
}
