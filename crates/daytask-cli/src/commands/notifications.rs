use chrono::Utc;
use daytask_core::models::Notification;

use crate::cli::NotificationCommands;
use crate::commands::common::{format_relative_time, resolve_record, short_id, CliWorkspace};
use crate::error::CliError;

pub async fn run_notifications(
    command: NotificationCommands,
    workspace: &CliWorkspace,
) -> Result<(), CliError> {
    let inbox = workspace.notifications();
    match command {
        NotificationCommands::List { unread, json } => {
            let notifications = inbox
                .list()
                .await?
                .into_iter()
                .filter(|notification| !unread || !notification.read)
                .collect::<Vec<_>>();

            if json {
                println!("{}", serde_json::to_string_pretty(&notifications)?);
            } else if notifications.is_empty() {
                println!("No notifications.");
            } else {
                for line in format_notification_lines(&notifications) {
                    println!("{line}");
                }
            }
            Ok(())
        }
        NotificationCommands::Read { all: true, .. } => {
            let marked = inbox.mark_all_as_read().await?;
            println!("Marked {marked} notification(s) as read");
            Ok(())
        }
        NotificationCommands::Read { id, all: false } => {
            let id = id.ok_or(CliError::EmptyId)?;
            let notifications = inbox.list().await?;
            let target = resolve_record(&notifications, &id)?.id.clone();
            inbox.mark_as_read(&target).await?;
            println!("{target}");
            Ok(())
        }
        NotificationCommands::Delete { id } => {
            let notifications = inbox.list().await?;
            let target = resolve_record(&notifications, &id)?.id.clone();
            inbox.delete(&target).await?;
            println!("{target}");
            Ok(())
        }
    }
}

pub fn format_notification_lines(notifications: &[Notification]) -> Vec<String> {
    let now = Utc::now();
    notifications
        .iter()
        .map(|notification| {
            let mark = if notification.read { " " } else { "*" };
            format!(
                "{:<13} {mark} {:<10}  {}: {}",
                short_id(&notification.id),
                format_relative_time(notification.created_at, now),
                notification.title,
                notification.message
            )
        })
        .collect()
}
