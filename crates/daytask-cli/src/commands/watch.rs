use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use daytask_core::models::{Entity, Notification};
use daytask_core::scheduler::{NotificationScheduler, TokioNotificationScheduler};
use tokio::signal;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::cli::GlobalArgs;
use crate::commands::common::{open_context, Context};
use crate::error::CliError;

/// Stay in the foreground: re-probe connectivity, reconcile on reconnect and
/// deliver task reminders to the notification inbox until Ctrl+C.
pub async fn run_watch(interval_secs: u64, global: &GlobalArgs) -> Result<(), CliError> {
    let (scheduler, reminders) = TokioNotificationScheduler::new();
    let scheduler: Arc<dyn NotificationScheduler> = Arc::new(scheduler);
    let context = open_context(global, Some(scheduler.clone())).await?;

    let scheduled = schedule_existing_reminders(&context, scheduler.as_ref()).await;
    println!(
        "Watching in {} mode; {scheduled} reminder(s) scheduled. Press Ctrl+C to stop.",
        context.workspace.mode()
    );

    tokio::select! {
        result = watch_loop(&context, interval_secs, global.offline, reminders) => result,
        _ = signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C; stopping watch");
            Ok(())
        }
    }
}

/// Hand every task whose reminder is still ahead to the scheduler
async fn schedule_existing_reminders(
    context: &Context,
    scheduler: &dyn NotificationScheduler,
) -> usize {
    let now = Utc::now();
    let mut scheduled = 0;
    for task in context.workspace.tasks().records().await {
        if task.completed {
            continue;
        }
        if let Some((at, notification)) = task.reminder() {
            if at > now {
                scheduler.schedule(at, notification);
                scheduled += 1;
            }
        }
    }
    scheduled
}

async fn watch_loop(
    context: &Context,
    interval_secs: u64,
    stay_offline: bool,
    mut reminders: UnboundedReceiver<Notification>,
) -> Result<(), CliError> {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    let workspace = &context.workspace;
    let mut modes = workspace.mode_resolver().subscribe();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let is_online = !stay_offline && context.remote.probe().await;
                workspace.set_online(is_online).await;
            }
            Ok(()) = modes.changed() => {
                let mode = *modes.borrow_and_update();
                println!("Now {mode}");
                if let Some(error) = workspace.status().last_error {
                    println!("Last error: {error}");
                }
            }
            Some(notification) = reminders.recv() => {
                workspace.notifications().add(&notification).await?;
                println!("Reminder: {}: {}", notification.title, notification.message);
            }
        }
    }
}
