use chrono::Utc;
use daytask_core::models::{TaskDraft, TaskPatch};

use crate::cli::TaskCommands;
use crate::commands::common::{
    format_task_lines, normalize_content, parse_optional_when, parse_when, resolve_record,
    task_to_list_item, CliWorkspace, TaskListItem,
};
use crate::error::CliError;

pub async fn run_task(command: TaskCommands, workspace: &CliWorkspace) -> Result<(), CliError> {
    match command {
        TaskCommands::Add {
            title,
            description,
            due,
            priority,
            labels,
            recurrence,
            reminder,
        } => {
            let draft = TaskDraft {
                title: normalize_content(&title.join(" ")).ok_or(CliError::EmptyContent)?,
                description,
                due_date: parse_optional_when(due.as_deref())?,
                priority: priority.map(Into::into),
                labels,
                recurrence: recurrence.map(Into::into),
                reminder: parse_optional_when(reminder.as_deref())?,
                snoozed_until: None,
            };
            run_add(draft, workspace).await
        }
        TaskCommands::List { all, label, json } => {
            run_list(all, label.as_deref(), json, workspace).await
        }
        TaskCommands::Edit {
            id,
            title,
            description,
            due,
            clear_due,
            priority,
            labels,
            clear_labels,
            reminder,
            clear_reminder,
        } => {
            let patch = TaskPatch {
                title,
                description,
                due_date: clearable(parse_optional_when(due.as_deref())?, clear_due),
                priority: priority.map(Into::into),
                labels: if clear_labels {
                    Some(Vec::new())
                } else {
                    (!labels.is_empty()).then_some(labels)
                },
                reminder: clearable(parse_optional_when(reminder.as_deref())?, clear_reminder),
                ..TaskPatch::default()
            };
            run_edit(&id, patch, workspace).await
        }
        TaskCommands::Done { id, undo } => {
            let patch = TaskPatch {
                completed: Some(!undo),
                ..TaskPatch::default()
            };
            run_edit(&id, patch, workspace).await
        }
        TaskCommands::Snooze { id, until } => {
            let patch = TaskPatch {
                snoozed_until: Some(Some(parse_when(&until)?)),
                ..TaskPatch::default()
            };
            run_edit(&id, patch, workspace).await
        }
        TaskCommands::Delete { id } => run_delete(&id, workspace).await,
    }
}

/// `Some(None)` clears the field, `Some(Some(_))` sets it
pub fn clearable<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

pub async fn run_add(draft: TaskDraft, workspace: &CliWorkspace) -> Result<(), CliError> {
    let task = workspace
        .tasks()
        .create(draft, workspace.mode(), workspace.owner_id().as_ref())
        .await?;
    workspace.refresh_pending().await?;

    println!("{}", task.id);
    Ok(())
}

pub async fn run_list(
    all: bool,
    label: Option<&str>,
    as_json: bool,
    workspace: &CliWorkspace,
) -> Result<(), CliError> {
    let now = Utc::now();
    let mut tasks = workspace
        .tasks()
        .records()
        .await
        .into_iter()
        .filter(|task| all || (!task.completed && !task.is_snoozed(now)))
        .filter(|task| {
            label.map_or(true, |label| {
                task.labels
                    .iter()
                    .flatten()
                    .any(|candidate| candidate == label)
            })
        })
        .collect::<Vec<_>>();
    tasks.sort_by(|a, b| {
        a.completed
            .cmp(&b.completed)
            .then_with(|| a.due_date.is_none().cmp(&b.due_date.is_none()))
            .then_with(|| a.due_date.cmp(&b.due_date))
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });

    if as_json {
        let items = tasks
            .iter()
            .map(|task| task_to_list_item(task, now))
            .collect::<Vec<TaskListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    for line in format_task_lines(&tasks, now) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_edit(id: &str, patch: TaskPatch, workspace: &CliWorkspace) -> Result<(), CliError> {
    if patch.is_empty() {
        return Err(CliError::NothingToEdit);
    }

    let records = workspace.tasks().records().await;
    let task_id = resolve_record(&records, id)?.id.clone();
    let now = Utc::now();

    let task = workspace
        .tasks()
        .modify(&task_id, workspace.mode(), |task| patch.apply(task, now))
        .await?;
    workspace.refresh_pending().await?;

    println!("{}", task.id);
    Ok(())
}

pub async fn run_delete(id: &str, workspace: &CliWorkspace) -> Result<(), CliError> {
    let records = workspace.tasks().records().await;
    let task_id = resolve_record(&records, id)?.id.clone();

    workspace.tasks().delete(&task_id, workspace.mode()).await?;
    workspace.refresh_pending().await?;

    println!("{task_id}");
    Ok(())
}
