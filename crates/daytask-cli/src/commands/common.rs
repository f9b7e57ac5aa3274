use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use daytask_core::auth::FileSessionStore;
use daytask_core::config::ClientConfig;
use daytask_core::db::Database;
use daytask_core::models::{Note, Record, Task};
use daytask_core::remote::HttpRemoteService;
use daytask_core::scheduler::NotificationScheduler;
use daytask_core::{EntityId, Workspace};
use serde::Serialize;

use crate::cli::GlobalArgs;
use crate::error::CliError;

pub type CliWorkspace = Workspace<HttpRemoteService, FileSessionStore>;

/// Everything a command needs after startup
pub struct Context {
    pub config: ClientConfig,
    pub data_dir: PathBuf,
    pub remote: Arc<HttpRemoteService>,
    pub workspace: CliWorkspace,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListItem {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub priority: String,
    pub due_date: Option<String>,
    pub labels: Vec<String>,
    pub snoozed: bool,
    pub relative_time: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteListItem {
    pub id: String,
    pub preview: String,
    pub content: String,
    pub updated_at: String,
    pub relative_time: String,
}

pub fn load_config(global: &GlobalArgs) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::load(dirs::config_dir().as_deref())?;
    config.apply_overrides(global.api_url.clone(), None)?;
    Ok(config)
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>, config: &ClientConfig) -> PathBuf {
    cli_db_path.unwrap_or_else(|| config.database_path(dirs::data_dir()))
}

/// Probe connectivity (unless `--offline`) and open the workspace.
///
/// Opening while online already runs a due merge and replays queued changes.
pub async fn open_context(
    global: &GlobalArgs,
    scheduler: Option<Arc<dyn NotificationScheduler>>,
) -> Result<Context, CliError> {
    let config = load_config(global)?;
    let data_dir = config.resolve_data_dir(dirs::data_dir());
    let db_path = resolve_db_path(global.db_path.clone(), &config);

    let remote = Arc::new(HttpRemoteService::new(
        &config.api_base_url,
        config.request_timeout(),
    )?);
    let is_online = !global.offline && remote.probe().await;
    if !is_online {
        tracing::info!("Working offline; changes are queued");
    }

    let db = Database::open(&db_path)?.into_shared();
    let sessions = FileSessionStore::in_dir(&data_dir);
    let workspace = Workspace::open(db, remote.clone(), sessions, is_online, scheduler).await?;

    Ok(Context {
        config,
        data_dir,
        remote,
        workspace,
    })
}

/// Resolve a full id or a unique id prefix against `records`
pub fn resolve_record<'a, T: Record>(records: &'a [T], query: &str) -> Result<&'a T, CliError> {
    let query = normalize_identifier(query)?;
    if let Some(exact) = records.iter().find(|record| record.id().as_str() == query) {
        return Ok(exact);
    }

    let matching = records
        .iter()
        .filter(|record| record.id().as_str().starts_with(&query))
        .collect::<Vec<&T>>();

    match matching.as_slice() {
        [] => Err(CliError::NotFound(query)),
        [single] => Ok(*single),
        many => {
            let options = many
                .iter()
                .take(3)
                .map(|record| short_id(record.id()))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: &EntityId) -> String {
    id.as_str().chars().take(13).collect()
}

pub fn format_task_lines(tasks: &[Task], now: DateTime<Utc>) -> Vec<String> {
    tasks
        .iter()
        .map(|task| {
            let mark = if task.completed { "x" } else { " " };
            let title = preview(&task.title, 40);
            let due = task
                .due_date
                .map(|due| format!("due {}", due.format("%Y-%m-%d")))
                .unwrap_or_default();
            let labels = render_labels(task);
            let line = format!(
                "{:<13}  [{mark}] {title:<40}  {:<6}  {due:<14}",
                short_id(&task.id),
                format!("{:?}", task.priority).to_lowercase(),
            );
            let line = if labels.is_empty() {
                line
            } else {
                format!("{line}  {labels}")
            };
            if task.is_snoozed(now) {
                format!("{}  (snoozed)", line.trim_end())
            } else {
                line.trim_end().to_string()
            }
        })
        .collect()
}

pub fn format_note_lines(notes: &[Note], now: DateTime<Utc>) -> Vec<String> {
    notes
        .iter()
        .map(|note| {
            let preview = note_preview(note, 40);
            let relative_time = format_relative_time(note.updated_at, now);
            format!("{:<13}  {preview:<40}  {relative_time}", short_id(&note.id))
        })
        .collect()
}

pub fn task_to_list_item(task: &Task, now: DateTime<Utc>) -> TaskListItem {
    TaskListItem {
        id: task.id.to_string(),
        title: task.title.clone(),
        completed: task.completed,
        priority: format!("{:?}", task.priority).to_lowercase(),
        due_date: task.due_date.map(|due| due.to_rfc3339()),
        labels: task.labels.clone().unwrap_or_default(),
        snoozed: task.is_snoozed(now),
        relative_time: format_relative_time(task.updated_at, now),
    }
}

pub fn note_to_list_item(note: &Note, now: DateTime<Utc>) -> NoteListItem {
    NoteListItem {
        id: note.id.to_string(),
        preview: note_preview(note, 80),
        content: note.content.clone(),
        updated_at: note.updated_at.to_rfc3339(),
        relative_time: format_relative_time(note.updated_at, now),
    }
}

pub fn note_preview(note: &Note, max_chars: usize) -> String {
    preview(note.content.lines().next().unwrap_or(""), max_chars)
}

fn preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

fn render_labels(task: &Task) -> String {
    task.labels
        .iter()
        .flatten()
        .map(|label| format!("#{label}"))
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now
        .signed_duration_since(timestamp)
        .num_milliseconds()
        .max(0);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Accept `YYYY-MM-DD` (midnight UTC), `YYYY-MM-DD HH:MM` (UTC) or RFC 3339
pub fn parse_when(raw: &str) -> Result<DateTime<Utc>, CliError> {
    let trimmed = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M") {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CliError::InvalidDate(trimmed.to_string()))
}

pub fn parse_optional_when(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, CliError> {
    raw.map(parse_when).transpose()
}

pub fn resolve_note_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    if let Some(content) = capture_editor_input_with_initial("")? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

/// Password from the flag, or the first line of piped stdin
pub fn resolve_password(password: Option<String>) -> Result<String, CliError> {
    if let Some(password) = password.filter(|password| !password.is_empty()) {
        return Ok(password);
    }

    read_piped_stdin()?
        .and_then(|input| input.lines().next().map(str::to_string))
        .ok_or(CliError::MissingPassword)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&note_content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(CliError::EditorFailed(format!(
            "`{editor}` exited with status {status}"
        ))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let status = Command::new(program).args(parts).arg(file_path).status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("daytask-note-{}-{now}.md", std::process::id()))
}
