use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use daytask_core::auth::FileSessionStore;
use daytask_core::db::{Database, SettingsRepository};
use daytask_core::models::{
    Entity, Note, NoteDraft, Priority, Settings, Task, TaskDraft, TaskPatch, ThemeMode,
};
use daytask_core::remote::HttpRemoteService;
use daytask_core::store::SyncReport;
use daytask_core::workspace::SyncSummary;
use daytask_core::{ActorMode, EntityId, Workspace};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use crate::cli::SettingKey;
use crate::commands::common::{
    default_editor, format_note_lines, format_relative_time, format_task_lines,
    normalize_content, normalize_identifier, note_preview, parse_when, resolve_record,
    CliWorkspace,
};
use crate::commands::settings::apply_setting;
use crate::commands::status::{format_status_lines, StatusReport};
use crate::commands::sync::format_sync_summary;
use crate::commands::task::{clearable, run_delete, run_edit};
use crate::error::CliError;

fn at(raw: &str) -> DateTime<Utc> {
    raw.parse().unwrap()
}

fn task(id: &str, title: &str) -> Task {
    Task::from_draft(
        TaskDraft::new(title),
        id.parse().unwrap(),
        None,
        at("2025-01-01T00:00:00Z"),
    )
    .unwrap()
}

fn note(id: &str, content: &str) -> Note {
    Note::from_draft(
        NoteDraft::new(content),
        id.parse().unwrap(),
        None,
        at("2025-01-01T00:00:00Z"),
    )
    .unwrap()
}

/// Guest workspace over an in-memory database; nothing reaches the network
async fn offline_workspace() -> (CliWorkspace, TempDir) {
    let dir = TempDir::new().unwrap();
    let remote = Arc::new(
        HttpRemoteService::new("http://127.0.0.1:9/api", Duration::from_secs(1)).unwrap(),
    );
    let db = Database::open_in_memory().unwrap().into_shared();
    let sessions = FileSessionStore::in_dir(dir.path());
    let workspace = Workspace::open(db, remote, sessions, false, None)
        .await
        .unwrap();
    (workspace, dir)
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn normalize_content_keeps_multiline_text() {
    assert_eq!(
        normalize_content("line 1\nline 2\n"),
        Some("line 1\nline 2".to_string())
    );
}

#[test]
fn default_editor_is_defined() {
    assert!(!default_editor().is_empty());
}

#[test]
fn normalize_identifier_rejects_blank() {
    assert!(matches!(normalize_identifier("   "), Err(CliError::EmptyId)));
    assert_eq!(normalize_identifier(" abc ").unwrap(), "abc");
}

#[test]
fn format_relative_time_units() {
    let now = at("2025-03-01T12:00:00Z");
    assert_eq!(format_relative_time(at("2025-03-01T11:59:30Z"), now), "just now");
    assert_eq!(format_relative_time(at("2025-03-01T11:58:00Z"), now), "2m ago");
    assert_eq!(format_relative_time(at("2025-03-01T10:00:00Z"), now), "2h ago");
    assert_eq!(format_relative_time(at("2025-02-27T12:00:00Z"), now), "2d ago");
}

#[test]
fn format_relative_time_clamps_future_timestamps() {
    let now = at("2025-03-01T12:00:00Z");
    assert_eq!(format_relative_time(at("2025-03-02T12:00:00Z"), now), "just now");
}

#[test]
fn parse_when_accepts_supported_formats() {
    assert_eq!(parse_when("2025-04-02").unwrap(), at("2025-04-02T00:00:00Z"));
    assert_eq!(
        parse_when("2025-04-02 09:30").unwrap(),
        at("2025-04-02T09:30:00Z")
    );
    assert_eq!(
        parse_when("2025-04-02T09:30:00+02:00").unwrap(),
        at("2025-04-02T07:30:00Z")
    );
}

#[test]
fn parse_when_rejects_garbage() {
    assert!(matches!(
        parse_when("next tuesday"),
        Err(CliError::InvalidDate(raw)) if raw == "next tuesday"
    ));
}

#[test]
fn resolve_record_prefers_exact_id() {
    let tasks = vec![task("abc", "exact"), task("abcdef", "longer")];
    assert_eq!(resolve_record(&tasks, "abc").unwrap().title, "exact");
}

#[test]
fn resolve_record_accepts_unique_prefix() {
    let tasks = vec![task("0192aaaa", "first"), task("0192bbbb", "second")];
    assert_eq!(resolve_record(&tasks, "0192b").unwrap().title, "second");
}

#[test]
fn resolve_record_reports_ambiguous_prefix() {
    let notes = vec![note("0192aaaa", "one"), note("0192aabb", "two")];
    let error = resolve_record(&notes, "0192aa").unwrap_err();
    assert!(matches!(error, CliError::AmbiguousId(message) if message.contains("0192aa")));
}

#[test]
fn resolve_record_reports_missing_id() {
    let notes = vec![note("0192aaaa", "one")];
    assert!(matches!(
        resolve_record(&notes, "ffff"),
        Err(CliError::NotFound(query)) if query == "ffff"
    ));
}

#[test]
fn note_preview_truncates_first_line() {
    let long = note("n1", &format!("{}\nsecond line", "word ".repeat(20)));
    let preview = note_preview(&long, 20);
    assert_eq!(preview.chars().count(), 20);
    assert!(preview.ends_with("..."));
    assert!(!preview.contains("second"));
}

#[test]
fn format_note_lines_shows_short_id() {
    let lines = format_note_lines(
        &[note("0192aaaa-bbbb-cccc", "Groceries\nmilk")],
        at("2025-01-01T00:00:30Z"),
    );
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("0192aaaa-bbbb"));
    assert!(lines[0].contains("Groceries"));
    assert!(lines[0].ends_with("just now"));
}

#[test]
fn format_task_lines_marks_completed_and_snoozed() {
    let now = at("2025-01-02T00:00:00Z");
    let mut done = task("t1", "Ship release");
    done.set_completed(true, now);
    let mut later = task("t2", "Call bank");
    later.snoozed_until = Some(at("2025-01-05T00:00:00Z"));
    later.labels = Some(vec!["home".to_string()]);

    let lines = format_task_lines(&[done, later], now);

    assert!(lines[0].contains("[x] Ship release"));
    assert!(lines[1].contains("[ ] Call bank"));
    assert!(lines[1].contains("#home"));
    assert!(lines[1].ends_with("(snoozed)"));
}

#[test]
fn clearable_distinguishes_clear_from_unset() {
    assert_eq!(clearable(Some(1), false), Some(Some(1)));
    assert_eq!(clearable::<i32>(None, false), None);
    assert_eq!(clearable(Some(1), true), Some(None));
}

#[test]
fn apply_setting_parses_values() {
    let mut settings = Settings::default();
    apply_setting(&mut settings, SettingKey::Theme, "Dark").unwrap();
    apply_setting(&mut settings, SettingKey::ShowConfetti, "off").unwrap();
    apply_setting(&mut settings, SettingKey::TelegramChatId, " 42 ").unwrap();
    apply_setting(&mut settings, SettingKey::TelegramToken, "  ").unwrap();

    assert_eq!(settings.theme, ThemeMode::Dark);
    assert!(!settings.show_confetti);
    assert_eq!(settings.telegram_chat_id.as_deref(), Some("42"));
    assert!(settings.telegram_token.is_none());
}

#[test]
fn apply_setting_rejects_invalid_flag() {
    let mut settings = Settings::default();
    let error = apply_setting(&mut settings, SettingKey::OfflineMode, "maybe").unwrap_err();
    assert!(matches!(
        error,
        CliError::InvalidSetting { key, .. } if key == "offline-mode"
    ));
    assert_eq!(settings, Settings::default());
}

#[test]
fn format_sync_summary_mentions_counts() {
    let idle = SyncSummary::default();
    assert_eq!(format_sync_summary(&idle), "Sync completed; nothing queued");

    let busy = SyncSummary {
        tasks: SyncReport { replayed: 2 },
        notes: SyncReport { replayed: 1 },
    };
    assert_eq!(
        format_sync_summary(&busy),
        "Sync completed: 2 task change(s), 1 note change(s) replayed"
    );
}

#[test]
fn format_status_lines_flags_due_merge_and_errors() {
    let report = StatusReport {
        mode: ActorMode::OfflineUser.to_string(),
        online: false,
        activity: "idle".to_string(),
        api_base_url: "http://localhost:5000/api".to_string(),
        data_dir: "/tmp/daytask".to_string(),
        user: Some("ana <ana@example.com>".to_string()),
        pending_tasks: 2,
        pending_notes: 0,
        merge_due: true,
        unread_notifications: 1,
        last_error: Some("Sync stopped at entry 1 of 2".to_string()),
    };

    let lines = format_status_lines(&report);

    assert_eq!(lines[0], "Mode:        offline-user");
    assert!(lines[1].ends_with("(unreachable)"));
    assert!(lines.contains(&"Merge:       due on next sync".to_string()));
    assert!(lines
        .last()
        .unwrap()
        .ends_with("Sync stopped at entry 1 of 2"));
}

#[tokio::test(flavor = "multi_thread")]
async fn guest_edit_and_delete_resolve_prefixes() {
    let (workspace, _dir) = offline_workspace().await;
    assert_eq!(workspace.mode(), ActorMode::Guest);
    let created = workspace
        .tasks()
        .create(TaskDraft::new("Water plants"), workspace.mode(), None)
        .await
        .unwrap();
    let prefix = created.id.as_str()[..10].to_string();

    let patch = TaskPatch {
        priority: Some(Priority::High),
        completed: Some(true),
        ..TaskPatch::default()
    };
    run_edit(&prefix, patch, &workspace).await.unwrap();

    let edited = workspace.tasks().get(&created.id).await.unwrap();
    assert_eq!(edited.priority, Priority::High);
    assert!(edited.completed);
    assert_eq!(workspace.tasks().pending_len().await.unwrap(), 0);

    run_delete(&prefix, &workspace).await.unwrap();
    assert!(workspace.tasks().records().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_patch_is_rejected_before_lookup() {
    let (workspace, _dir) = offline_workspace().await;
    let result = run_edit("missing", TaskPatch::default(), &workspace).await;
    assert!(matches!(result, Err(CliError::NothingToEdit)));
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_id_is_not_found() {
    let (workspace, _dir) = offline_workspace().await;
    let result = run_delete(EntityId::new().as_str(), &workspace).await;
    assert!(matches!(result, Err(CliError::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn settings_survive_through_workspace() {
    let (workspace, _dir) = offline_workspace().await;
    let mut settings = workspace.settings().load().await.unwrap();
    apply_setting(&mut settings, SettingKey::Theme, "light").unwrap();
    workspace.settings().save(&settings).await.unwrap();

    assert_eq!(
        workspace.settings().load().await.unwrap().theme,
        ThemeMode::Light
    );
}
