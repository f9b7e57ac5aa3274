use chrono::Utc;
use daytask_core::models::{NoteDraft, NotePatch};

use crate::cli::NoteCommands;
use crate::commands::common::{
    capture_editor_input_with_initial, format_note_lines, normalize_content, note_to_list_item,
    resolve_note_content, resolve_record, CliWorkspace, NoteListItem,
};
use crate::error::CliError;

pub async fn run_note(command: NoteCommands, workspace: &CliWorkspace) -> Result<(), CliError> {
    match command {
        NoteCommands::Add { content } => run_add(&content, workspace).await,
        NoteCommands::List { limit, json } => run_list(limit, json, workspace).await,
        NoteCommands::Edit { id, content } => run_edit(&id, &content, workspace).await,
        NoteCommands::Delete { id } => run_delete(&id, workspace).await,
    }
}

pub async fn run_add(content_parts: &[String], workspace: &CliWorkspace) -> Result<(), CliError> {
    let content = resolve_note_content(content_parts)?;

    let note = workspace
        .notes()
        .create(
            NoteDraft::new(content),
            workspace.mode(),
            workspace.owner_id().as_ref(),
        )
        .await?;
    workspace.refresh_pending().await?;

    println!("{}", note.id);
    Ok(())
}

pub async fn run_list(limit: usize, as_json: bool, workspace: &CliWorkspace) -> Result<(), CliError> {
    let now = Utc::now();
    let mut notes = workspace.notes().records().await;
    notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    notes.truncate(limit);

    if as_json {
        let items = notes
            .iter()
            .map(|note| note_to_list_item(note, now))
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if notes.is_empty() {
        println!("No notes found.");
        return Ok(());
    }

    for line in format_note_lines(&notes, now) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_edit(
    id: &str,
    content_parts: &[String],
    workspace: &CliWorkspace,
) -> Result<(), CliError> {
    let records = workspace.notes().records().await;
    let note = resolve_record(&records, id)?;

    let content = match normalize_content(&content_parts.join(" ")) {
        Some(content) => content,
        None => capture_editor_input_with_initial(&note.content)?
            .ok_or(CliError::EmptyEditedContent)?,
    };
    if content == note.content {
        println!("{}", note.id);
        return Ok(());
    }

    let patch = NotePatch {
        content: Some(content),
    };
    let updated = workspace
        .notes()
        .modify(&note.id, workspace.mode(), |note| patch.apply(note))
        .await?;
    workspace.refresh_pending().await?;

    println!("{}", updated.id);
    Ok(())
}

pub async fn run_delete(id: &str, workspace: &CliWorkspace) -> Result<(), CliError> {
    let records = workspace.notes().records().await;
    let note_id = resolve_record(&records, id)?.id.clone();

    workspace.notes().delete(&note_id, workspace.mode()).await?;
    workspace.refresh_pending().await?;

    println!("{note_id}");
    Ok(())
}
