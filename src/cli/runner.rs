//! Command dispatch for the CLI.

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::draft::DraftStore;
use crate::host::ContentConverter;
use crate::models::{DocumentItem, StudioItem, MEDIA_COLLECTION};
use crate::repository::FetchOptions;
use crate::state::StudioSession;

use super::args::{Command, ConfigAction};
use super::bootstrap::CliContext;
use super::output::{self, DraftSummary};

/// Run the command selected on the command line.
pub async fn run(ctx: &CliContext) -> Result<()> {
    let json = ctx.args.json;

    if ctx.args.command == Command::Init {
        let created = ctx.settings_manager.ensure_settings_file().await?;
        let path = ctx.settings_manager.path().display().to_string();
        if json {
            return output::print_json(&json!({ "path": path, "created": created }));
        }
        if created {
            println!("Wrote settings template to {}", path);
        } else {
            println!("Settings already exist at {}", path);
        }
        return Ok(());
    }

    if let Command::Config { action } = &ctx.args.command {
        return config(ctx, action, json).await;
    }

    let session = ctx.open_session().await?;
    let result = dispatch(ctx, &session, json).await;
    session.end();
    result
}

async fn dispatch(ctx: &CliContext, session: &StudioSession, json: bool) -> Result<()> {
    match &ctx.args.command {
        Command::Status => status(session, json),
        Command::Diff => diff(session, json).await,
        Command::Fetch { path } => fetch(session, path, json).await,
        Command::Commit { message } => {
            if ctx.args.verbose {
                eprintln!("[cli] Committing with message: {}", output::truncate(message, 60));
            }
            let result = session.commit(message).await?;
            output::print_commit(result.as_ref(), json)
        }
        Command::Revert { id, all } => {
            if *all {
                session.documents.revert_all().await?;
                session.medias.revert_all().await?;
            } else if let Some(id) = id {
                let reverted = if is_media_id(id) {
                    session.medias.revert(id).await
                } else {
                    session.documents.revert(id).await
                };
                reverted.with_context(|| format!("Failed to revert {}", id))?;
            }
            status(session, json)
        }
        Command::Init | Command::Config { .. } => Ok(()),
    }
}

fn status(session: &StudioSession, json: bool) -> Result<()> {
    let documents = summaries(&session.documents);
    let medias = summaries(&session.medias);
    let document_tree = session.document_tree.tree();
    let media_tree = session.media_tree.tree();

    if json {
        return output::print_json(&json!({
            "documents": { "drafts": documents, "tree": document_tree.as_slice() },
            "medias": { "drafts": medias, "tree": media_tree.as_slice() },
        }));
    }

    output::print_tree("Documents", &document_tree);
    output::print_drafts(&documents);
    println!();
    output::print_tree("Media", &media_tree);
    output::print_drafts(&medias);
    Ok(())
}

fn summaries<T: StudioItem>(store: &DraftStore<T>) -> Vec<DraftSummary> {
    store.pending().iter().map(DraftSummary::from).collect()
}

async fn diff(session: &StudioSession, json: bool) -> Result<()> {
    let converter = session.documents.converter();
    let mut diffs = Vec::new();

    for draft in session.documents.pending() {
        let before = render(converter.as_ref(), draft.original.as_ref()).await?;
        let after = render(converter.as_ref(), draft.modified.as_ref()).await?;
        let text = output::unified_diff(&draft.fs_path, &before, &after);
        if !text.is_empty() {
            diffs.push((draft, text));
        }
    }

    if json {
        let entries: Vec<_> = diffs
            .iter()
            .map(|(draft, text)| json!({ "id": draft.id, "status": draft.status, "diff": text }))
            .collect();
        return output::print_json(&entries);
    }

    if diffs.is_empty() {
        println!("No document changes.");
    }
    for (_, text) in &diffs {
        print!("{}", text);
    }
    Ok(())
}

async fn render(converter: &dyn ContentConverter, doc: Option<&DocumentItem>) -> Result<String> {
    match doc {
        Some(doc) => Ok(converter
            .content_from_document(doc)
            .await?
            .unwrap_or_default()),
        None => Ok(String::new()),
    }
}

async fn fetch(session: &StudioSession, path: &str, json: bool) -> Result<()> {
    let file = session
        .repository
        .fetch_file(path, FetchOptions::default())
        .await
        .with_context(|| format!("{} not found on the remote branch", path))?;
    let content = file.decoded_content();

    if json {
        return output::print_json(&json!({
            "path": file.path,
            "sha": file.sha,
            "size": file.size,
            "content": content,
        }));
    }

    match content {
        Some(content) => print!("{}", content),
        None => eprintln!("[cli] {} has no text content", path),
    }
    Ok(())
}

async fn config(ctx: &CliContext, action: &ConfigAction, json: bool) -> Result<()> {
    let manager = &ctx.settings_manager;
    match action {
        ConfigAction::Get { key } => {
            let value = manager.get_value(key).await?;
            if json {
                return output::print_json(&value);
            }
            match value {
                Value::String(s) => println!("{}", s),
                other => println!("{}", serde_json::to_string_pretty(&other)?),
            }
        }
        ConfigAction::Set { key, value } => {
            manager
                .set_value(key, parse_setting_value(value))
                .await
                .with_context(|| format!("Failed to set {}", key))?;
            if ctx.args.verbose {
                eprintln!("[cli] Saved {} to {}", key, manager.path().display());
            }
        }
    }
    Ok(())
}

fn parse_setting_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Media ids live in their own collection.
fn is_media_id(id: &str) -> bool {
    id.split('/').next() == Some(MEDIA_COLLECTION)
}
