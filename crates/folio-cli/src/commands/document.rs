//! Document command handlers

use anyhow::{Context, Result};

use folio_core::{DocumentStore, KeyValueStore};

use crate::commands::{current_document, open_document, resolve_document_id};
use crate::editor::confirm;
use crate::output::{short_id, Output};

/// List all documents, newest first
pub fn list<S: KeyValueStore>(store: &mut DocumentStore<S>, output: &Output) -> Result<()> {
    store.load_documents()?;
    output.print_summaries(store.documents());
    Ok(())
}

/// Create a new document
pub fn create<S: KeyValueStore>(
    store: &mut DocumentStore<S>,
    title: Option<String>,
    output: &Output,
) -> Result<()> {
    store
        .create_new_document()
        .context("Failed to create document")?;

    if let Some(title) = title {
        store.update_document_title(title)?;
        store.save_current_document()?;
    }

    let doc = current_document(store)?;
    if !output.is_json() {
        output.success(&format!("Created document: {}", doc.id));
    }
    output.print_document(doc);
    Ok(())
}

/// Show a document and its blocks
pub fn show<S: KeyValueStore>(store: &mut DocumentStore<S>, id: String, output: &Output) -> Result<()> {
    open_document(store, &id)?;
    output.print_document(current_document(store)?);
    Ok(())
}

/// Rename a document
pub fn rename<S: KeyValueStore>(
    store: &mut DocumentStore<S>,
    id: String,
    title: String,
    output: &Output,
) -> Result<()> {
    let id = open_document(store, &id)?;
    store.update_document_title(title.clone())?;
    store
        .close_current_document()
        .context("Failed to save document")?;

    output.success(&format!("Renamed {} to \"{}\"", short_id(&id), title));
    Ok(())
}

/// Delete a document
pub fn delete<S: KeyValueStore>(store: &mut DocumentStore<S>, id: String, output: &Output) -> Result<()> {
    store.load_documents()?;
    let id = resolve_document_id(store, &id)?;

    if output.should_prompt() {
        if let Some(summary) = store.get_document_by_id(&id) {
            println!("Delete document: {} - {}", short_id(&id), summary.title);
        }
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store
        .delete_document(&id)
        .context("Failed to delete document")?;

    output.success(&format!("Deleted document: {}", id));
    Ok(())
}
