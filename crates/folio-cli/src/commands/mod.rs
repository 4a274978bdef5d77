//! Command handlers
//!
//! Document, block and column ids can be given in full or as any unique
//! prefix, as printed by `folio list` and `folio show`.

pub mod block;
pub mod config;
pub mod document;
pub mod status;
pub mod table;
pub mod transfer;
pub mod write;

use anyhow::{bail, Result};

use folio_core::{Document, DocumentStore, KeyValueStore};

/// Resolve a full id or unique prefix against a list of candidates
fn resolve_id<'a>(
    kind: &str,
    id: &str,
    candidates: impl Iterator<Item = (&'a str, &'a str)>,
) -> Result<String> {
    let mut matches = Vec::new();
    for (candidate, label) in candidates {
        if candidate == id {
            return Ok(candidate.to_string());
        }
        if candidate.starts_with(id) {
            matches.push((candidate, label));
        }
    }

    match matches.len() {
        0 => bail!("No {} found matching: {}", kind, id),
        1 => Ok(matches[0].0.to_string()),
        _ => {
            eprintln!("Multiple {}s match '{}':", kind, id);
            for (candidate, label) in &matches {
                eprintln!("  {} - {}", candidate, label);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

/// Resolve a document id against the loaded summary list
pub fn resolve_document_id<S: KeyValueStore>(store: &DocumentStore<S>, id: &str) -> Result<String> {
    resolve_id(
        "document",
        id,
        store
            .documents()
            .iter()
            .map(|summary| (summary.id.as_str(), summary.title.as_str())),
    )
}

/// Resolve a block id within a document
pub fn resolve_block_id(doc: &Document, id: &str) -> Result<String> {
    resolve_id(
        "block",
        id,
        doc.blocks
            .iter()
            .map(|block| (block.id.as_str(), block.block_type().as_str())),
    )
}

/// Load the summary list and open the document matching `id`
///
/// Returns the full document id.
pub fn open_document<S: KeyValueStore>(store: &mut DocumentStore<S>, id: &str) -> Result<String> {
    store.load_documents()?;
    let id = resolve_document_id(store, id)?;
    store.load_document(&id)?;
    Ok(id)
}

/// The open document; callers open one first
pub fn current_document<S: KeyValueStore>(store: &DocumentStore<S>) -> Result<&Document> {
    match store.current_document() {
        Some(doc) => Ok(doc),
        None => bail!("No document is open"),
    }
}
