//! Write session
//!
//! Appends blocks to a document from lines of input while autosave persists
//! the document in the background. The document is saved and closed at the
//! end of input.
//!
//! Line syntax:
//! - `# text` to `###### text`: heading of that level
//! - `> text`: quote
//! - `- text` / `[ ] text` / `[x] text`: list item, joined to a list block
//!   directly above it of the same kind
//! - `---`: divider
//! - anything else: paragraph (blank lines are skipped)

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::warn;

use folio_core::block::{
    HeadingContent, ListContent, ListItem, ListType, ParagraphContent, QuoteContent,
};
use folio_core::{
    Autosave, Block, BlockContent, BlockPatch, Config, DocumentStore, KeyValueStore,
};

use crate::commands::{current_document, open_document};
use crate::output::Output;

/// Run a write session on stdin
pub async fn run<S: KeyValueStore>(
    store: &mut DocumentStore<S>,
    config: &Config,
    doc_id: String,
    output: &Output,
) -> Result<()> {
    if !output.is_quiet() {
        eprintln!("Writing to document. End input with Ctrl-D.");
    }
    let input = BufReader::new(tokio::io::stdin());
    let added = session(store, config, &doc_id, input).await?;
    output.success(&format!("Added {} block(s)", added));
    Ok(())
}

/// Append blocks from `input` until it ends; returns the number of blocks
/// added
async fn session<S: KeyValueStore, R: AsyncBufRead + Unpin>(
    store: &mut DocumentStore<S>,
    config: &Config,
    doc_id: &str,
    input: R,
) -> Result<usize> {
    let id = open_document(store, doc_id)?;
    let (mut autosave, mut ticks) = Autosave::new(config.autosave_interval());
    autosave.track(Some(&id));

    let mut lines = input.lines();
    let mut added = 0;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                if append_line(store, &line)? {
                    added += 1;
                }
            }
            Some(tick) = ticks.recv() => {
                // Keep writing on a failed autosave; the final save reports it
                if let Err(e) = store.apply_autosave(&tick) {
                    warn!("Autosave failed: {}", e);
                }
            }
        }
    }

    autosave.stop();
    store
        .close_current_document()
        .context("Failed to save document")?;
    Ok(added)
}

/// Apply one input line to the open document
///
/// Returns whether a new block was added.
fn append_line<S: KeyValueStore>(store: &mut DocumentStore<S>, line: &str) -> Result<bool> {
    let Some(content) = parse_line(line) else {
        return Ok(false);
    };

    // List items extend a list of the same kind directly above
    if let BlockContent::List(ref incoming) = content {
        let doc = current_document(store)?;
        if let Some(last) = doc.blocks.last() {
            if let BlockContent::List(ref list) = last.content {
                if list.list_type == incoming.list_type {
                    let mut list = list.clone();
                    list.items.extend(incoming.items.iter().cloned());
                    let last_id = last.id.clone();
                    store.update_block(&last_id, BlockPatch::content(BlockContent::List(list)))?;
                    return Ok(false);
                }
            }
        }
    }

    store.add_block(Block::new(content)?)?;
    Ok(true)
}

/// Content for one line of input, or `None` for a blank line
fn parse_line(line: &str) -> Option<BlockContent> {
    let line = line.trim_end();
    if line.trim().is_empty() {
        return None;
    }

    if line == "---" {
        return Some(BlockContent::Divider);
    }

    let hashes = line.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) {
        if let Some(text) = line[hashes..].strip_prefix(' ') {
            return Some(BlockContent::Heading(HeadingContent::new(
                hashes as u8,
                text.trim(),
            )));
        }
    }

    if let Some(text) = line.strip_prefix("> ") {
        return Some(BlockContent::Quote(QuoteContent {
            text: text.to_string(),
            author: None,
        }));
    }

    let item = |list_type: ListType, text: &str, checked: Option<bool>| {
        let mut item = ListItem::new(text);
        item.checked = checked;
        Some(BlockContent::List(ListContent {
            list_type,
            items: vec![item],
        }))
    };
    if let Some(text) = line.strip_prefix("- ") {
        return item(ListType::Bulleted, text, None);
    }
    if let Some(text) = line.strip_prefix("[ ] ") {
        return item(ListType::Checklist, text, Some(false));
    }
    if let Some(text) = line
        .strip_prefix("[x] ")
        .or_else(|| line.strip_prefix("[X] "))
    {
        return item(ListType::Checklist, text, Some(true));
    }

    Some(BlockContent::Paragraph(ParagraphContent::new(line)))
}
