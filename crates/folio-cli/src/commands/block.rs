//! Block command handlers

use anyhow::{bail, Context, Result};

use folio_core::block::{
    CodeContent, HeadingContent, ListContent, ListItem, ParagraphContent, QuoteContent,
};
use folio_core::{Block, BlockContent, BlockPatch, BlockType, DocumentStore, KeyValueStore};

use crate::commands::{current_document, open_document, resolve_block_id};
use crate::editor::edit_text;
use crate::output::{short_id, Output};

/// Content options shared by `block add` and `block update`
#[derive(Debug, Default)]
pub struct ContentArgs {
    pub text: Option<String>,
    pub level: Option<u8>,
    pub json: Option<String>,
}

/// Add a block to a document
pub fn add<S: KeyValueStore>(
    store: &mut DocumentStore<S>,
    doc_id: String,
    block_type: String,
    args: ContentArgs,
    at: Option<usize>,
    output: &Output,
) -> Result<()> {
    let block_type: BlockType = block_type.parse()?;
    let content = build_content(block_type, args)?;
    let block = Block::create(block_type, content)?;

    open_document(store, &doc_id)?;
    let block_id = block.id.clone();
    match at {
        Some(index) => store.insert_block(index, block)?,
        None => store.add_block(block)?,
    }
    let added = current_document(store)?
        .block(&block_id)
        .cloned()
        .context("Block missing after insert")?;
    store
        .close_current_document()
        .context("Failed to save document")?;

    if !output.is_json() {
        output.success(&format!("Added {} block: {}", block_type, block_id));
    }
    output.print_block(&added);
    Ok(())
}

/// Replace a block's content
///
/// `--text` keeps the block type and replaces its text. `--content` takes
/// the whole content as JSON and may change the type with `--type`.
/// `--edit` opens the current text in $EDITOR.
pub fn update<S: KeyValueStore>(
    store: &mut DocumentStore<S>,
    doc_id: String,
    block_id: String,
    block_type: Option<String>,
    args: ContentArgs,
    edit: bool,
    output: &Output,
) -> Result<()> {
    open_document(store, &doc_id)?;
    let doc = current_document(store)?;
    let block_id = resolve_block_id(doc, &block_id)?;
    let existing = doc
        .block(&block_id)
        .map(|block| block.content.clone())
        .context("Block disappeared while editing")?;

    let content = if edit {
        let initial = existing.plain_text().unwrap_or_default();
        match edit_text(&initial)? {
            Some(text) => with_text(&existing, text)?,
            None => {
                output.message("No changes.");
                return Ok(());
            }
        }
    } else if let Some(json) = args.json {
        let block_type = match block_type {
            Some(t) => t.parse()?,
            None => existing.block_type(),
        };
        let value = serde_json::from_str(&json).context("Invalid content JSON")?;
        BlockContent::from_value(block_type, value)?
    } else if let Some(text) = args.text {
        with_text(&existing, text)?
    } else {
        bail!("Nothing to update. Pass --text, --content or --edit.");
    };

    store.update_block(&block_id, BlockPatch::content(content))?;
    store
        .close_current_document()
        .context("Failed to save document")?;

    output.success(&format!("Updated block: {}", short_id(&block_id)));
    Ok(())
}

/// Remove a block from a document
pub fn remove<S: KeyValueStore>(
    store: &mut DocumentStore<S>,
    doc_id: String,
    block_id: String,
    output: &Output,
) -> Result<()> {
    open_document(store, &doc_id)?;
    let block_id = resolve_block_id(current_document(store)?, &block_id)?;

    store.delete_block(&block_id)?;
    store
        .close_current_document()
        .context("Failed to save document")?;

    output.success(&format!("Removed block: {}", short_id(&block_id)));
    Ok(())
}

/// Move the block at position `from` to position `to`
pub fn move_block<S: KeyValueStore>(
    store: &mut DocumentStore<S>,
    doc_id: String,
    from: usize,
    to: usize,
    output: &Output,
) -> Result<()> {
    open_document(store, &doc_id)?;
    store.reorder_blocks(from, to)?;
    store
        .close_current_document()
        .context("Failed to save document")?;

    output.success(&format!("Moved block {} to {}", from, to));
    Ok(())
}

/// Build content for a new block from command-line options
fn build_content(block_type: BlockType, args: ContentArgs) -> Result<BlockContent> {
    if let Some(json) = args.json {
        let value = serde_json::from_str(&json).context("Invalid content JSON")?;
        return Ok(BlockContent::from_value(block_type, value)?);
    }

    let content = match (block_type, args.text) {
        (BlockType::Heading, text) => BlockContent::Heading(HeadingContent::new(
            args.level.unwrap_or(1),
            text.unwrap_or_default(),
        )),
        (_, None) => BlockContent::default_for(block_type),
        (_, Some(text)) => with_text(&BlockContent::default_for(block_type), text)?,
    };
    content.validate()?;
    Ok(content)
}

/// Replace the text of textual content, keeping its type and other fields
fn with_text(content: &BlockContent, text: String) -> Result<BlockContent> {
    let content = match content {
        BlockContent::Heading(h) => BlockContent::Heading(HeadingContent::new(h.level, text)),
        BlockContent::Paragraph(_) => BlockContent::Paragraph(ParagraphContent::new(text)),
        BlockContent::Quote(q) => BlockContent::Quote(QuoteContent {
            text,
            author: q.author.clone(),
        }),
        BlockContent::Code(c) => BlockContent::Code(CodeContent {
            code: text,
            language: c.language.clone(),
        }),
        BlockContent::List(list) => {
            // One item per line; existing items keep their id and state
            let items = text
                .lines()
                .enumerate()
                .map(|(i, line)| match list.items.get(i) {
                    Some(existing) => ListItem {
                        text: line.to_string(),
                        ..existing.clone()
                    },
                    None => ListItem::new(line),
                })
                .collect();
            BlockContent::List(ListContent {
                list_type: list.list_type,
                items,
            })
        }
        BlockContent::Image(img) => {
            let mut img = img.clone();
            img.caption = Some(text);
            BlockContent::Image(img)
        }
        other => bail!(
            "{} blocks have no text; use --content to set their content",
            other.block_type()
        ),
    };
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use folio_core::{DocumentStorage, MemoryStore};

    fn store_with_document() -> (DocumentStore<MemoryStore>, String) {
        let mut store = DocumentStore::new(DocumentStorage::new(MemoryStore::new()));
        let doc = store.create_new_document().unwrap();
        store.close_current_document().unwrap();
        (store, doc.id)
    }

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    fn text(value: &str) -> ContentArgs {
        ContentArgs {
            text: Some(value.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_content() {
        let heading = build_content(
            BlockType::Heading,
            ContentArgs {
                text: Some("Intro".to_string()),
                level: Some(2),
                json: None,
            },
        )
        .unwrap();
        assert_eq!(heading, BlockContent::Heading(HeadingContent::new(2, "Intro")));

        let list = build_content(BlockType::List, text("one\ntwo")).unwrap();
        let BlockContent::List(list) = list else {
            panic!("expected list");
        };
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[1].text, "two");

        let divider = build_content(BlockType::Divider, ContentArgs::default()).unwrap();
        assert_eq!(divider, BlockContent::Divider);

        assert!(build_content(BlockType::Divider, text("x")).is_err());
        assert!(build_content(
            BlockType::Heading,
            ContentArgs {
                level: Some(9),
                ..Default::default()
            }
        )
        .is_err());
    }

    #[test]
    fn test_build_content_from_json() {
        let args = ContentArgs {
            json: Some(r#"{"code": "fn main() {}", "language": "rust"}"#.to_string()),
            ..Default::default()
        };
        let content = build_content(BlockType::Code, args).unwrap();
        assert_eq!(content.plain_text().unwrap(), "fn main() {}");

        let mismatched = ContentArgs {
            json: Some(r#"{"level": 1, "text": "x"}"#.to_string()),
            ..Default::default()
        };
        assert!(build_content(BlockType::Paragraph, mismatched).is_err());
    }

    #[test]
    fn test_with_text_keeps_list_items() {
        let mut list = ListContent::default();
        list.items.push(ListItem::new("old"));
        list.items[0].checked = Some(true);
        let id = list.items[0].id.clone();

        let updated = with_text(&BlockContent::List(list), "new\nextra".to_string()).unwrap();
        let BlockContent::List(updated) = updated else {
            panic!("expected list");
        };
        assert_eq!(updated.items[0].id, id);
        assert_eq!(updated.items[0].checked, Some(true));
        assert_eq!(updated.items[0].text, "new");
        assert_eq!(updated.items[1].text, "extra");
    }

    #[test]
    fn test_add_update_move_remove() {
        let (mut store, doc_id) = store_with_document();

        add(&mut store, doc_id.clone(), "quote".to_string(), text("Be brief"), None, &quiet())
            .unwrap();
        add(&mut store, doc_id.clone(), "heading".to_string(), text("Top"), Some(0), &quiet())
            .unwrap();

        let doc = store.storage().get_document(&doc_id).unwrap();
        assert_eq!(doc.blocks.len(), 3);
        assert_eq!(doc.blocks[0].block_type(), BlockType::Heading);
        assert_eq!(doc.blocks[2].block_type(), BlockType::Quote);

        let quote_id = doc.blocks[2].id.clone();
        update(
            &mut store,
            doc_id.clone(),
            quote_id.clone(),
            None,
            text("Be briefer"),
            false,
            &quiet(),
        )
        .unwrap();

        move_block(&mut store, doc_id.clone(), 2, 0, &quiet()).unwrap();
        let doc = store.storage().get_document(&doc_id).unwrap();
        assert_eq!(doc.blocks[0].id, quote_id);
        assert_eq!(doc.blocks[0].content.plain_text().unwrap(), "Be briefer");
        assert!(doc.positions_are_contiguous());

        remove(&mut store, doc_id.clone(), quote_id, &quiet()).unwrap();
        let doc = store.storage().get_document(&doc_id).unwrap();
        assert_eq!(doc.blocks.len(), 2);
        assert_eq!(doc.blocks[0].position, 0);
    }

    #[test]
    fn test_update_changes_type_with_json() {
        let (mut store, doc_id) = store_with_document();
        let block_id = store.storage().get_document(&doc_id).unwrap().blocks[0]
            .id
            .clone();

        update(
            &mut store,
            doc_id.clone(),
            block_id,
            Some("heading".to_string()),
            ContentArgs {
                json: Some(r#"{"level": 3, "text": "Now a heading"}"#.to_string()),
                ..Default::default()
            },
            false,
            &quiet(),
        )
        .unwrap();

        let doc = store.storage().get_document(&doc_id).unwrap();
        assert_eq!(doc.blocks[0].block_type(), BlockType::Heading);
    }

    #[test]
    fn test_errors_name_the_content_flag() {
        let (mut store, doc_id) = store_with_document();
        let block_id = store.storage().get_document(&doc_id).unwrap().blocks[0]
            .id
            .clone();

        let err = update(
            &mut store,
            doc_id,
            block_id,
            None,
            ContentArgs::default(),
            false,
            &quiet(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Nothing to update. Pass --text, --content or --edit."
        );

        let err = with_text(&BlockContent::Divider, "x".to_string()).unwrap_err();
        assert!(err.to_string().contains("use --content"));
    }

    #[test]
    fn test_unknown_block_type() {
        let (mut store, doc_id) = store_with_document();
        let err = add(
            &mut store,
            doc_id,
            "video".to_string(),
            ContentArgs::default(),
            None,
            &quiet(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Unknown block type"));
    }
}
