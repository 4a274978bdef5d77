//! Content blocks
//!
//! A block is one discrete unit of a document: a paragraph, a heading, a
//! table and so on. The block's content is a tagged union keyed by the block
//! type, so a paragraph can never carry table content.
//!
//! ## Wire format
//!
//! Blocks are persisted with the type next to the content:
//!
//! ```json
//! {
//!   "id": "block-…",
//!   "type": "heading",
//!   "content": { "level": 2, "text": "Overview" },
//!   "position": 0,
//!   "createdAt": "2024-05-01T09:30:00Z",
//!   "updatedAt": "2024-05-01T09:30:00Z"
//! }
//! ```
//!
//! Deserialization reads `type` first and then parses `content` as that
//! variant. Content that does not match its type is rejected.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Node};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::models::{new_id, ValidationError};
use crate::table::TableContent;

/// The kind of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Heading,
    Paragraph,
    Table,
    List,
    Image,
    Divider,
    Code,
    Quote,
    Toc,
}

impl BlockType {
    /// Every block type, in toolbar order
    pub const ALL: [BlockType; 9] = [
        BlockType::Heading,
        BlockType::Paragraph,
        BlockType::Table,
        BlockType::List,
        BlockType::Image,
        BlockType::Divider,
        BlockType::Code,
        BlockType::Quote,
        BlockType::Toc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Heading => "heading",
            BlockType::Paragraph => "paragraph",
            BlockType::Table => "table",
            BlockType::List => "list",
            BlockType::Image => "image",
            BlockType::Divider => "divider",
            BlockType::Code => "code",
            BlockType::Quote => "quote",
            BlockType::Toc => "toc",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnknownBlockType(s.to_string()))
    }
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Padding around a block, in points
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
}

/// Vertical margin around a block, in points
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
}

/// Visual styling of a block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStyles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<Padding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margin>,
}

/// Heading content (levels 1 through 6)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeadingContent {
    pub level: u8,
    pub text: String,
}

impl HeadingContent {
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Paragraph content
///
/// `html` is the rich-text editor's markup; `text` is the same content with
/// tags stripped, used for word counts and previews.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParagraphContent {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl ParagraphContent {
    /// Plain-text paragraph
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: None,
        }
    }

    /// Empty paragraph as seeded into new documents
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            html: Some(String::new()),
        }
    }

    /// Build from the rich-text editor's `onChange(html)` output
    pub fn from_html(html: impl Into<String>) -> Self {
        let html = html.into();
        Self {
            text: html_text(&html),
            html: Some(html),
        }
    }
}

/// List flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    #[default]
    Bulleted,
    Numbered,
    Checklist,
}

/// One entry of a list block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListItem {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    /// Nesting level
    pub level: u32,
}

impl ListItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: new_id("item"),
            text: text.into(),
            checked: None,
            level: 0,
        }
    }
}

/// List content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListContent {
    #[serde(rename = "type")]
    pub list_type: ListType,
    pub items: Vec<ListItem>,
}

/// Image content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageContent {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Code content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeContent {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Quote content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuoteContent {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Block content, one variant per block type
///
/// Dividers and tables of contents carry no content and serialize as `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockContent {
    Heading(HeadingContent),
    Paragraph(ParagraphContent),
    Table(TableContent),
    List(ListContent),
    Image(ImageContent),
    Divider,
    Code(CodeContent),
    Quote(QuoteContent),
    Toc,
}

impl BlockContent {
    /// The block type this content belongs to
    pub fn block_type(&self) -> BlockType {
        match self {
            BlockContent::Heading(_) => BlockType::Heading,
            BlockContent::Paragraph(_) => BlockType::Paragraph,
            BlockContent::Table(_) => BlockType::Table,
            BlockContent::List(_) => BlockType::List,
            BlockContent::Image(_) => BlockType::Image,
            BlockContent::Divider => BlockType::Divider,
            BlockContent::Code(_) => BlockType::Code,
            BlockContent::Quote(_) => BlockType::Quote,
            BlockContent::Toc => BlockType::Toc,
        }
    }

    /// Default content for a freshly inserted block of the given type
    pub fn default_for(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Heading => BlockContent::Heading(HeadingContent::new(1, "")),
            BlockType::Paragraph => BlockContent::Paragraph(ParagraphContent::empty()),
            BlockType::Table => BlockContent::Table(TableContent::starter()),
            BlockType::List => BlockContent::List(ListContent::default()),
            BlockType::Image => BlockContent::Image(ImageContent::default()),
            BlockType::Divider => BlockContent::Divider,
            BlockType::Code => BlockContent::Code(CodeContent::default()),
            BlockType::Quote => BlockContent::Quote(QuoteContent::default()),
            BlockType::Toc => BlockContent::Toc,
        }
    }

    /// Parse raw JSON content as the variant for `block_type`
    pub fn from_value(block_type: BlockType, value: Value) -> Result<Self, ValidationError> {
        fn parse<T: serde::de::DeserializeOwned>(
            block_type: BlockType,
            value: Value,
        ) -> Result<T, ValidationError> {
            serde_json::from_value(value).map_err(|e| ValidationError::InvalidContent {
                block_type,
                details: e.to_string(),
            })
        }

        let content = match block_type {
            BlockType::Heading => BlockContent::Heading(parse(block_type, value)?),
            BlockType::Paragraph => BlockContent::Paragraph(parse(block_type, value)?),
            BlockType::Table => BlockContent::Table(parse(block_type, value)?),
            BlockType::List => BlockContent::List(parse(block_type, value)?),
            BlockType::Image => BlockContent::Image(parse(block_type, value)?),
            BlockType::Code => BlockContent::Code(parse(block_type, value)?),
            BlockType::Quote => BlockContent::Quote(parse(block_type, value)?),
            BlockType::Divider | BlockType::Toc => {
                if !value.is_null() {
                    return Err(ValidationError::InvalidContent {
                        block_type,
                        details: "expected null content".to_string(),
                    });
                }
                if block_type == BlockType::Divider {
                    BlockContent::Divider
                } else {
                    BlockContent::Toc
                }
            }
        };
        content.validate()?;
        Ok(content)
    }

    /// Check value ranges the type system does not capture
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            BlockContent::Heading(heading) if !(1..=6).contains(&heading.level) => {
                Err(ValidationError::HeadingLevel(heading.level))
            }
            BlockContent::Table(table) => table.validate(),
            _ => Ok(()),
        }
    }

    /// The plain text carried by the content, if it is textual
    pub fn plain_text(&self) -> Option<String> {
        match self {
            BlockContent::Heading(c) => Some(c.text.clone()),
            BlockContent::Paragraph(c) => Some(c.text.clone()),
            BlockContent::Quote(c) => Some(c.text.clone()),
            BlockContent::Code(c) => Some(c.code.clone()),
            BlockContent::List(c) => Some(
                c.items
                    .iter()
                    .map(|item| item.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            BlockContent::Image(c) => c.caption.clone(),
            BlockContent::Table(_) | BlockContent::Divider | BlockContent::Toc => None,
        }
    }

    /// Words counted towards the document word count
    pub fn word_count(&self) -> usize {
        match self {
            BlockContent::Heading(c) => count_words(&c.text),
            BlockContent::Paragraph(c) => count_words(&c.text),
            BlockContent::Quote(c) => count_words(&c.text),
            BlockContent::List(c) => c.items.iter().map(|item| count_words(&item.text)).sum(),
            BlockContent::Image(c) => c.caption.as_deref().map(count_words).unwrap_or(0),
            BlockContent::Code(_)
            | BlockContent::Table(_)
            | BlockContent::Divider
            | BlockContent::Toc => 0,
        }
    }
}

impl Serialize for BlockContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BlockContent::Heading(c) => c.serialize(serializer),
            BlockContent::Paragraph(c) => c.serialize(serializer),
            BlockContent::Table(c) => c.serialize(serializer),
            BlockContent::List(c) => c.serialize(serializer),
            BlockContent::Image(c) => c.serialize(serializer),
            BlockContent::Code(c) => c.serialize(serializer),
            BlockContent::Quote(c) => c.serialize(serializer),
            BlockContent::Divider | BlockContent::Toc => serializer.serialize_none(),
        }
    }
}

/// A single content block in a document
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawBlock")]
pub struct Block {
    /// Unique identifier
    pub id: String,
    /// Typed content; the block type is derived from it
    pub content: BlockContent,
    /// Order in the document (0-based, matches the index in `Document::blocks`)
    pub position: usize,
    /// Optional visual styling
    pub styles: Option<BlockStyles>,
    /// When this block was created
    pub created_at: DateTime<Utc>,
    /// When this block was last updated
    pub updated_at: DateTime<Utc>,
}

impl Block {
    /// Create a block for the given content
    ///
    /// The position is 0; the document assigns the real position on insert.
    pub fn new(content: BlockContent) -> Result<Self, ValidationError> {
        content.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: new_id("block"),
            content,
            position: 0,
            styles: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Create a block of an explicit type, rejecting content of another type
    pub fn create(block_type: BlockType, content: BlockContent) -> Result<Self, ValidationError> {
        if content.block_type() != block_type {
            return Err(ValidationError::TypeMismatch {
                expected: block_type,
                actual: content.block_type(),
            });
        }
        Self::new(content)
    }

    /// Create a block of the given type with default content
    pub fn empty(block_type: BlockType) -> Self {
        let now = Utc::now();
        Self {
            id: new_id("block"),
            content: BlockContent::default_for(block_type),
            position: 0,
            styles: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a plain-text paragraph block
    pub fn paragraph(text: impl Into<String>) -> Self {
        let mut block = Self::empty(BlockType::Paragraph);
        block.content = BlockContent::Paragraph(ParagraphContent::new(text));
        block
    }

    pub fn block_type(&self) -> BlockType {
        self.content.block_type()
    }

    /// Replace the content, possibly changing the block type
    pub fn set_content(&mut self, content: BlockContent) -> Result<(), ValidationError> {
        content.validate()?;
        self.content = content;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Replace the styles
    pub fn set_styles(&mut self, styles: Option<BlockStyles>) {
        self.styles = styles;
        self.updated_at = Utc::now();
    }

    /// Merge a partial update into this block
    ///
    /// The block is left untouched when the new content is invalid.
    pub fn apply(&mut self, patch: BlockPatch) -> Result<(), ValidationError> {
        if let Some(ref content) = patch.content {
            content.validate()?;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(styles) = patch.styles {
            self.styles = styles;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        crate::models::validate_id(&self.id)?;
        self.content.validate()
    }
}

/// A partial block update
///
/// `id` and `position` are not patchable: ids are immutable and positions
/// belong to the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockPatch {
    pub content: Option<BlockContent>,
    /// `Some(None)` clears the styles
    pub styles: Option<Option<BlockStyles>>,
}

impl BlockPatch {
    pub fn content(content: BlockContent) -> Self {
        Self {
            content: Some(content),
            styles: None,
        }
    }

    pub fn styles(styles: Option<BlockStyles>) -> Self {
        Self {
            content: None,
            styles: Some(styles),
        }
    }
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.styles.is_some() { 7 } else { 6 };
        let mut state = serializer.serialize_struct("Block", len)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", &self.block_type())?;
        state.serialize_field("content", &self.content)?;
        state.serialize_field("position", &self.position)?;
        if let Some(ref styles) = self.styles {
            state.serialize_field("styles", styles)?;
        }
        state.serialize_field("createdAt", &self.created_at)?;
        state.serialize_field("updatedAt", &self.updated_at)?;
        state.end()
    }
}

/// Block as it appears on the wire, before the content is checked against the type
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlock {
    id: String,
    #[serde(rename = "type")]
    block_type: BlockType,
    #[serde(default)]
    content: Value,
    position: usize,
    #[serde(default)]
    styles: Option<BlockStyles>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RawBlock> for Block {
    type Error = ValidationError;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        Ok(Self {
            content: BlockContent::from_value(raw.block_type, raw.content)?,
            id: raw.id,
            position: raw.position,
            styles: raw.styles,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Elements whose content starts on a new line
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p", "pre",
    "section", "table", "td", "th", "tr", "ul",
];

/// Plain text of an HTML fragment
///
/// Entities are decoded and block elements are separated by line breaks.
fn html_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut raw = String::with_capacity(html.len());
    collect_text(fragment.root_element(), &mut raw);

    raw.replace('\u{a0}', " ")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let breaks = BLOCK_ELEMENTS.contains(&child.value().name());
                if breaks {
                    out.push('\n');
                }
                collect_text(child, out);
                if breaks {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_block(block_type: &str, content: Value) -> Value {
        json!({
            "id": "block-1",
            "type": block_type,
            "content": content,
            "position": 0,
            "createdAt": "2024-05-01T09:30:00Z",
            "updatedAt": "2024-05-01T09:30:00Z"
        })
    }

    #[test]
    fn test_block_type_from_str() {
        assert_eq!("table".parse::<BlockType>().unwrap(), BlockType::Table);
        assert_eq!("TOC".parse::<BlockType>().unwrap(), BlockType::Toc);
        assert!(matches!(
            "spreadsheet".parse::<BlockType>(),
            Err(ValidationError::UnknownBlockType(_))
        ));
    }

    #[test]
    fn test_create_rejects_type_mismatch() {
        let content = BlockContent::Paragraph(ParagraphContent::new("hello"));
        let err = Block::create(BlockType::Table, content).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TypeMismatch {
                expected: BlockType::Table,
                actual: BlockType::Paragraph
            }
        ));
    }

    #[test]
    fn test_create_block_defaults() {
        let block = Block::create(
            BlockType::Heading,
            BlockContent::Heading(HeadingContent::new(2, "Intro")),
        )
        .unwrap();
        assert!(block.id.starts_with("block-"));
        assert_eq!(block.position, 0);
        assert_eq!(block.created_at, block.updated_at);
        assert_eq!(block.block_type(), BlockType::Heading);
    }

    #[test]
    fn test_heading_level_is_checked() {
        let err = Block::new(BlockContent::Heading(HeadingContent::new(7, "Too deep"))).unwrap_err();
        assert_eq!(err, ValidationError::HeadingLevel(7));
    }

    #[test]
    fn test_deserialize_matching_content() {
        let block: Block =
            serde_json::from_value(raw_block("heading", json!({"level": 2, "text": "Plan"})))
                .unwrap();
        assert_eq!(
            block.content,
            BlockContent::Heading(HeadingContent::new(2, "Plan"))
        );
        assert_eq!(block.created_at.to_rfc3339(), "2024-05-01T09:30:00+00:00");
    }

    #[test]
    fn test_deserialize_rejects_mismatched_content() {
        // Table content under a paragraph type
        let value = raw_block("paragraph", json!({"columns": [], "rows": []}));
        let err = serde_json::from_value::<Block>(value).unwrap_err();
        assert!(err.to_string().contains("paragraph"));

        // Paragraph content (with html) under a quote type
        let value = raw_block("quote", json!({"text": "hi", "html": "<p>hi</p>"}));
        assert!(serde_json::from_value::<Block>(value).is_err());
    }

    #[test]
    fn test_divider_has_null_content() {
        let block: Block = serde_json::from_value(raw_block("divider", Value::Null)).unwrap();
        assert_eq!(block.content, BlockContent::Divider);

        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "divider");
        assert!(json["content"].is_null());

        let err = serde_json::from_value::<Block>(raw_block("toc", json!({"text": "x"})));
        assert!(err.is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let mut block = Block::paragraph("Hello world");
        block.position = 3;
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "paragraph");
        assert_eq!(json["content"]["text"], "Hello world");
        assert_eq!(json["position"], 3);
        assert!(json.get("styles").is_none());
        assert!(json["createdAt"].is_string());

        let parsed: Block = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, block);
    }

    #[test]
    fn test_from_html_strips_tags() {
        let content = ParagraphContent::from_html("<p>Hello <strong>bold</strong> world</p>");
        assert_eq!(content.text, "Hello bold world");
        assert_eq!(
            content.html.as_deref(),
            Some("<p>Hello <strong>bold</strong> world</p>")
        );
    }

    #[test]
    fn test_from_html_decodes_entities_and_separates_blocks() {
        let content = ParagraphContent::from_html("<p>Fish &amp; chips&nbsp;today</p><p>Next</p>");
        assert_eq!(content.text, "Fish & chips today\nNext");
        assert_eq!(BlockContent::Paragraph(content).word_count(), 5);

        let content = ParagraphContent::from_html("<ul><li>one</li><li>two</li></ul>last<br>line");
        assert_eq!(content.text, "one\ntwo\nlast\nline");
        assert_eq!(BlockContent::Paragraph(content).word_count(), 4);
    }

    #[test]
    fn test_from_html_keeps_stray_angle_brackets() {
        let content = ParagraphContent::from_html("<p>1 < 2 and 3 > 2</p>");
        assert_eq!(content.text, "1 < 2 and 3 > 2");

        let content = ParagraphContent::from_html("plain text");
        assert_eq!(content.text, "plain text");
    }

    #[test]
    fn test_apply_patch_keeps_block_on_invalid_content() {
        let mut block = Block::paragraph("original");
        let before = block.clone();

        let err = block
            .apply(BlockPatch::content(BlockContent::Heading(HeadingContent::new(
                0, "bad",
            ))))
            .unwrap_err();
        assert_eq!(err, ValidationError::HeadingLevel(0));
        assert_eq!(block, before);
    }

    #[test]
    fn test_apply_patch_changes_type_and_bumps_timestamp() {
        let mut block = Block::paragraph("text");
        let original_updated = block.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(10));

        block
            .apply(BlockPatch::content(BlockContent::Quote(QuoteContent {
                text: "text".to_string(),
                author: Some("Ada".to_string()),
            })))
            .unwrap();

        assert_eq!(block.block_type(), BlockType::Quote);
        assert!(block.updated_at > original_updated);
    }

    #[test]
    fn test_word_count() {
        let list = BlockContent::List(ListContent {
            list_type: ListType::Checklist,
            items: vec![ListItem::new("buy milk"), ListItem::new("call home now")],
        });
        assert_eq!(list.word_count(), 5);
        assert_eq!(BlockContent::Divider.word_count(), 0);
        assert_eq!(
            BlockContent::Paragraph(ParagraphContent::new("  one  two\nthree ")).word_count(),
            3
        );
    }

    #[test]
    fn test_default_content_matches_type() {
        for block_type in BlockType::ALL {
            let block = Block::empty(block_type);
            assert_eq!(block.block_type(), block_type);
            assert!(block.validate().is_ok());
        }
    }

    #[test]
    fn test_styles_roundtrip() {
        let mut block = Block::paragraph("styled");
        block.set_styles(Some(BlockStyles {
            text_align: Some(TextAlign::Center),
            font_size: Some(14.0),
            padding: Some(Padding {
                top: Some(4.0),
                ..Default::default()
            }),
            ..Default::default()
        }));

        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["styles"]["textAlign"], "center");
        assert_eq!(json["styles"]["padding"]["top"], 4.0);

        let parsed: Block = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.styles, block.styles);
    }
}
