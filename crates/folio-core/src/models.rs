//! Data models for Folio
//!
//! Defines documents, their settings and metadata, and the lightweight
//! summaries used for document lists. Blocks live in [`crate::block`] and
//! table content in [`crate::table`].
//!
//! All records serialize with camelCase field names and RFC 3339 timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::block::{Block, BlockType};

/// Title given to new documents
pub const DEFAULT_TITLE: &str = "Untitled Document";

/// Errors raised when content does not satisfy the model's invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Block type mismatch: expected '{expected}' content, got '{actual}'")]
    TypeMismatch {
        expected: BlockType,
        actual: BlockType,
    },

    #[error("Invalid content for '{block_type}' block: {details}")]
    InvalidContent {
        block_type: BlockType,
        details: String,
    },

    #[error("Unknown block type: {0}")]
    UnknownBlockType(String),

    #[error("Heading level must be between 1 and 6, got {0}")]
    HeadingLevel(u8),

    #[error("Row level must be between 0 and 3, got {0}")]
    RowLevel(u8),

    #[error("Invalid id '{0}': ids must be non-empty and use only letters, digits, '-' and '_'")]
    InvalidId(String),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Row {row} has no cell for column {column}")]
    MissingCell { row: String, column: String },

    #[error("Row index {index} out of bounds (table has {len} rows)")]
    RowOutOfBounds { index: usize, len: usize },
}

/// Generate a unique id such as `doc-6f1c…`
pub fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// Ids end up in storage keys, so they are restricted to a safe alphabet
pub(crate) fn validate_id(id: &str) -> Result<(), ValidationError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidId(id.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Page margins in points (72pt = 1 inch)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 72.0,
            right: 72.0,
            bottom: 72.0,
            left: 72.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderFooter {
    pub show_header: bool,
    pub show_footer: bool,
    pub show_page_numbers: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_text: Option<String>,
}

/// Page layout and appearance of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSettings {
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub margins: Margins,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_footer: Option<HeaderFooter>,
    pub theme: Theme,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            margins: Margins::default(),
            header_footer: Some(HeaderFooter::default()),
            theme: Theme::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Starts at 1; no mutation increments it
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
}

/// A document: a title and an ordered sequence of blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier, immutable once created
    pub id: String,
    pub title: String,
    /// Blocks in document order; `blocks[i].position == i`
    pub blocks: Vec<Block>,
    pub settings: DocumentSettings,
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Create an empty document seeded with one empty paragraph
    pub fn new() -> Self {
        let now = Utc::now();
        let mut paragraph = Block::empty(BlockType::Paragraph);
        paragraph.created_at = now;
        paragraph.updated_at = now;

        Self {
            id: new_id("doc"),
            title: DEFAULT_TITLE.to_string(),
            blocks: vec![paragraph],
            settings: DocumentSettings::default(),
            metadata: DocumentMetadata {
                created_at: now,
                updated_at: now,
                version: 1,
                author: None,
                template: None,
                tags: None,
                word_count: Some(0),
            },
        }
    }

    /// Lightweight projection for document lists
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary::from(self)
    }

    /// Mark the document as modified now
    pub fn touch(&mut self) {
        self.metadata.updated_at = Utc::now();
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.id == id)
    }

    pub fn block_mut(&mut self, id: &str) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|block| block.id == id)
    }

    pub fn block_index(&self, id: &str) -> Option<usize> {
        self.blocks.iter().position(|block| block.id == id)
    }

    /// Reassign every block's position to its index
    pub fn renumber_blocks(&mut self) {
        for (index, block) in self.blocks.iter_mut().enumerate() {
            block.position = index;
        }
    }

    /// Whether every block's position equals its index
    pub fn positions_are_contiguous(&self) -> bool {
        self.blocks
            .iter()
            .enumerate()
            .all(|(index, block)| block.position == index)
    }

    pub fn word_count(&self) -> usize {
        self.blocks
            .iter()
            .map(|block| block.content.word_count())
            .sum()
    }

    /// Shallow-merge a partial update; the id never changes
    pub fn apply(&mut self, patch: DocumentPatch) -> Result<(), ValidationError> {
        if let Some(ref blocks) = patch.blocks {
            validate_blocks(blocks)?;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(blocks) = patch.blocks {
            self.blocks = blocks;
            self.renumber_blocks();
        }
        if let Some(settings) = patch.settings {
            self.settings = settings;
        }
        self.touch();
        Ok(())
    }

    /// Check ids and block content
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id(&self.id)?;
        validate_blocks(&self.blocks)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_blocks(blocks: &[Block]) -> Result<(), ValidationError> {
    let mut seen = std::collections::HashSet::new();
    for block in blocks {
        block.validate()?;
        if !seen.insert(block.id.as_str()) {
            return Err(ValidationError::DuplicateId(block.id.clone()));
        }
    }
    Ok(())
}

/// A partial document update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub blocks: Option<Vec<Block>>,
    pub settings: Option<DocumentSettings>,
}

impl DocumentPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

/// Lightweight version of a document for list views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub block_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
}

impl From<&Document> for DocumentSummary {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id.clone(),
            title: document.title.clone(),
            created_at: document.metadata.created_at,
            updated_at: document.metadata.updated_at,
            block_count: document.blocks.len(),
            word_count: document.metadata.word_count,
        }
    }
}
