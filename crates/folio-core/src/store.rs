//! Document store
//!
//! The `DocumentStore` owns the in-memory editing state and mediates every
//! read and write through [`DocumentStorage`]:
//!
//! - the summary list shown in document lists
//! - the current (open) document, at most one
//! - loading / saving flags and the most recent error message
//!
//! Edits to the current document happen in memory only; they reach storage
//! on an explicit save or an autosave tick.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = DocumentStore::open()?;
//! store.load_documents()?;
//!
//! let doc = store.create_new_document()?;
//! store.add_block(Block::empty(BlockType::Table))?;
//! store.save_current_document()?;
//! ```

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::autosave::AutosaveTick;
use crate::block::{Block, BlockContent, BlockPatch};
use crate::config::Config;
use crate::models::{Document, DocumentPatch, DocumentSummary, ValidationError};
use crate::storage::{DocumentStorage, FileStore, KeyValueStore, StorageError};
use crate::table::TableContent;

/// Errors returned by store operations
///
/// The display text of the most recent error is also kept in
/// [`DocumentStore::error`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No document to save")]
    NothingToSave,

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Block not found: {0}")]
    BlockNotFound(String),

    #[error("Block {0} is not a table")]
    NotATable(String),

    #[error("Index {index} out of bounds (document has {len} blocks)")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Failed to load documents: {0}")]
    LoadDocuments(#[source] StorageError),

    #[error("Failed to load document: {0}")]
    LoadDocument(#[source] StorageError),

    #[error("Failed to create document: {0}")]
    Create(#[source] StorageError),

    #[error("Failed to save document: {0}")]
    Save(#[source] StorageError),

    #[error("Failed to delete document: {0}")]
    Delete(#[source] StorageError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Snapshot of the store's observable state
///
/// Published to subscribers after every state change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStatus {
    /// Incremented on every change
    pub revision: u64,
    pub is_loading: bool,
    pub is_saving: bool,
    pub error: Option<String>,
    pub current_document_id: Option<String>,
    pub document_count: usize,
}

/// In-memory editing state backed by document storage
pub struct DocumentStore<S> {
    storage: DocumentStorage<S>,
    /// Summaries, newest first after any load
    documents: Vec<DocumentSummary>,
    current: Option<Document>,
    is_loading: bool,
    is_saving: bool,
    error: Option<String>,
    revision: u64,
    status: watch::Sender<StoreStatus>,
}

impl DocumentStore<FileStore> {
    /// Open the file-backed store using the default configuration
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Ok(Self::open_with_config(&config))
    }

    /// Open the file-backed store described by `config`
    pub fn open_with_config(config: &Config) -> Self {
        let backend = FileStore::new(config.documents_dir());
        Self::new(DocumentStorage::with_quota(
            backend,
            config.storage_quota_bytes,
        ))
    }
}

impl<S: KeyValueStore> DocumentStore<S> {
    pub fn new(storage: DocumentStorage<S>) -> Self {
        let (status, _) = watch::channel(StoreStatus::default());
        Self {
            storage,
            documents: Vec::new(),
            current: None,
            is_loading: false,
            is_saving: false,
            error: None,
            revision: 0,
            status,
        }
    }

    // ==================== State ====================

    pub fn storage(&self) -> &DocumentStorage<S> {
        &self.storage
    }

    /// Summaries, newest first
    pub fn documents(&self) -> &[DocumentSummary] {
        &self.documents
    }

    pub fn current_document(&self) -> Option<&Document> {
        self.current.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    /// Most recent error message, if not yet cleared
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn get_document_by_id(&self, id: &str) -> Option<&DocumentSummary> {
        self.documents.iter().find(|summary| summary.id == id)
    }

    pub fn status(&self) -> StoreStatus {
        self.status.borrow().clone()
    }

    /// Receive a [`StoreStatus`] after every state change
    pub fn subscribe(&self) -> watch::Receiver<StoreStatus> {
        self.status.subscribe()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
        self.publish();
    }

    // ==================== Document lifecycle ====================

    /// Replace the summary list with the stored index
    ///
    /// On failure the previous list is kept.
    pub fn load_documents(&mut self) -> StoreResult<()> {
        self.is_loading = true;
        self.publish();

        let result = self.storage.read_index();
        self.is_loading = false;

        match result {
            Ok(index) => {
                self.documents = index.into_entries();
                debug!("Loaded {} document summaries", self.documents.len());
                self.succeed();
                Ok(())
            }
            Err(e) => self.fail(StoreError::LoadDocuments(e)),
        }
    }

    /// Open a stored document as the current document
    ///
    /// On failure the current document is left unchanged.
    pub fn load_document(&mut self, id: &str) -> StoreResult<()> {
        self.is_loading = true;
        self.publish();

        let result = self.storage.read_document(id);
        self.is_loading = false;

        match result {
            Ok(mut document) => {
                document.renumber_blocks();
                info!("Opened document {}", document.id);
                self.current = Some(document);
                self.succeed();
                Ok(())
            }
            Err(StorageError::NotFound { .. }) => {
                self.fail(StoreError::DocumentNotFound(id.to_string()))
            }
            Err(e) => self.fail(StoreError::LoadDocument(e)),
        }
    }

    /// Create, persist and open a new empty document
    pub fn create_new_document(&mut self) -> StoreResult<Document> {
        let document = Document::new();

        if let Err(e) = self.storage.create_document(&document) {
            return self.fail(StoreError::Create(e));
        }

        self.documents.retain(|summary| summary.id != document.id);
        self.documents.insert(0, document.summary());
        self.current = Some(document.clone());

        info!("Created document {}", document.id);
        self.succeed();
        Ok(document)
    }

    /// Persist the current document and refresh the summary list
    pub fn save_current_document(&mut self) -> StoreResult<()> {
        let Some(current) = self.current.as_ref() else {
            return self.fail(StoreError::NothingToSave);
        };

        let mut snapshot = current.clone();
        snapshot.metadata.word_count = Some(snapshot.word_count());

        self.is_saving = true;
        self.publish();

        let result = self.storage.save_document(&snapshot);
        self.is_saving = false;

        let saved = match result {
            Ok(saved) => saved,
            Err(e) => return self.fail(StoreError::Save(e)),
        };

        if let Some(current) = self.current.as_mut() {
            current.metadata.updated_at = saved.metadata.updated_at;
            current.metadata.word_count = saved.metadata.word_count;
        }

        match self.storage.read_index() {
            Ok(index) => self.documents = index.into_entries(),
            Err(e) => warn!("Saved document but could not refresh list: {}", e),
        }

        debug!("Saved document {}", saved.id);
        self.succeed();
        Ok(())
    }

    /// Save the current document, then close it
    ///
    /// The document stays open when the save fails.
    pub fn close_current_document(&mut self) -> StoreResult<()> {
        if self.current.is_none() {
            return Ok(());
        }

        self.save_current_document()?;
        if let Some(document) = self.current.take() {
            info!("Closed document {}", document.id);
        }
        self.publish();
        Ok(())
    }

    /// Delete a stored document, closing it if it is the current one
    pub fn delete_document(&mut self, id: &str) -> StoreResult<()> {
        if let Err(e) = self.storage.delete_document(id) {
            return self.fail(StoreError::Delete(e));
        }

        self.documents.retain(|summary| summary.id != id);
        if self.current.as_ref().is_some_and(|doc| doc.id == id) {
            self.current = None;
        }

        info!("Deleted document {}", id);
        self.succeed();
        Ok(())
    }

    /// Save on an autosave tick, unless the tick is for a document that is
    /// no longer open
    ///
    /// Returns whether a save happened.
    pub fn apply_autosave(&mut self, tick: &AutosaveTick) -> StoreResult<bool> {
        let is_current = self
            .current
            .as_ref()
            .is_some_and(|doc| doc.id == tick.document_id);

        if !is_current {
            debug!("Discarding autosave tick for {}", tick.document_id);
            return Ok(false);
        }

        self.save_current_document()?;
        Ok(true)
    }

    // ==================== Current document edits ====================

    /// Merge a partial update into the current document
    pub fn update_document(&mut self, patch: DocumentPatch) -> StoreResult<()> {
        self.mutate_current(|doc| {
            doc.apply(patch)?;
            Ok(false)
        })
    }

    pub fn update_document_title(&mut self, title: impl Into<String>) -> StoreResult<()> {
        let title = title.into();
        self.mutate_current(|doc| {
            doc.title = title;
            Ok(true)
        })
    }

    /// Append a block
    pub fn add_block(&mut self, block: Block) -> StoreResult<()> {
        self.mutate_current(|doc| {
            check_new_block(doc, &block)?;
            doc.blocks.push(block);
            doc.renumber_blocks();
            Ok(true)
        })
    }

    /// Insert a block at `index`; `index == len` appends
    pub fn insert_block(&mut self, index: usize, block: Block) -> StoreResult<()> {
        self.mutate_current(|doc| {
            let len = doc.blocks.len();
            if index > len {
                return Err(StoreError::IndexOutOfBounds { index, len });
            }
            check_new_block(doc, &block)?;
            doc.blocks.insert(index, block);
            doc.renumber_blocks();
            Ok(true)
        })
    }

    /// Merge a partial update into a block of the current document
    pub fn update_block(&mut self, id: &str, patch: BlockPatch) -> StoreResult<()> {
        self.mutate_current(|doc| {
            let block = doc
                .block_mut(id)
                .ok_or_else(|| StoreError::BlockNotFound(id.to_string()))?;
            block.apply(patch)?;
            Ok(true)
        })
    }

    pub fn delete_block(&mut self, id: &str) -> StoreResult<()> {
        self.mutate_current(|doc| {
            let index = doc
                .block_index(id)
                .ok_or_else(|| StoreError::BlockNotFound(id.to_string()))?;
            doc.blocks.remove(index);
            doc.renumber_blocks();
            Ok(true)
        })
    }

    /// Move the block at `from` so it ends up at `to`
    pub fn reorder_blocks(&mut self, from: usize, to: usize) -> StoreResult<()> {
        self.mutate_current(|doc| {
            let len = doc.blocks.len();
            for index in [from, to] {
                if index >= len {
                    return Err(StoreError::IndexOutOfBounds { index, len });
                }
            }
            if from == to {
                return Ok(false);
            }

            let block = doc.blocks.remove(from);
            doc.blocks.insert(to, block);
            doc.renumber_blocks();
            Ok(true)
        })
    }

    /// Apply a table operation to a table block of the current document
    ///
    /// The block keeps its previous content when the operation fails.
    /// Returns `None` when no document is open.
    pub fn update_table<R>(
        &mut self,
        block_id: &str,
        op: impl FnOnce(&mut TableContent) -> Result<R, ValidationError>,
    ) -> StoreResult<Option<R>> {
        let mut output = None;
        self.mutate_current(|doc| {
            let block = doc
                .block_mut(block_id)
                .ok_or_else(|| StoreError::BlockNotFound(block_id.to_string()))?;
            let BlockContent::Table(table) = &block.content else {
                return Err(StoreError::NotATable(block_id.to_string()));
            };

            let mut table = table.clone();
            output = Some(op(&mut table)?);
            block.set_content(BlockContent::Table(table))?;
            Ok(true)
        })?;
        Ok(output)
    }

    /// Run an edit against the current document
    ///
    /// Without an open document the edit is skipped. The closure reports
    /// whether it changed the document, in which case `updated_at` is bumped.
    fn mutate_current(
        &mut self,
        edit: impl FnOnce(&mut Document) -> StoreResult<bool>,
    ) -> StoreResult<()> {
        let Some(doc) = self.current.as_mut() else {
            debug!("No open document; ignoring edit");
            return Ok(());
        };

        match edit(doc) {
            Ok(changed) => {
                if changed {
                    doc.touch();
                }
                self.succeed();
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    // ==================== Status ====================

    fn succeed(&mut self) {
        self.error = None;
        self.publish();
    }

    fn fail<T>(&mut self, error: StoreError) -> StoreResult<T> {
        warn!("{}", error);
        self.error = Some(error.to_string());
        self.publish();
        Err(error)
    }

    fn publish(&mut self) {
        self.revision += 1;
        self.status.send_replace(StoreStatus {
            revision: self.revision,
            is_loading: self.is_loading,
            is_saving: self.is_saving,
            error: self.error.clone(),
            current_document_id: self.current.as_ref().map(|doc| doc.id.clone()),
            document_count: self.documents.len(),
        });
    }
}

fn check_new_block(doc: &Document, block: &Block) -> StoreResult<()> {
    block.validate()?;
    if doc.block(&block.id).is_some() {
        return Err(ValidationError::DuplicateId(block.id.clone()).into());
    }
    Ok(())
}
