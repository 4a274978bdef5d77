//! Folio Core Library
//!
//! This crate provides the state and persistence core for Folio, a
//! block-based document editor: the document/block model, the document
//! store, and local storage with a summary index, import/export and
//! autosave.
//!
//! # Architecture
//!
//! - **Full records**: each document stored as JSON under its own key
//! - **Summary index**: read-optimized list backing document lists
//! - **Store**: in-memory editing state; edits persist on save or autosave
//!
//! # Quick Start
//!
//! ```text
//! let mut store = DocumentStore::open()?;
//!
//! // Create a document and add a table
//! store.create_new_document()?;
//! store.add_block(Block::empty(BlockType::Table))?;
//! store.save_current_document()?;
//!
//! // List documents, newest first
//! let summaries = store.documents();
//! ```
//!
//! # Modules
//!
//! - `store`: Document store (main entry point)
//! - `models`: Documents, settings, metadata and summaries
//! - `block`: Blocks and their typed content
//! - `table`: Table content and table operations
//! - `storage`: Key-value backends and document persistence
//! - `autosave`: Periodic autosave scheduling
//! - `config`: Application configuration

pub mod autosave;
pub mod block;
pub mod config;
pub mod models;
pub mod storage;
pub mod store;
pub mod table;

pub use autosave::{Autosave, AutosaveTick};
pub use block::{Block, BlockContent, BlockPatch, BlockStyles, BlockType};
pub use config::Config;
pub use models::{
    Document, DocumentMetadata, DocumentPatch, DocumentSettings, DocumentSummary,
    ValidationError,
};
pub use storage::{
    DocumentStorage, FileStore, ImportReport, KeyValueStore, MemoryStore, StorageError,
    StorageErrorKind, StorageStats,
};
pub use store::{DocumentStore, StoreError, StoreStatus};
pub use table::{CellValue, ColumnType, TableContent};
