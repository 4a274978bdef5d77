//! Storage layer
//!
//! Handles document persistence over a key-value medium.
//!
//! ## Architecture
//!
//! - **Full records**: one JSON document per key, source of truth
//! - **Summary index**: read-optimized list of summaries for list views
//!
//! Whenever a document is written or removed, the index is updated to
//! reflect the new state.

pub mod backend;
pub mod error;
pub mod persistence;
pub mod projection;

pub use backend::{FileStore, KeyValueStore, MemoryStore};
pub use error::{StorageError, StorageErrorKind, StorageResult};
pub use persistence::{
    document_key, DocumentStorage, ImportReport, StorageStats, DEFAULT_QUOTA_BYTES,
    DOCUMENTS_KEY, DOCUMENT_KEY_PREFIX, STORAGE_PREFIX,
};
pub use projection::SummaryIndex;
