//! Document persistence
//!
//! Maps documents onto a [`KeyValueStore`]:
//!
//! - `doc_editor_doc_<id>` - the full document as JSON
//! - `doc_editor_documents` - the summary index, newest first
//!
//! Every write keeps the index in step with the full records. Readers come
//! in two flavours: strict ones (`read_*`) return typed errors, tolerant ones
//! (`get_*`) log the failure and fall back to an empty result.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::backend::{entry_size, KeyValueStore};
use super::error::{StorageError, StorageResult};
use super::projection::SummaryIndex;
use crate::models::{Document, DocumentSummary};

/// Prefix shared by every key this crate writes
pub const STORAGE_PREFIX: &str = "doc_editor_";

/// Key holding the summary index
pub const DOCUMENTS_KEY: &str = "doc_editor_documents";

/// Prefix of the per-document keys
pub const DOCUMENT_KEY_PREFIX: &str = "doc_editor_doc_";

/// Capacity reported by [`DocumentStorage::storage_info`] unless configured
pub const DEFAULT_QUOTA_BYTES: usize = 10 * 1024 * 1024;

/// Key for a document's full record
pub fn document_key(id: &str) -> String {
    format!("{}{}", DOCUMENT_KEY_PREFIX, id)
}

/// Outcome of an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub success: usize,
    pub failed: usize,
}

/// Storage usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    /// Bytes used by values under the storage prefix (2 per UTF-16 unit)
    pub used: usize,
    /// Total capacity of the medium
    pub available: usize,
    pub document_count: usize,
}

impl StorageStats {
    pub fn remaining(&self) -> usize {
        self.available.saturating_sub(self.used)
    }
}

/// Document persistence over a key-value backend
#[derive(Debug, Clone)]
pub struct DocumentStorage<S> {
    backend: S,
    quota: usize,
}

impl<S: KeyValueStore> DocumentStorage<S> {
    pub fn new(backend: S) -> Self {
        Self::with_quota(backend, DEFAULT_QUOTA_BYTES)
    }

    /// Create a storage adapter reporting `quota` as its capacity
    pub fn with_quota(backend: S, quota: usize) -> Self {
        Self { backend, quota }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    // ==================== Strict readers ====================

    /// Read the summary index; a missing index is empty
    pub fn read_index(&self) -> StorageResult<SummaryIndex> {
        let Some(raw) = self.backend.get(DOCUMENTS_KEY)? else {
            return Ok(SummaryIndex::default());
        };
        let entries: Vec<DocumentSummary> =
            serde_json::from_str(&raw).map_err(|e| StorageError::Serialization {
                key: DOCUMENTS_KEY.to_string(),
                source: e,
            })?;
        Ok(SummaryIndex::from_entries(entries))
    }

    /// Read a full document
    pub fn read_document(&self, id: &str) -> StorageResult<Document> {
        let key = document_key(id);
        let raw = self
            .backend
            .get(&key)?
            .ok_or_else(|| StorageError::NotFound { key: key.clone() })?;
        serde_json::from_str(&raw).map_err(|e| StorageError::Serialization { key, source: e })
    }

    // ==================== Tolerant readers ====================

    /// All summaries, newest first; empty when the index cannot be read
    pub fn get_all_documents(&self) -> Vec<DocumentSummary> {
        match self.read_index() {
            Ok(index) => index.into_entries(),
            Err(e) => {
                warn!("Failed to read document index: {}", e);
                Vec::new()
            }
        }
    }

    /// A full document; `None` when missing or unreadable
    pub fn get_document(&self, id: &str) -> Option<Document> {
        match self.read_document(id) {
            Ok(document) => Some(document),
            Err(StorageError::NotFound { .. }) => None,
            Err(e) => {
                warn!("Failed to read document {}: {}", id, e);
                None
            }
        }
    }

    // ==================== Writes ====================

    /// Save a document, refreshing its `updated_at`
    ///
    /// Returns the record as written.
    pub fn save_document(&self, document: &Document) -> StorageResult<Document> {
        let mut saved = document.clone();
        saved.touch();
        self.write_document(&saved)?;
        debug!("Saved document {}", saved.id);
        Ok(saved)
    }

    /// Persist a new document as-is
    pub fn create_document(&self, document: &Document) -> StorageResult<()> {
        self.write_document(document)?;
        debug!("Created document {}", document.id);
        Ok(())
    }

    /// Remove a document and its index entry
    pub fn delete_document(&self, id: &str) -> StorageResult<()> {
        self.backend.remove(&document_key(id))?;

        let mut index = self.index_or_empty();
        index.remove(id);
        self.write_index(&index)?;

        debug!("Deleted document {}", id);
        Ok(())
    }

    /// Remove every key under the storage prefix
    pub fn clear_all_documents(&self) -> StorageResult<usize> {
        let keys: Vec<String> = self
            .backend
            .keys()?
            .into_iter()
            .filter(|key| key.starts_with(STORAGE_PREFIX))
            .collect();

        for key in &keys {
            self.backend.remove(key)?;
        }

        debug!("Cleared {} storage keys", keys.len());
        Ok(keys.len())
    }

    fn write_document(&self, document: &Document) -> StorageResult<()> {
        document.validate()?;

        let key = document_key(&document.id);
        let json = serde_json::to_string(document).map_err(|e| StorageError::Serialization {
            key: key.clone(),
            source: e,
        })?;
        let previous = self.backend.get(&key)?;
        self.backend.set(&key, &json)?;

        let mut index = self.index_or_empty();
        index.upsert(document.summary());
        if let Err(e) = self.write_index(&index) {
            // Put the record back so it matches the index again
            let restored = match previous {
                Some(ref value) => self.backend.set(&key, value),
                None => self.backend.remove(&key),
            };
            if let Err(restore_err) = restored {
                warn!("Failed to roll back {}: {}", key, restore_err);
            }
            return Err(e);
        }
        Ok(())
    }

    fn write_index(&self, index: &SummaryIndex) -> StorageResult<()> {
        let json =
            serde_json::to_string(index.entries()).map_err(|e| StorageError::Serialization {
                key: DOCUMENTS_KEY.to_string(),
                source: e,
            })?;
        self.backend.set(DOCUMENTS_KEY, &json)
    }

    // A corrupted index is rebuilt from scratch on the next write
    fn index_or_empty(&self) -> SummaryIndex {
        self.read_index().unwrap_or_else(|e| {
            warn!("Discarding unreadable document index: {}", e);
            SummaryIndex::default()
        })
    }

    // ==================== Import / export ====================

    /// Pretty-printed JSON array of every readable document in index order
    pub fn export_all_documents(&self) -> StorageResult<String> {
        let documents: Vec<Document> = self
            .get_all_documents()
            .iter()
            .filter_map(|summary| self.get_document(&summary.id))
            .collect();

        serde_json::to_string_pretty(&documents).map_err(|e| StorageError::Serialization {
            key: "export".to_string(),
            source: e,
        })
    }

    /// Import a JSON array of documents, continuing past bad records
    ///
    /// Input that is not a JSON array counts as a single failure.
    pub fn import_documents(&self, json: &str) -> ImportReport {
        let records: Vec<Value> = match serde_json::from_str(json) {
            Ok(records) => records,
            Err(e) => {
                warn!("Import failed: {}", e);
                return ImportReport {
                    success: 0,
                    failed: 1,
                };
            }
        };

        let mut report = ImportReport::default();
        for (i, record) in records.into_iter().enumerate() {
            let result = serde_json::from_value::<Document>(record)
                .map_err(|e| StorageError::Serialization {
                    key: format!("import[{}]", i),
                    source: e,
                })
                .and_then(|mut document| {
                    document.renumber_blocks();
                    self.save_document(&document)
                });

            match result {
                Ok(_) => report.success += 1,
                Err(e) => {
                    warn!("Skipping import record {}: {}", i, e);
                    report.failed += 1;
                }
            }
        }

        debug!(
            "Imported {} documents ({} failed)",
            report.success, report.failed
        );
        report
    }

    // ==================== Usage ====================

    pub fn storage_info(&self) -> StorageResult<StorageStats> {
        let mut used = 0;
        for key in self.backend.keys()? {
            if !key.starts_with(STORAGE_PREFIX) {
                continue;
            }
            if let Some(value) = self.backend.get(&key)? {
                used += entry_size("", &value);
            }
        }

        Ok(StorageStats {
            used,
            available: self.quota,
            document_count: self.get_all_documents().len(),
        })
    }
}
