//! Summary index projection
//!
//! The index is a read-optimized list of [`DocumentSummary`] records kept
//! next to the full documents. It is always ordered by `updated_at`,
//! newest first, and holds at most one entry per document id.

use std::collections::HashMap;

use crate::models::DocumentSummary;

/// Ordered list of document summaries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryIndex {
    entries: Vec<DocumentSummary>,
}

impl SummaryIndex {
    /// Build an index from stored entries, restoring the ordering invariant
    ///
    /// A repeated id keeps the slot of its first entry and the value of its
    /// last. Entries with equal timestamps keep their stored order.
    pub fn from_entries(entries: Vec<DocumentSummary>) -> Self {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut deduped: Vec<DocumentSummary> = Vec::with_capacity(entries.len());
        for entry in entries {
            match slots.get(&entry.id) {
                Some(&slot) => deduped[slot] = entry,
                None => {
                    slots.insert(entry.id.clone(), deduped.len());
                    deduped.push(entry);
                }
            }
        }

        let mut index = Self { entries: deduped };
        index.sort();
        index
    }

    /// Insert a summary, replacing any existing entry with the same id
    pub fn upsert(&mut self, summary: DocumentSummary) {
        match self.entries.iter_mut().find(|s| s.id == summary.id) {
            Some(existing) => *existing = summary,
            None => self.entries.insert(0, summary),
        }
        self.sort();
    }

    /// Remove the entry for `id`, returning whether one existed
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|s| s.id != id);
        self.entries.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&DocumentSummary> {
        self.entries.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DocumentSummary] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<DocumentSummary> {
        self.entries
    }

    // Stable, so entries with equal timestamps keep insertion order
    fn sort(&mut self) {
        self.entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn summary(id: &str, minutes: i64) -> DocumentSummary {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        DocumentSummary {
            id: id.to_string(),
            title: format!("Doc {}", id),
            created_at: base,
            updated_at: base + Duration::minutes(minutes),
            block_count: 1,
            word_count: Some(0),
        }
    }

    fn ids(index: &SummaryIndex) -> Vec<&str> {
        index.entries().iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_upsert_orders_newest_first() {
        let mut index = SummaryIndex::default();
        index.upsert(summary("a", 1));
        index.upsert(summary("b", 3));
        index.upsert(summary("c", 2));

        assert_eq!(ids(&index), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_upsert_replaces_existing() {
        let mut index = SummaryIndex::default();
        index.upsert(summary("a", 1));
        index.upsert(summary("b", 2));

        let mut renamed = summary("a", 5);
        renamed.title = "Renamed".to_string();
        index.upsert(renamed);

        assert_eq!(index.len(), 2);
        assert_eq!(ids(&index), vec!["a", "b"]);
        assert_eq!(index.get("a").unwrap().title, "Renamed");
    }

    #[test]
    fn test_new_entry_wins_timestamp_tie() {
        let mut index = SummaryIndex::default();
        index.upsert(summary("a", 1));
        index.upsert(summary("b", 1));

        assert_eq!(ids(&index), vec!["b", "a"]);
    }

    #[test]
    fn test_remove() {
        let mut index = SummaryIndex::from_entries(vec![summary("a", 1), summary("b", 2)]);

        assert!(index.remove("a"));
        assert!(!index.remove("a"));
        assert_eq!(ids(&index), vec!["b"]);
    }

    #[test]
    fn test_from_entries_dedupes_and_sorts() {
        let index = SummaryIndex::from_entries(vec![
            summary("a", 1),
            summary("b", 4),
            summary("a", 9),
        ]);

        assert_eq!(ids(&index), vec!["a", "b"]);
        assert_eq!(index.get("a").unwrap().updated_at, summary("a", 9).updated_at);
    }

    #[test]
    fn test_from_entries_keeps_tied_order_across_reloads() {
        let stored = vec![summary("a", 1), summary("b", 1), summary("c", 1)];

        let mut index = SummaryIndex::from_entries(stored);
        for _ in 0..3 {
            assert_eq!(ids(&index), vec!["a", "b", "c"]);
            index = SummaryIndex::from_entries(index.into_entries());
        }
        assert_eq!(ids(&index), vec!["a", "b", "c"]);
    }
}
