use std::collections::{BTreeMap, HashMap};

use crate::analysis::analyzer::ZoneSpan;
use crate::core::types::{DocId, Language, ZoneRank};
use crate::index::skiplist::SkipList;

/// Indexed document metadata: what ranking and NOT-evaluation need after the
/// zone text itself has been tokenized away.
#[derive(Debug, Clone)]
pub struct DocumentEntry {
    pub doc_id: DocId,
    pub title: String,
    pub language: Language,
    pub attributes: HashMap<String, String>,
    /// Zone boundaries in the unified position space, insertion order.
    pub zones: Vec<ZoneSpan>,
    pub token_count: u32,
}

impl DocumentEntry {
    pub fn rank_at(&self, position: u32) -> Option<ZoneRank> {
        self.zones
            .iter()
            .find(|span| span.contains(position))
            .map(|span| span.rank)
    }
}

/// Document table: id → entry, ordered by id.
#[derive(Default)]
pub struct DocumentTable {
    entries: BTreeMap<DocId, DocumentEntry>,
}

impl DocumentTable {
    pub fn new() -> Self {
        DocumentTable {
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, entry: DocumentEntry) {
        self.entries.insert(entry.doc_id, entry);
    }

    pub fn get(&self, doc_id: DocId) -> Option<&DocumentEntry> {
        self.entries.get(&doc_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentEntry> {
        self.entries.values()
    }

    /// The full corpus as a document-id set; the universe for NOT.
    pub fn all_doc_ids(&self) -> SkipList<DocId> {
        SkipList::from_sorted(self.entries.keys().copied().collect())
    }
}
