use serde::Serialize;

use crate::core::types::DocId;

#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    pub doc_id: DocId,
    pub score: f32,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub hits: Vec<ScoredDocument>,
    pub total_hits: usize,
    pub took_ms: u64,
    /// Informational note from the correction loop (rewrites applied, or
    /// exhaustion with no candidates).
    pub correction: Option<String>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn doc_ids(&self) -> Vec<DocId> {
        self.hits.iter().map(|hit| hit.doc_id).collect()
    }

    /// One page of hits for the REPL's `[y/n]` pagination.
    pub fn page(&self, page: usize, page_size: usize) -> &[ScoredDocument] {
        let start = page * page_size;
        let end = (start + page_size).min(self.hits.len());
        if start >= self.hits.len() {
            &[]
        } else {
            &self.hits[start..end]
        }
    }
}
