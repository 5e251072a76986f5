use crate::core::types::DocId;
use crate::index::dictionary::TermId;
use crate::index::documents::DocumentEntry;
use crate::index::inverted::InvertedIndex;
use crate::index::posting::Posting;
use crate::index::skiplist::SkipList;
use crate::search::results::ScoredDocument;

/// Scorer trait: weight of one term occurrence record inside one document.
pub trait Scorer: Send + Sync {
    fn score(&self, posting: &Posting, idf: f32) -> f32;

    fn name(&self) -> &str;
}

/// wf-idf: (1 + log tf) · idf, zero when the term is absent.
pub struct WfIdfScorer;

impl Scorer for WfIdfScorer {
    fn score(&self, posting: &Posting, idf: f32) -> f32 {
        let tf = posting.term_freq();
        if tf == 0 {
            return 0.0;
        }
        (1.0 + (tf as f32).ln()) * idf
    }

    fn name(&self) -> &str {
        "wf_idf"
    }
}

/// Plain tf-idf: tf · idf.
pub struct TfIdfScorer;

impl Scorer for TfIdfScorer {
    fn score(&self, posting: &Posting, idf: f32) -> f32 {
        posting.term_freq() as f32 * idf
    }

    fn name(&self) -> &str {
        "tfidf"
    }
}

/// Zone weighting: each occurrence contributes the weight of the zone its
/// position falls in, so title hits outrank body hits.
pub fn zone_weight(entry: &DocumentEntry, positions: &[u32]) -> f32 {
    positions
        .iter()
        .filter_map(|&p| entry.rank_at(p))
        .map(|rank| rank.weight())
        .sum()
}

/// Score every candidate document against the query leaves.
///
/// When ranking is disabled by config the hits keep score 0 and document-id
/// order; otherwise they sort by descending score with ties broken by
/// ascending document id.
pub fn rank_documents(
    index: &InvertedIndex,
    leaves: &[TermId],
    docs: &SkipList<DocId>,
) -> Vec<ScoredDocument> {
    let rank = index.config.rank_query_results;
    let scorer: Box<dyn Scorer> = if index.config.use_wf_idf {
        Box::new(WfIdfScorer)
    } else {
        Box::new(TfIdfScorer)
    };

    let mut hits: Vec<ScoredDocument> = docs
        .iter()
        .map(|&doc_id| {
            let entry = index.documents().get(doc_id);
            let score = if rank {
                leaves
                    .iter()
                    .map(|&term| {
                        let idf = index.dictionary().idf(term);
                        match (index.postings(term).get(doc_id), entry) {
                            (Some(posting), Some(entry)) => {
                                scorer.score(posting, idf) * zone_weight(entry, &posting.positions)
                            }
                            _ => 0.0,
                        }
                    })
                    .sum()
            } else {
                0.0
            };
            ScoredDocument {
                doc_id,
                score,
                title: entry.map(|e| e.title.clone()).unwrap_or_default(),
            }
        })
        .collect();

    if rank {
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.doc_id.cmp(&b.doc_id))
        });
    }
    hits
}
