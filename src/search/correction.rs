use std::num::NonZeroUsize;
use std::sync::Arc;

use levenshtein_automata::{Distance, LevenshteinAutomatonBuilder, DFA};
use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use crate::index::dictionary::TermId;
use crate::index::inverted::InvertedIndex;
use crate::query::ast::{QueryFlags, QueryNode};

const CACHE_CAPACITY: usize = 1024;
/// Hard bound on ATTEMPT rounds per leaf, whatever the user flag says.
const MAX_ATTEMPTS: u32 = 8;

/// Per-leaf correction state machine:
/// `RAW → ATTEMPT(k) → { MATCHED, EMPTY → ATTEMPT(2k), GIVEUP }`.
enum LeafState {
    Attempt(u32),
    Matched(Vec<TermId>),
    GiveUp,
}

/// What a correction pass did to the tree.
pub struct CorrectionOutcome {
    pub root: QueryNode,
    /// (original token, replacement tokens) per rewritten leaf.
    pub rewrites: Vec<(String, Vec<String>)>,
    /// Tokens the loop gave up on.
    pub exhausted: Vec<String>,
}

impl CorrectionOutcome {
    pub fn message(&self) -> Option<String> {
        let mut parts = Vec::new();
        for (token, replacements) in &self.rewrites {
            parts.push(format!("corrected '{}' to {}", token, replacements.join(" | ")));
        }
        for token in &self.exhausted {
            parts.push(format!("no correction found for '{}'", token));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}

/// Spelling (edit distance) and phonetic (Soundex) correction shared by one
/// loop. Candidate sets are cached per (token, k) behind a coarse lock;
/// corrections are rare next to lookups.
pub struct CorrectionEngine {
    spelling_cache: Mutex<LruCache<(String, u32), Arc<Vec<TermId>>>>,
}

impl CorrectionEngine {
    pub fn new() -> Self {
        CorrectionEngine {
            spelling_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(CACHE_CAPACITY).expect("nonzero cache capacity"),
            )),
        }
    }

    /// Rewrite unmatched term leaves (or, in an auto-correct round, every
    /// term leaf) to an OR over the equally-best candidates.
    pub fn correct(
        &self,
        index: &InvertedIndex,
        root: QueryNode,
        flags: &QueryFlags,
        include_matched: bool,
    ) -> CorrectionOutcome {
        let mut rewrites = Vec::new();
        let mut exhausted = Vec::new();

        let root = root.map_leaves(&mut |leaf| match leaf {
            QueryNode::Term(token) => {
                let matched = index.lookup(&token).is_some();
                if matched && !include_matched {
                    return QueryNode::Term(token);
                }
                match self.correct_leaf(index, &token, flags) {
                    LeafState::Matched(candidates) => {
                        let replacements: Vec<String> = candidates
                            .iter()
                            .map(|&id| index.dictionary().text(id).to_string())
                            .collect();
                        if replacements == [token.as_str()] {
                            // best candidate is the token itself
                            return QueryNode::Term(token);
                        }
                        debug!(token = %token, ?replacements, "correction rewrote leaf");
                        rewrites.push((token.clone(), replacements.clone()));
                        let mut children: Vec<QueryNode> =
                            replacements.into_iter().map(QueryNode::Term).collect();
                        // a matched leaf in an auto-correct round keeps itself
                        // alongside the candidates
                        if matched && !children.contains(&QueryNode::Term(token.clone())) {
                            children.push(QueryNode::Term(token));
                        }
                        if children.len() == 1 {
                            children.pop().unwrap_or(QueryNode::Empty)
                        } else {
                            QueryNode::Or(children)
                        }
                    }
                    LeafState::GiveUp => {
                        if !matched {
                            exhausted.push(token.clone());
                        }
                        QueryNode::Term(token)
                    }
                    LeafState::Attempt(_) => QueryNode::Term(token),
                }
            }
            other => other,
        });

        CorrectionOutcome {
            root,
            rewrites,
            exhausted,
        }
    }

    /// Drive one leaf through the attempt loop.
    fn correct_leaf(&self, index: &InvertedIndex, token: &str, flags: &QueryFlags) -> LeafState {
        let default_k = index.config.default_edit_distance;
        let spelling_bound = flags.spelling.map(|k| if k == 0 { default_k } else { k });
        let phonetic_enabled = flags.phonetic.is_some();
        let spelling_enabled = spelling_bound.is_some() || !phonetic_enabled;

        let phonetic_bucket: Vec<TermId> = if phonetic_enabled {
            index.phonetic().bucket_for(token).to_vec()
        } else {
            Vec::new()
        };

        // phonetic only: the bucket is the whole candidate set
        if !spelling_enabled {
            return if phonetic_bucket.is_empty() {
                LeafState::GiveUp
            } else {
                LeafState::Matched(phonetic_bucket)
            };
        }

        let bound = spelling_bound.unwrap_or(default_k).max(1);
        let mut state = LeafState::Attempt(default_k.min(bound).max(1));
        let mut attempts = 0;
        loop {
            match state {
                LeafState::Attempt(k) => {
                    attempts += 1;
                    let mut candidates = self.spelling_candidates(index, token, k).to_vec();
                    if phonetic_enabled {
                        candidates.retain(|id| phonetic_bucket.contains(id));
                    }
                    if !candidates.is_empty() {
                        state = LeafState::Matched(candidates);
                    } else if k < bound && attempts < MAX_ATTEMPTS {
                        state = LeafState::Attempt((k * 2).min(bound));
                    } else {
                        state = LeafState::GiveUp;
                    }
                }
                done => return done,
            }
        }
    }

    /// Dictionary terms at edit distance ≤ k from `token`, narrowed to the
    /// equally-best (minimum distance) set. DFA-driven for k ≤ 2, full DP
    /// beyond the parametric tables.
    pub fn spelling_candidates(
        &self,
        index: &InvertedIndex,
        token: &str,
        k: u32,
    ) -> Arc<Vec<TermId>> {
        let key = (token.to_string(), k);
        if let Some(hit) = self.spelling_cache.lock().get(&key) {
            return Arc::clone(hit);
        }

        let mut best_distance = u32::MAX;
        let mut best: Vec<TermId> = Vec::new();
        let mut consider = |id: TermId, distance: u32| {
            if distance < best_distance {
                best_distance = distance;
                best.clear();
            }
            if distance == best_distance {
                best.push(id);
            }
        };

        if k <= 2 {
            let builder = LevenshteinAutomatonBuilder::new(k as u8, true);
            let dfa = builder.build_dfa(token);
            for (id, info) in index.dictionary().iter_sorted() {
                if let Some(d) = dfa_distance(&dfa, &info.text) {
                    consider(id, d as u32);
                }
            }
        } else {
            for (id, info) in index.dictionary().iter_sorted() {
                let d = levenshtein(token, &info.text);
                if d <= k {
                    consider(id, d);
                }
            }
        }

        let candidates = Arc::new(best);
        self.spelling_cache.lock().put(key, Arc::clone(&candidates));
        candidates
    }
}

impl Default for CorrectionEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn dfa_distance(dfa: &DFA, candidate: &str) -> Option<u8> {
    let mut state = dfa.initial_state();
    for &byte in candidate.as_bytes() {
        state = dfa.transition(state, byte);
    }
    match dfa.distance(state) {
        Distance::Exact(d) => Some(d),
        Distance::AtLeast(_) => None,
    }
}

/// Plain Levenshtein distance, used past the DFA's practical range.
pub fn levenshtein(a: &str, b: &str) -> u32 {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.is_empty() {
        return b.len() as u32;
    }
    if b.is_empty() {
        return a.len() as u32;
    }

    let mut prev: Vec<u32> = (0..=b.len() as u32).collect();
    let mut curr = vec![0u32; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i as u32;
        for j in 1..=b.len() {
            let cost = u32::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("spack", "space"), 1);
        assert_eq!(levenshtein("robbert", "robert"), 1);
        assert_eq!(levenshtein("jam", "jam"), 0);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }
}
