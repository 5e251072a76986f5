use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::dictionary::TermId;
use crate::index::inverted::InvertedIndex;
use crate::index::posting::PostingList;
use crate::index::skiplist::SkipList;
use crate::query::ast::QueryNode;
use crate::query::wildcard::{MatchOutcome, WildcardMatcher};

/// Bottom-up boolean evaluation: every node compiles to a document-id set
/// built from skip-list merges over posting lists.
pub struct Evaluator<'a> {
    index: &'a InvertedIndex,
}

impl<'a> Evaluator<'a> {
    pub fn new(index: &'a InvertedIndex) -> Self {
        Evaluator { index }
    }

    pub fn evaluate(&self, node: &QueryNode) -> Result<SkipList<DocId>> {
        Ok(match node {
            QueryNode::Empty => SkipList::new(),

            QueryNode::Term(token) => match self.index.postings_for(token) {
                Some(postings) => postings.doc_ids(),
                None => SkipList::new(),
            },

            QueryNode::Wildcard(pattern) => {
                let terms = self.resolve_wildcard(pattern);
                let mut merged = PostingList::empty();
                for term in terms {
                    merged = merged.union(self.index.postings(term));
                }
                merged.doc_ids()
            }

            QueryNode::Phrase(tokens) => self.evaluate_phrase(tokens),

            QueryNode::And(children) => {
                // smallest set first keeps the merges cheap
                let mut sets: Vec<SkipList<DocId>> = Vec::with_capacity(children.len());
                for child in children.iter().filter(|c| !c.is_empty()) {
                    sets.push(self.evaluate(child)?);
                }
                match sets.len() {
                    0 => SkipList::new(),
                    _ => {
                        sets.sort_by_key(|set| set.len());
                        let mut iter = sets.into_iter();
                        let first = iter.next().unwrap_or_default();
                        iter.fold(first, |acc, set| acc.intersect(&set))
                    }
                }
            }

            QueryNode::Or(children) => {
                let mut acc = SkipList::new();
                for child in children.iter().filter(|c| !c.is_empty()) {
                    acc = acc.union(&self.evaluate(child)?);
                }
                acc
            }

            QueryNode::Not(child) => {
                let universe = self.index.universe();
                if child.is_empty() {
                    universe
                } else {
                    universe.difference(&self.evaluate(child)?)
                }
            }
        })
    }

    /// Phrase evaluation: positional intersection left to right, keeping
    /// strict adjacency. Any token missing from the dictionary empties the
    /// result. Zones are adjacent in the unified position space, so a match
    /// window must additionally fall inside a single zone.
    fn evaluate_phrase(&self, tokens: &[String]) -> SkipList<DocId> {
        let mut lists = Vec::with_capacity(tokens.len());
        for token in tokens {
            match self.index.postings_for(token) {
                Some(postings) => lists.push(postings),
                None => return SkipList::new(),
            }
        }
        let mut iter = lists.into_iter();
        let first = match iter.next() {
            Some(first) => first.clone(),
            None => return SkipList::new(),
        };
        let chained = iter.fold(first, |acc, next| acc.intersect_adjacent(next));

        let len = tokens.len() as u32;
        if len <= 1 {
            return chained.doc_ids();
        }
        // positions in `chained` are the end of each matched window
        let mut out = Vec::new();
        for posting in chained.iter() {
            let in_one_zone = match self.index.documents().get(posting.doc_id) {
                Some(entry) => posting.positions.iter().any(|&end| {
                    let start = end + 1 - len;
                    entry
                        .zones
                        .iter()
                        .any(|zone| zone.contains(start) && zone.contains(end))
                }),
                None => true,
            };
            if in_one_zone {
                out.push(posting.doc_id);
            }
        }
        SkipList::from_sorted(out)
    }

    /// Resolve a wildcard token to dictionary terms. The permuterm scan is
    /// exact for a single `*`; multi-star patterns are additionally filtered
    /// by the compatibility matcher against the un-stemmed query. A matcher
    /// budget exhaustion rejects just that candidate.
    pub fn resolve_wildcard(&self, pattern: &str) -> Vec<TermId> {
        let candidates = self.index.wildcard_candidates(pattern);
        if pattern.matches('*').count() <= 1 {
            return candidates;
        }
        let stemmer = &self.index.analyzer().stemmer;
        let matcher = WildcardMatcher::new(stemmer);
        candidates
            .into_iter()
            .filter(|&term| {
                let text = self.index.dictionary().text(term);
                match matcher.matches(pattern, text) {
                    MatchOutcome::Valid => true,
                    MatchOutcome::Invalid => false,
                    MatchOutcome::Incomplete => {
                        // recoverable: reject just this candidate
                        Error::new(
                            ErrorKind::MatcherTimeout,
                            format!("step budget exhausted matching '{}' against '{}'", pattern, text),
                        )
                        .recover();
                        false
                    }
                }
            })
            .collect()
    }

    /// Term ids contributed by the positive leaves of the tree, for ranking.
    /// Leaves under NOT cannot occur in the result documents and are skipped.
    pub fn scoring_terms(&self, node: &QueryNode) -> Vec<TermId> {
        let mut terms = Vec::new();
        self.collect_scoring_terms(node, &mut terms);
        terms.sort();
        terms.dedup();
        terms
    }

    fn collect_scoring_terms(&self, node: &QueryNode, out: &mut Vec<TermId>) {
        match node {
            QueryNode::Term(token) => {
                if let Some(id) = self.index.lookup(token) {
                    out.push(id);
                }
            }
            QueryNode::Phrase(tokens) => {
                for token in tokens {
                    if let Some(id) = self.index.lookup(token) {
                        out.push(id);
                    }
                }
            }
            QueryNode::Wildcard(pattern) => {
                out.extend(self.resolve_wildcard(pattern));
            }
            QueryNode::And(children) | QueryNode::Or(children) => {
                for child in children {
                    self.collect_scoring_terms(child, out);
                }
            }
            QueryNode::Not(_) | QueryNode::Empty => {}
        }
    }
}
