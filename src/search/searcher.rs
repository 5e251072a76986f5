use std::time::Instant;

use crate::core::error::{Error, ErrorKind, Result};
use crate::index::inverted::InvertedIndex;
use crate::query::ast::{ParsedQuery, QueryNode};
use crate::query::parser::QueryParser;
use crate::scoring::scorer::rank_documents;
use crate::search::correction::CorrectionEngine;
use crate::search::evaluator::Evaluator;
use crate::search::results::SearchResults;

/// Ties the parser, evaluator, correction loop and ranking together over one
/// published index. Read-only; safe to share across query threads.
pub struct Searcher<'a> {
    index: &'a InvertedIndex,
    parser: QueryParser,
    correction: CorrectionEngine,
}

impl<'a> Searcher<'a> {
    pub fn new(index: &'a InvertedIndex) -> Self {
        Searcher {
            index,
            parser: QueryParser::new(),
            correction: CorrectionEngine::new(),
        }
    }

    pub fn index(&self) -> &InvertedIndex {
        self.index
    }

    /// Parse and run one query line (flags included).
    pub fn search(&self, line: &str) -> Result<SearchResults> {
        let parsed = self.parser.parse(line, self.index.analyzer())?;
        self.run(parsed)
    }

    pub fn run(&self, parsed: ParsedQuery) -> Result<SearchResults> {
        let started = Instant::now();
        let evaluator = Evaluator::new(self.index);
        let flags = parsed.flags;
        let mut root = parsed.root;
        let mut notes: Vec<String> = Vec::new();

        // explicit -s / -p: rewrite unmatched leaves before evaluation
        if flags.spelling.is_some() || flags.phonetic.is_some() {
            let outcome = self.correction.correct(self.index, root, &flags, false);
            notes.extend(outcome.message());
            root = outcome.root;
        }

        let mut docs = evaluator.evaluate(&root)?;

        // -a: one round of word-wise correction, only on a zero-result pass
        if docs.is_empty() && flags.auto_correct && !root.is_empty() {
            let outcome = self.correction.correct(self.index, root, &flags, true);
            if !outcome.rewrites.is_empty() {
                notes.extend(outcome.message());
                root = outcome.root;
                docs = evaluator.evaluate(&root)?;
            } else {
                notes.extend(outcome.message());
                root = outcome.root;
            }
        }

        // the exhausted loop yields an empty result plus an informational
        // note, not a failed query
        if docs.is_empty() && flags.wants_correction() {
            let err = Error::new(
                ErrorKind::CorrectionExhausted,
                "correction attempts exhausted with no matches",
            );
            if !err.recover() {
                return Err(err);
            }
            notes.push(err.context);
        }

        let leaves = evaluator.scoring_terms(&root);
        let hits = rank_documents(self.index, &leaves, &docs);

        Ok(SearchResults {
            total_hits: hits.len(),
            hits,
            took_ms: started.elapsed().as_millis() as u64,
            correction: if notes.is_empty() {
                None
            } else {
                Some(notes.join("; "))
            },
        })
    }

    /// Evaluate an already-built tree without flags; used by tests and the
    /// boolean-law property checks.
    pub fn evaluate_tree(&self, root: &QueryNode) -> Result<SearchResults> {
        let started = Instant::now();
        let evaluator = Evaluator::new(self.index);
        let docs = evaluator.evaluate(root)?;
        let leaves = evaluator.scoring_terms(root);
        let hits = rank_documents(self.index, &leaves, &docs);
        Ok(SearchResults {
            total_hits: hits.len(),
            hits,
            took_ms: started.elapsed().as_millis() as u64,
            correction: None,
        })
    }
}
