use crate::analysis::analyzer::Analyzer;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::types::DocId;
use crate::index::dictionary::{TermDictionary, TermId};
use crate::index::documents::DocumentTable;
use crate::index::permuterm::{wildcard_prefix, PermutermIndex};
use crate::index::phonetic::PhoneticIndex;
use crate::index::posting::PostingList;
use crate::index::skiplist::SkipList;

/// The published inverted index. Read-only after construction; concurrent
/// queries need no locking.
pub struct InvertedIndex {
    pub config: Config,
    dictionary: TermDictionary,
    /// Posting lists indexed by `TermId`.
    postings: Vec<PostingList>,
    permuterm: PermutermIndex,
    phonetic: PhoneticIndex,
    documents: DocumentTable,
    analyzer: Analyzer,
}

impl std::fmt::Debug for InvertedIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvertedIndex").finish_non_exhaustive()
    }
}

impl InvertedIndex {
    /// Assemble from finished parts. The builder and the loader both end
    /// here; idf caching happens before publication.
    pub fn from_parts(
        config: Config,
        mut dictionary: TermDictionary,
        postings: Vec<PostingList>,
        permuterm: PermutermIndex,
        phonetic: PhoneticIndex,
        documents: DocumentTable,
    ) -> Self {
        debug_assert_eq!(dictionary.len(), postings.len());
        dictionary.calculate_idf(documents.len());
        let analyzer = Analyzer::from_config(&config);
        InvertedIndex {
            config,
            dictionary,
            postings,
            permuterm,
            phonetic,
            documents,
            analyzer,
        }
    }

    /// Derive the permuterm and phonetic maps from a finished dictionary.
    pub fn build_auxiliary(dictionary: &TermDictionary) -> Result<(PermutermIndex, PhoneticIndex)> {
        let permuterm =
            PermutermIndex::build(dictionary.iter_sorted().map(|(id, info)| (id, info.text.as_str())))?;
        let phonetic =
            PhoneticIndex::build(dictionary.iter_sorted().map(|(id, info)| (id, info.text.as_str())));
        Ok((permuterm, phonetic))
    }

    pub fn dictionary(&self) -> &TermDictionary {
        &self.dictionary
    }

    pub fn permuterm(&self) -> &PermutermIndex {
        &self.permuterm
    }

    pub fn phonetic(&self) -> &PhoneticIndex {
        &self.phonetic
    }

    pub fn documents(&self) -> &DocumentTable {
        &self.documents
    }

    /// The query-side analyzer; identical pipeline to index time.
    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }

    pub fn term_count(&self) -> usize {
        self.dictionary.len()
    }

    pub fn lookup(&self, token: &str) -> Option<TermId> {
        self.dictionary.lookup(token)
    }

    pub fn postings(&self, id: TermId) -> &PostingList {
        &self.postings[id.index()]
    }

    pub fn postings_for(&self, token: &str) -> Option<&PostingList> {
        self.lookup(token).map(|id| self.postings(id))
    }

    pub fn all_postings(&self) -> &[PostingList] {
        &self.postings
    }

    /// The universe document set, used by NOT.
    pub fn universe(&self) -> SkipList<DocId> {
        self.documents.all_doc_ids()
    }

    /// Candidate terms for a wildcard token via the permuterm rotation scan.
    /// Single-star patterns are exact; multi-star patterns still need the
    /// compatibility matcher pass, which the evaluator applies.
    ///
    /// A pure prefix pattern (`foo*`) short-circuits to the dictionary's own
    /// prefix scan, which the trie backend accelerates.
    pub fn wildcard_candidates(&self, pattern: &str) -> Vec<TermId> {
        if let Some(stripped) = pattern.strip_suffix('*') {
            if !stripped.contains('*') && !stripped.is_empty() {
                return self.dictionary.prefix_terms(stripped);
            }
        }
        match wildcard_prefix(pattern) {
            Some(prefix) => self.permuterm.resolve_prefix(&prefix),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DictionaryKind;

    fn tiny_index(kind: DictionaryKind) -> InvertedIndex {
        let mut config = Config::default();
        config.dictionary = kind;
        let dictionary = TermDictionary::build(
            kind,
            vec![
                ("jam".to_string(), 1),
                ("space".to_string(), 1),
                ("spade".to_string(), 1),
                ("spice".to_string(), 1),
            ],
        )
        .unwrap();
        let postings = vec![PostingList::empty(); dictionary.len()];
        let (permuterm, phonetic) = InvertedIndex::build_auxiliary(&dictionary).unwrap();
        InvertedIndex::from_parts(
            config,
            dictionary,
            postings,
            permuterm,
            phonetic,
            DocumentTable::new(),
        )
    }

    #[test]
    fn wildcard_candidates_for_both_backends() {
        for kind in [DictionaryKind::Hash, DictionaryKind::Trie] {
            let index = tiny_index(kind);
            let names = |ids: Vec<TermId>| -> Vec<String> {
                ids.iter()
                    .map(|&id| index.dictionary().text(id).to_string())
                    .collect()
            };
            assert_eq!(
                names(index.wildcard_candidates("sp*e")),
                ["space", "spade", "spice"]
            );
            assert_eq!(names(index.wildcard_candidates("sp*")), ["space", "spade", "spice"]);
            assert_eq!(names(index.wildcard_candidates("*am")), ["jam"]);
        }
    }
}
