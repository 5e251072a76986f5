pub mod core;
pub mod analysis;
pub mod index;
pub mod parallel;
pub mod query;
pub mod search;
pub mod scoring;
pub mod storage;
pub mod corpus;

/*
┌─────────────────────────────────────────────────────────────────────────┐
│                          IRBM ARCHITECTURE                              │
└─────────────────────────────────────────────────────────────────────────┘

  corpus::DocumentSource ──▶ parallel::IndexBuilder
                                  │  rayon fan-out: tokenize per document
                                  │  fold/reduce: token → partial postings
                                  │  finalize: sort + skip pointers
                                  ▼
                         index::InvertedIndex
                          ├─ dictionary  (hash | fst trie)
                          ├─ postings    (skip lists, positional)
                          ├─ permuterm   (rotation → term)
                          ├─ phonetic    (soundex buckets)
                          └─ documents   (zones, languages)
                                  ▲
  query line ──▶ query::QueryParser (nom)
                      │ flags -s/-p/-a/-q
                      ▼
                search::Searcher
                  ├─ search::Evaluator   boolean algebra on skip lists
                  ├─ query::WildcardMatcher  un-stemmed `*` vs stemmed dict
                  ├─ search::CorrectionEngine  edit distance + soundex
                  └─ scoring            wf-idf / tf-idf · zone weights
                                  │
  storage::serializer ◀───────────┘   "IRBM" chunks + LEB128 + CRC
*/
