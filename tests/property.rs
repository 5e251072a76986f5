//! Property-based invariants over randomly generated corpora: posting order,
//! skip-pointer layout, permuterm completeness, soundex partition, analysis
//! idempotence and the boolean algebra laws.

use proptest::prelude::*;

use irbm::analysis::soundex::soundex;
use irbm::analysis::token::normalize;
use irbm::core::config::{Config, StemmerKind};
use irbm::core::types::{DocId, Document, Language, ZoneRank};
use irbm::corpus::InMemoryCorpus;
use irbm::index::inverted::InvertedIndex;
use irbm::index::permuterm::rotations_of;
use irbm::parallel::builder::IndexBuilder;
use irbm::query::ast::QueryNode;
use irbm::search::evaluator::Evaluator;
use irbm::search::searcher::Searcher;
use irbm::storage::serializer::{load, save};

const VOCAB: &[&str] = &[
    "space", "jam", "sandlot", "movie", "spice", "rock", "ball", "game", "star", "dust",
];

fn word() -> impl Strategy<Value = String> {
    proptest::sample::select(VOCAB).prop_map(str::to_string)
}

fn corpus_strategy() -> impl Strategy<Value = Vec<Vec<String>>> {
    proptest::collection::vec(proptest::collection::vec(word(), 1..12), 1..7)
}

fn build_index(docs: &[Vec<String>]) -> InvertedIndex {
    let documents: Vec<Document> = docs
        .iter()
        .enumerate()
        .map(|(i, tokens)| {
            Document::new(format!("doc {}", i), Language::English)
                .with_zone(ZoneRank::Title, format!("doc {}", i))
                .with_zone(ZoneRank::Body, tokens.join(" "))
        })
        .collect();
    let corpus = InMemoryCorpus::new("property", documents);
    let mut config = Config::default();
    config.stemmer = StemmerKind::None;
    let (index, _) = IndexBuilder::new(config).build(&corpus).unwrap();
    index
}

fn leaf() -> impl Strategy<Value = QueryNode> {
    prop_oneof![
        4 => word().prop_map(QueryNode::Term),
        1 => proptest::collection::vec(word(), 2..4).prop_map(QueryNode::Phrase),
        1 => word().prop_map(|w| {
            let mut pattern = w;
            let split = pattern.len() / 2;
            pattern.insert(split, '*');
            QueryNode::Wildcard(pattern)
        }),
    ]
}

/// Boolean trees of up to five leaves.
fn tree() -> impl Strategy<Value = QueryNode> {
    leaf().prop_recursive(3, 5, 2, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 2..3).prop_map(QueryNode::And),
            proptest::collection::vec(inner.clone(), 2..3).prop_map(QueryNode::Or),
            inner.prop_map(|n| QueryNode::Not(Box::new(n))),
        ]
    })
}

fn eval(index: &InvertedIndex, node: &QueryNode) -> Vec<DocId> {
    Evaluator::new(index).evaluate(node).unwrap().into_vec()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn postings_are_strictly_ascending_with_df(docs in corpus_strategy()) {
        let index = build_index(&docs);
        for (id, info) in index.dictionary().iter_sorted() {
            let postings = index.postings(id);
            prop_assert!(info.df > 0);
            prop_assert_eq!(postings.df(), info.df);
            let ids: Vec<u64> = postings.iter().map(|p| p.doc_id.0).collect();
            prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
            for posting in postings.iter() {
                prop_assert!(posting.positions.windows(2).all(|w| w[0] < w[1]));
                prop_assert!(posting.term_freq() > 0);
            }
        }
    }

    #[test]
    fn skip_pointers_follow_the_sqrt_formula(docs in corpus_strategy()) {
        let index = build_index(&docs);
        for (id, _) in index.dictionary().iter_sorted() {
            let list = index.postings(id).skip_list();
            let p = list.len();
            let expected: Vec<usize> = if p < 2 {
                vec![]
            } else {
                let f = (p as f64).sqrt().ceil() as usize;
                let s = p / f;
                (0..f).map(|i| i * s).filter(|&i| i < p - 1).collect()
            };
            let actual: Vec<usize> = (0..p).filter(|&i| list.skip_target(i).is_some()).collect();
            prop_assert_eq!(actual, expected);
            prop_assert!(list.skip_target(p.saturating_sub(1)).is_none());
        }
    }

    #[test]
    fn permuterm_holds_every_rotation(docs in corpus_strategy()) {
        let index = build_index(&docs);
        let pairs = index.permuterm().iter();
        for (id, info) in index.dictionary().iter_sorted() {
            let mut recorded: Vec<String> = pairs
                .iter()
                .filter(|(_, term)| *term == id)
                .map(|(rotation, _)| rotation.clone())
                .collect();
            recorded.sort();
            let mut expected = rotations_of(&info.text);
            expected.sort();
            prop_assert_eq!(recorded, expected);
        }
    }

    #[test]
    fn soundex_buckets_partition_the_dictionary(docs in corpus_strategy()) {
        let index = build_index(&docs);
        let mut bucketed: Vec<u32> = Vec::new();
        for (code, ids) in index.phonetic().iter() {
            for id in ids {
                prop_assert_eq!(&soundex(index.dictionary().text(*id)).unwrap(), code);
                bucketed.push(id.0);
            }
        }
        bucketed.sort();
        let all: Vec<u32> = (0..index.term_count() as u32).collect();
        prop_assert_eq!(bucketed, all);
    }

    #[test]
    fn normalization_is_idempotent(raw in "\\PC{0,24}") {
        if let Some(once) = normalize(&raw, true) {
            prop_assert_eq!(normalize(&once, true), Some(once.clone()));
        }
    }

    #[test]
    fn stemming_is_deterministic(word in "[a-z]{1,16}") {
        use irbm::analysis::filters::stemmer::StemmerFilter;
        let a = StemmerFilter::new(StemmerKind::Porter, Language::English);
        let b = StemmerFilter::new(StemmerKind::Porter, Language::English);
        prop_assert_eq!(a.stem(&word), b.stem(&word));
    }

    #[test]
    fn boolean_algebra_laws(docs in corpus_strategy(), a in tree(), b in tree(), c in tree()) {
        let index = build_index(&docs);
        let universe: Vec<DocId> = index.universe().into_vec();

        // A ∧ B = B ∧ A
        prop_assert_eq!(
            eval(&index, &QueryNode::And(vec![a.clone(), b.clone()])),
            eval(&index, &QueryNode::And(vec![b.clone(), a.clone()]))
        );

        // A ∨ ¬A = U
        prop_assert_eq!(
            eval(&index, &QueryNode::Or(vec![
                a.clone(),
                QueryNode::Not(Box::new(a.clone()))
            ])),
            universe
        );

        // ¬¬A = A
        prop_assert_eq!(
            eval(&index, &QueryNode::Not(Box::new(QueryNode::Not(Box::new(a.clone()))))),
            eval(&index, &a)
        );

        // A ∧ (B ∨ C) = (A ∧ B) ∨ (A ∧ C)
        prop_assert_eq!(
            eval(&index, &QueryNode::And(vec![
                a.clone(),
                QueryNode::Or(vec![b.clone(), c.clone()])
            ])),
            eval(&index, &QueryNode::Or(vec![
                QueryNode::And(vec![a.clone(), b.clone()]),
                QueryNode::And(vec![a.clone(), c.clone()]),
            ]))
        );
    }

    #[test]
    fn phrases_are_subsets_of_their_and(docs in corpus_strategy(), words in proptest::collection::vec(word(), 2..4)) {
        let index = build_index(&docs);
        let phrase = eval(&index, &QueryNode::Phrase(words.clone()));
        let and = eval(
            &index,
            &QueryNode::And(words.into_iter().map(QueryNode::Term).collect()),
        );
        prop_assert!(phrase.iter().all(|d| and.contains(d)));
    }

    #[test]
    fn round_trip_answers_identically(docs in corpus_strategy(), q in tree()) {
        let index = build_index(&docs);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("property.irbm");
        save(&index, &path).unwrap();
        let reopened = load(&path, &Config::default()).unwrap();

        prop_assert_eq!(eval(&index, &q), eval(&reopened, &q));
        let before = Searcher::new(&index).evaluate_tree(&q).unwrap();
        let after = Searcher::new(&reopened).evaluate_tree(&q).unwrap();
        prop_assert_eq!(before.doc_ids(), after.doc_ids());
    }
}
