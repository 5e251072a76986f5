use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam::channel::{bounded, Sender};
use rayon::prelude::*;
use tracing::info;

use crate::analysis::analyzer::Analyzer;
use crate::core::config::{Config, StemmerKind};
use crate::core::error::Result;
use crate::core::types::{DocId, DocIdGenerator, Document, Language};
use crate::corpus::DocumentSource;
use crate::index::dictionary::TermDictionary;
use crate::index::documents::{DocumentEntry, DocumentTable};
use crate::index::inverted::InvertedIndex;
use crate::index::posting::{Posting, PostingList};

/// Monotone build progress in [0, 1].
pub struct ProgressGauge {
    done: AtomicU64,
    total: AtomicU64,
}

impl ProgressGauge {
    fn new() -> Self {
        ProgressGauge {
            done: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    fn set_total(&self, total: u64) {
        self.total.store(total.max(1), Ordering::Relaxed);
    }

    fn advance(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fraction(&self) -> f64 {
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        (self.done.load(Ordering::Relaxed) as f64 / total as f64).min(1.0)
    }
}

#[derive(Debug, Clone)]
pub struct BuildStats {
    pub corpus: String,
    pub doc_count: usize,
    pub term_count: usize,
    pub token_count: u64,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub cancelled: bool,
}

/// Parallel corpus indexer: per-document tokenization tasks fan out over the
/// rayon pool, per-thread partial maps are reduced pairwise (no two tasks
/// ever touch the same (token, document) bucket), and a finalize pass sorts
/// posting lists and installs skip pointers.
pub struct IndexBuilder {
    config: Config,
    id_generator: DocIdGenerator,
    progress: Arc<ProgressGauge>,
    cancel: Arc<AtomicBool>,
}

impl IndexBuilder {
    pub fn new(config: Config) -> Self {
        IndexBuilder {
            config,
            id_generator: DocIdGenerator::new(),
            progress: Arc::new(ProgressGauge::new()),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cap the document-id space; exceeding it fails the build with a
    /// `TokenExhaustion` error.
    pub fn with_id_limit(config: Config, limit: u64) -> Self {
        IndexBuilder {
            config,
            id_generator: DocIdGenerator::with_limit(limit),
            progress: Arc::new(ProgressGauge::new()),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn progress(&self) -> Arc<ProgressGauge> {
        Arc::clone(&self.progress)
    }

    /// Cooperative cancellation: flips a flag the document stream checks.
    pub fn cancel_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn build(&self, source: &dyn DocumentSource) -> Result<(InvertedIndex, BuildStats)> {
        let started_at = Utc::now();
        let started = std::time::Instant::now();
        let workers = num_cpus::get();
        info!(corpus = source.name(), workers, "index build started");

        let reporter = ProgressReporter::spawn(
            Arc::clone(&self.progress),
            Duration::from_secs(self.config.progress_interval_secs),
        );

        // ingest the document stream, assigning ids; cancellation stops the
        // stream between documents
        let mut documents: Vec<(DocId, Document)> = Vec::new();
        let mut cancelled = false;
        for document in source.iter() {
            if self.cancel.load(Ordering::Relaxed) {
                cancelled = true;
                break;
            }
            documents.push((self.id_generator.next_id()?, document));
        }
        self.progress.set_total(documents.len() as u64);

        let analyzers = AnalyzerSet::new(&self.config);

        // stage 1: tokenize per document in parallel
        let analyzed: Vec<AnalyzedRecord> = documents
            .par_iter()
            .map(|(doc_id, document)| {
                let analyzer = analyzers.for_language(document.language);
                let analyzed = analyzer.analyze_document(document);

                // partial per-document aggregation: token -> positions
                let mut positions: HashMap<String, Vec<u32>> = HashMap::new();
                for token in &analyzed.tokens {
                    positions
                        .entry(token.text.clone())
                        .or_default()
                        .push(token.position);
                }

                let record = AnalyzedRecord {
                    entry: DocumentEntry {
                        doc_id: *doc_id,
                        title: document.title.clone(),
                        language: document.language,
                        attributes: document.attributes.clone(),
                        zones: analyzed.zones.clone(),
                        token_count: analyzed.token_count(),
                    },
                    positions,
                };
                self.progress.advance();
                record
            })
            .collect();

        // stage 2: global reduce, partial posting maps merged pairwise
        let aggregated: HashMap<String, Vec<Posting>> = analyzed
            .par_iter()
            .fold(HashMap::new, |mut acc: HashMap<String, Vec<Posting>>, record| {
                for (token, positions) in &record.positions {
                    acc.entry(token.clone())
                        .or_default()
                        .push(Posting::new(record.entry.doc_id, positions.clone()));
                }
                acc
            })
            .reduce(HashMap::new, |mut left, right| {
                for (token, mut postings) in right {
                    left.entry(token).or_default().append(&mut postings);
                }
                left
            });

        // stage 3: finalize terms, sort posting lists, install skip pointers
        let token_count: u64 = analyzed
            .iter()
            .map(|record| record.entry.token_count as u64)
            .sum();
        let mut documents_table = DocumentTable::new();
        for record in analyzed {
            documents_table.insert(record.entry);
        }

        let mut term_postings: Vec<(String, PostingList)> = aggregated
            .into_par_iter()
            .map(|(token, postings)| (token, PostingList::from_postings(postings)))
            .collect();
        term_postings.sort_by(|a, b| a.0.cmp(&b.0));

        let dictionary = TermDictionary::build(
            self.config.dictionary,
            term_postings
                .iter()
                .map(|(token, list)| (token.clone(), list.df()))
                .collect(),
        )?;
        let postings: Vec<PostingList> = term_postings.into_iter().map(|(_, list)| list).collect();

        let (permuterm, phonetic) = InvertedIndex::build_auxiliary(&dictionary)?;

        let stats = BuildStats {
            corpus: source.name().to_string(),
            doc_count: documents_table.len(),
            term_count: dictionary.len(),
            token_count,
            started_at,
            duration_ms: started.elapsed().as_millis() as u64,
            cancelled,
        };

        reporter.stop();
        info!(
            docs = stats.doc_count,
            terms = stats.term_count,
            tokens = stats.token_count,
            ms = stats.duration_ms,
            "index build finished"
        );

        let index = InvertedIndex::from_parts(
            self.config.clone(),
            dictionary,
            postings,
            permuterm,
            phonetic,
            documents_table,
        );
        Ok((index, stats))
    }
}

struct AnalyzedRecord {
    entry: DocumentEntry,
    positions: HashMap<String, Vec<u32>>,
}

/// One analyzer per language for the snowball stemmer; a single shared one
/// otherwise.
struct AnalyzerSet {
    by_language: HashMap<Language, Analyzer>,
    fallback: Analyzer,
}

impl AnalyzerSet {
    fn new(config: &Config) -> Self {
        let mut by_language = HashMap::new();
        if config.stemmer == StemmerKind::Snowball {
            for language in [
                Language::English,
                Language::Italian,
                Language::French,
                Language::German,
                Language::Spanish,
                Language::Portuguese,
                Language::Other,
            ] {
                by_language.insert(language, Analyzer::for_language(config, language));
            }
        }
        AnalyzerSet {
            by_language,
            fallback: Analyzer::from_config(config),
        }
    }

    fn for_language(&self, language: Language) -> &Analyzer {
        self.by_language.get(&language).unwrap_or(&self.fallback)
    }
}

/// Observes the gauge at a fixed interval on its own thread until stopped.
struct ProgressReporter {
    stop: Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ProgressReporter {
    fn spawn(gauge: Arc<ProgressGauge>, interval: Duration) -> Self {
        let (stop, stopped) = bounded::<()>(1);
        let handle = thread::spawn(move || loop {
            match stopped.recv_timeout(interval) {
                Ok(()) => break,
                Err(crossbeam::channel::RecvTimeoutError::Timeout) => {
                    info!(progress = gauge.fraction(), "indexing");
                }
                Err(crossbeam::channel::RecvTimeoutError::Disconnected) => break,
            }
        });
        ProgressReporter {
            stop,
            handle: Some(handle),
        }
    }

    fn stop(mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::corpus::InMemoryCorpus;

    fn corpus() -> InMemoryCorpus {
        InMemoryCorpus::from_pairs(
            "movies",
            &[
                ("space jam", "a space movie"),
                ("the sandlot", "a baseball movie"),
            ],
        )
    }

    #[test]
    fn build_produces_sorted_published_postings() {
        let builder = IndexBuilder::new(Config::default());
        let (index, stats) = builder.build(&corpus()).unwrap();
        assert_eq!(stats.doc_count, 2);
        assert!(stats.term_count > 0);
        assert!(!stats.cancelled);

        for (id, info) in index.dictionary().iter_sorted() {
            let postings = index.postings(id);
            assert_eq!(postings.df(), info.df);
            assert!(info.df > 0);
            let ids: Vec<u64> = postings.iter().map(|p| p.doc_id.0).collect();
            let mut sorted = ids.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(ids, sorted);
        }
    }

    #[test]
    fn id_exhaustion_fails_the_build() {
        let builder = IndexBuilder::with_id_limit(Config::default(), 1);
        let err = builder.build(&corpus()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TokenExhaustion);
    }

    #[test]
    fn cancellation_stops_the_stream() {
        let builder = IndexBuilder::new(Config::default());
        builder.cancel_signal().store(true, Ordering::Relaxed);
        let (index, stats) = builder.build(&corpus()).unwrap();
        assert!(stats.cancelled);
        assert_eq!(index.doc_count(), 0);
    }

    #[test]
    fn progress_reaches_one() {
        let builder = IndexBuilder::new(Config::default());
        let gauge = builder.progress();
        builder.build(&corpus()).unwrap();
        assert!((gauge.fraction() - 1.0).abs() < f64::EPSILON);
    }
}
