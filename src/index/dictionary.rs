use std::collections::HashMap;

use fst::{IntoStreamer, Map, MapBuilder, Streamer};

use crate::core::config::DictionaryKind;
use crate::core::error::Result;

/// Arena index of a term. Term ids follow lexicographic order of the term
/// strings, so sorted dictionary iteration is id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TermId(pub u32);

impl TermId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Per-term statistics kept in the arena.
#[derive(Debug, Clone)]
pub struct TermInfo {
    pub text: String,
    pub df: u32,
    pub idf: f32,
}

/// Point-lookup backend: a hash map, or an FST automaton (the compacted-trie
/// option that also accelerates prefix scans).
enum Backend {
    Hash(HashMap<String, TermId>),
    Trie(Map<Vec<u8>>),
}

/// The dictionary: every distinct normalized token of the corpus.
pub struct TermDictionary {
    infos: Vec<TermInfo>,
    backend: Backend,
}

impl TermDictionary {
    /// Build from `(term, df)` pairs. Terms are deduplicated and sorted; df
    /// values for duplicate terms are summed.
    pub fn build(kind: DictionaryKind, terms: Vec<(String, u32)>) -> Result<Self> {
        let mut sorted = terms;
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        let mut infos: Vec<TermInfo> = Vec::with_capacity(sorted.len());
        for (text, df) in sorted {
            match infos.last_mut() {
                Some(last) if last.text == text => last.df += df,
                _ => infos.push(TermInfo {
                    text,
                    df,
                    idf: 0.0,
                }),
            }
        }

        let backend = match kind {
            DictionaryKind::Hash => {
                let map = infos
                    .iter()
                    .enumerate()
                    .map(|(i, info)| (info.text.clone(), TermId(i as u32)))
                    .collect();
                Backend::Hash(map)
            }
            DictionaryKind::Trie => {
                let mut builder = MapBuilder::memory();
                for (i, info) in infos.iter().enumerate() {
                    builder.insert(info.text.as_bytes(), i as u64)?;
                }
                Backend::Trie(builder.into_map())
            }
        };

        Ok(TermDictionary { infos, backend })
    }

    pub fn kind(&self) -> DictionaryKind {
        match self.backend {
            Backend::Hash(_) => DictionaryKind::Hash,
            Backend::Trie(_) => DictionaryKind::Trie,
        }
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    pub fn lookup(&self, term: &str) -> Option<TermId> {
        match &self.backend {
            Backend::Hash(map) => map.get(term).copied(),
            Backend::Trie(map) => map.get(term).map(|v| TermId(v as u32)),
        }
    }

    pub fn info(&self, id: TermId) -> &TermInfo {
        &self.infos[id.index()]
    }

    pub fn text(&self, id: TermId) -> &str {
        &self.infos[id.index()].text
    }

    pub fn df(&self, id: TermId) -> u32 {
        self.infos[id.index()].df
    }

    pub fn idf(&self, id: TermId) -> f32 {
        self.infos[id.index()].idf
    }

    /// Iterate the dictionary in sorted order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (TermId, &TermInfo)> {
        self.infos
            .iter()
            .enumerate()
            .map(|(i, info)| (TermId(i as u32), info))
    }

    /// Term ids whose text starts with `prefix`. The trie backend streams the
    /// automaton; the hash backend falls back to a range over the sorted
    /// arena.
    pub fn prefix_terms(&self, prefix: &str) -> Vec<TermId> {
        match &self.backend {
            Backend::Trie(map) => {
                let mut out = Vec::new();
                let mut stream = map.range().ge(prefix.as_bytes()).into_stream();
                while let Some((key, value)) = stream.next() {
                    if !key.starts_with(prefix.as_bytes()) {
                        break;
                    }
                    out.push(TermId(value as u32));
                }
                out
            }
            Backend::Hash(_) => {
                let start = self
                    .infos
                    .partition_point(|info| info.text.as_str() < prefix);
                self.infos[start..]
                    .iter()
                    .take_while(|info| info.text.starts_with(prefix))
                    .enumerate()
                    .map(|(i, _)| TermId((start + i) as u32))
                    .collect()
            }
        }
    }

    /// Cache idf = ln(N / df) once the corpus size is known. Monotonically
    /// decreasing in df.
    pub fn calculate_idf(&mut self, total_docs: usize) {
        let n = total_docs.max(1) as f32;
        for info in &mut self.infos {
            info.idf = (n / info.df.max(1) as f32).ln();
        }
    }
}
