use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::error::{Error, ErrorKind, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u64);

impl DocId {
    pub fn new(id: u64) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for DocId {
    fn from(id: u64) -> Self {
        DocId(id)
    }
}

/// Monotone document id source owned by a single index builder.
///
/// Ids are never reused, never shared across indexes, and the generator
/// refuses to issue past its limit instead of wrapping.
pub struct DocIdGenerator {
    next: AtomicU64,
    limit: u64,
}

impl DocIdGenerator {
    pub fn new() -> Self {
        Self::with_limit(u64::MAX)
    }

    pub fn with_limit(limit: u64) -> Self {
        DocIdGenerator {
            next: AtomicU64::new(0),
            limit,
        }
    }

    pub fn next_id(&self) -> Result<DocId> {
        let id = self
            .next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                if n >= self.limit {
                    None
                } else {
                    Some(n + 1)
                }
            })
            .map_err(|_| {
                Error::new(
                    ErrorKind::TokenExhaustion,
                    format!("document id space exhausted at {}", self.limit),
                )
            })?;
        Ok(DocId(id))
    }

    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl Default for DocIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Zone rank. Lower ordinal means higher priority and a larger ranking
/// contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ZoneRank {
    Title,
    Summary,
    Body,
}

impl ZoneRank {
    pub fn ordinal(&self) -> u8 {
        match self {
            ZoneRank::Title => 0,
            ZoneRank::Summary => 1,
            ZoneRank::Body => 2,
        }
    }

    pub fn from_ordinal(ord: u8) -> Option<Self> {
        match ord {
            0 => Some(ZoneRank::Title),
            1 => Some(ZoneRank::Summary),
            2 => Some(ZoneRank::Body),
            _ => None,
        }
    }

    /// Ranking weight of one occurrence inside this zone.
    pub fn weight(&self) -> f32 {
        1.0 / (1.0 + self.ordinal() as f32)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub rank: ZoneRank,
    pub text: String,
}

impl Zone {
    pub fn new(rank: ZoneRank, text: impl Into<String>) -> Self {
        Zone {
            rank,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    Italian,
    French,
    German,
    Spanish,
    Portuguese,
    Other,
}

impl Language {
    pub fn id(&self) -> u8 {
        match self {
            Language::English => 0,
            Language::Italian => 1,
            Language::French => 2,
            Language::German => 3,
            Language::Spanish => 4,
            Language::Portuguese => 5,
            Language::Other => 255,
        }
    }

    pub fn from_id(id: u8) -> Self {
        match id {
            0 => Language::English,
            1 => Language::Italian,
            2 => Language::French,
            3 => Language::German,
            4 => Language::Spanish,
            5 => Language::Portuguese,
            _ => Language::Other,
        }
    }
}

/// A parsed document handed over by a corpus collaborator.
///
/// Concrete loaders (movie metadata, test fixtures, ...) all emit this flat
/// record; zones preserve insertion order and their ranks, the language is
/// fixed at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub zones: Vec<Zone>,
    pub language: Language,
    pub attributes: HashMap<String, String>,
}

impl Document {
    pub fn new(title: impl Into<String>, language: Language) -> Self {
        Document {
            title: title.into(),
            zones: Vec::new(),
            language,
            attributes: HashMap::new(),
        }
    }

    pub fn with_zone(mut self, rank: ZoneRank, text: impl Into<String>) -> Self {
        self.zones.push(Zone::new(rank, text));
        self
    }

    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_ids_are_monotone_and_unique() {
        let gen = DocIdGenerator::new();
        let a = gen.next_id().unwrap();
        let b = gen.next_id().unwrap();
        let c = gen.next_id().unwrap();
        assert!(a < b && b < c);
        assert_eq!(gen.issued(), 3);
    }

    #[test]
    fn generator_refuses_overflow() {
        let gen = DocIdGenerator::with_limit(2);
        gen.next_id().unwrap();
        gen.next_id().unwrap();
        let err = gen.next_id().unwrap_err();
        assert_eq!(err.kind, ErrorKind::TokenExhaustion);
    }

    #[test]
    fn zone_rank_weights_decrease_with_ordinal() {
        assert!(ZoneRank::Title.weight() > ZoneRank::Summary.weight());
        assert!(ZoneRank::Summary.weight() > ZoneRank::Body.weight());
    }
}
