use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::stemmer::StemmerFilter;
use crate::analysis::filters::stopword::StopWordFilter;
use crate::analysis::token::{normalize, Token};
use crate::analysis::tokenizer::{StandardTokenizer, Tokenizer};
use crate::core::config::{Config, StemmerKind};
use crate::core::types::{Document, Language, ZoneRank};

/// A zone's slice of the unified position space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneSpan {
    pub rank: ZoneRank,
    pub start: u32,
    pub len: u32,
}

impl ZoneSpan {
    pub fn contains(&self, position: u32) -> bool {
        position >= self.start && position < self.start + self.len
    }
}

/// Tokenized document: tokens with unified positions plus the recorded zone
/// boundaries, so phrase checks and zone weighting can map positions back to
/// zones.
#[derive(Debug, Clone)]
pub struct AnalyzedDocument {
    pub tokens: Vec<Token>,
    pub zones: Vec<ZoneSpan>,
}

impl AnalyzedDocument {
    pub fn token_count(&self) -> u32 {
        self.tokens.len() as u32
    }

    pub fn rank_at(&self, position: u32) -> Option<ZoneRank> {
        self.zones
            .iter()
            .find(|span| span.contains(position))
            .map(|span| span.rank)
    }
}

/// Text analysis pipeline: tokenize, drop stop words, stem.
///
/// The same pipeline runs at index and query time; the stemmer is fixed for
/// the lifetime of the index.
pub struct Analyzer {
    pub tokenizer: Box<dyn Tokenizer>,
    pub stop_words: Option<StopWordFilter>,
    pub stemmer: StemmerFilter,
}

impl Analyzer {
    pub fn from_config(config: &Config) -> Self {
        Self::for_language(config, config.snowball_language)
    }

    /// Analyzer for a specific document language. With the snowball stemmer
    /// the algorithm follows the language; porter and none ignore it.
    pub fn for_language(config: &Config, language: Language) -> Self {
        Analyzer {
            tokenizer: Box::new(StandardTokenizer::default()),
            stop_words: if config.exclude_stop_words {
                Some(StopWordFilter::english())
            } else {
                None
            },
            stemmer: StemmerFilter::new(config.stemmer, language),
        }
    }

    pub fn stemmer_kind(&self) -> StemmerKind {
        self.stemmer.kind
    }

    /// Stem one already-normalized token.
    pub fn stem(&self, token: &str) -> String {
        self.stemmer.stem(token)
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words
            .as_ref()
            .map(|f| f.contains(token))
            .unwrap_or(false)
    }

    /// Run the full pipeline over free text. Positions are renumbered after
    /// filtering so they advance by one per retained token.
    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = self.tokenizer.tokenize(text);
        if let Some(stop_words) = &self.stop_words {
            tokens = stop_words.filter(tokens);
        }
        tokens = self.stemmer.filter(tokens);
        for (i, token) in tokens.iter_mut().enumerate() {
            token.position = i as u32;
        }
        tokens
    }

    /// Tokenize a document zone by zone into one unified position space.
    /// Each zone occupies a contiguous range and its boundary is recorded.
    pub fn analyze_document(&self, document: &Document) -> AnalyzedDocument {
        let mut tokens = Vec::new();
        let mut zones = Vec::with_capacity(document.zones.len());
        let mut offset = 0u32;

        for zone in &document.zones {
            let mut zone_tokens = self.analyze(&zone.text);
            let len = zone_tokens.len() as u32;
            for token in &mut zone_tokens {
                token.position += offset;
            }
            zones.push(ZoneSpan {
                rank: zone.rank,
                start: offset,
                len,
            });
            tokens.extend(zone_tokens);
            offset += len;
        }

        AnalyzedDocument { tokens, zones }
    }

    /// Normalize and stem a single query term. Wildcard terms keep their `*`
    /// and are left un-stemmed; the compatibility matcher reconciles them
    /// against the stemmed dictionary.
    pub fn analyze_query_term(&self, raw: &str) -> Option<String> {
        let normalized = normalize(raw, true)?;
        if normalized.contains('*') {
            Some(normalized)
        } else {
            Some(self.stem(&normalized))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Zone;

    fn porter_config() -> Config {
        Config::default()
    }

    #[test]
    fn document_positions_are_unified_across_zones() {
        let analyzer = Analyzer::from_config(&porter_config());
        let doc = Document::new("Space Jam", Language::English)
            .with_zone(ZoneRank::Title, "Space Jam")
            .with_zone(ZoneRank::Body, "a basketball movie");
        let analyzed = analyzer.analyze_document(&doc);

        assert_eq!(analyzed.zones.len(), 2);
        assert_eq!(analyzed.zones[0].start, 0);
        assert_eq!(analyzed.zones[0].len, 2);
        assert_eq!(analyzed.zones[1].start, 2);
        let positions: Vec<u32> = analyzed.tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, [0, 1, 2, 3, 4]);
        assert_eq!(analyzed.rank_at(0), Some(ZoneRank::Title));
        assert_eq!(analyzed.rank_at(4), Some(ZoneRank::Body));
    }

    #[test]
    fn stop_words_removed_before_stemming_and_positions_renumbered() {
        let mut config = porter_config();
        config.exclude_stop_words = true;
        let analyzer = Analyzer::from_config(&config);
        let tokens = analyzer.analyze("the spaces in the sandlot");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["space", "sandlot"]);
        let positions: Vec<u32> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, [0, 1]);
    }

    #[test]
    fn query_terms_follow_the_index_pipeline() {
        let analyzer = Analyzer::from_config(&porter_config());
        assert_eq!(analyzer.analyze_query_term("Movies!"), Some("movi".into()));
        // wildcard terms stay un-stemmed
        assert_eq!(analyzer.analyze_query_term("sp*E"), Some("sp*e".into()));
        assert_eq!(analyzer.analyze_query_term("!!"), None);
    }
}
