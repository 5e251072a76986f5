use rust_stemmers::{Algorithm, Stemmer};

use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;
use crate::core::config::StemmerKind;
use crate::core::error::{Error, ErrorKind};
use crate::core::types::Language;

/// Stemming stage. `algorithm: None` is the no-op downgrade used when the
/// configured stemmer is unavailable for a language; the downgrade is logged
/// once at construction.
pub struct StemmerFilter {
    pub kind: StemmerKind,
    pub algorithm: Option<Algorithm>,
}

impl StemmerFilter {
    pub fn new(kind: StemmerKind, language: Language) -> Self {
        let algorithm = match kind {
            StemmerKind::None => None,
            // Porter stems everything with the English (Porter2) rules.
            StemmerKind::Porter => Some(Algorithm::English),
            StemmerKind::Snowball => match snowball_algorithm(language) {
                Some(algorithm) => Some(algorithm),
                None => {
                    // recoverable: downgrade to the no-op stemmer
                    Error::new(
                        ErrorKind::StemmerUnavailable,
                        format!("no snowball stemmer for {:?}, stemming disabled", language),
                    )
                    .recover();
                    None
                }
            },
        };
        StemmerFilter { kind, algorithm }
    }

    /// Stem a single token. Deterministic for a fixed (kind, language).
    pub fn stem(&self, token: &str) -> String {
        match self.algorithm {
            Some(algorithm) => Stemmer::create(algorithm).stem(token).to_string(),
            None => token.to_string(),
        }
    }
}

fn snowball_algorithm(language: Language) -> Option<Algorithm> {
    match language {
        Language::English => Some(Algorithm::English),
        Language::Italian => Some(Algorithm::Italian),
        Language::French => Some(Algorithm::French),
        Language::German => Some(Algorithm::German),
        Language::Spanish => Some(Algorithm::Spanish),
        Language::Portuguese => Some(Algorithm::Portuguese),
        Language::Other => None,
    }
}

impl TokenFilter for StemmerFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        let stemmer = match self.algorithm {
            Some(algorithm) => Stemmer::create(algorithm),
            None => return tokens,
        };

        tokens
            .into_iter()
            .map(|mut token| {
                token.text = stemmer.stem(&token.text).to_string();
                token
            })
            .collect()
    }

    fn name(&self) -> &str {
        "stemmer"
    }

    fn clone_box(&self) -> Box<dyn TokenFilter> {
        Box::new(StemmerFilter {
            kind: self.kind,
            algorithm: self.algorithm,
        })
    }
}
