use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{normalize, Token};

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;

    fn name(&self) -> &str;

    fn clone_box(&self) -> Box<dyn Tokenizer>;
}

/// Standard Unicode tokenizer: word segmentation followed by normalization.
///
/// Positions are assigned per retained token starting at 0; the analyzer
/// shifts them into the document's unified position space.
#[derive(Clone)]
pub struct StandardTokenizer {
    pub max_token_length: usize,
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        StandardTokenizer {
            max_token_length: 255,
        }
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut position = 0u32;

        for word in text.unicode_words() {
            if word.len() > self.max_token_length {
                continue;
            }
            if let Some(normalized) = normalize(word, false) {
                tokens.push(Token::new(normalized, position));
                position += 1;
            }
        }

        tokens
    }

    fn name(&self) -> &str {
        "standard"
    }

    fn clone_box(&self) -> Box<dyn Tokenizer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_advance_per_retained_token() {
        let tokenizer = StandardTokenizer::default();
        let tokens = tokenizer.tokenize("Space Jam -- a basketball movie!");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["space", "jam", "a", "basketball", "movie"]);
        let positions: Vec<u32> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn empty_text_yields_no_tokens() {
        let tokenizer = StandardTokenizer::default();
        assert!(tokenizer.tokenize("  ... !! ").is_empty());
    }
}
