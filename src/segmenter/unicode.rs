use rust_stemmers::{Algorithm, Stemmer};
use unicode_segmentation::UnicodeSegmentation;

use super::{Segmenter, Token};
use crate::config::TokenizerConfig;

/// Word segmenter built on unicode word boundaries (UAX #29)
pub struct UnicodeSegmenter {
    config: TokenizerConfig,
    stemmer: Option<Stemmer>,
}

impl UnicodeSegmenter {
    /// Create a new segmenter from configuration
    pub fn new(config: &TokenizerConfig) -> Self {
        let stemmer = if config.stem {
            Some(Stemmer::create(Algorithm::English))
        } else {
            None
        };

        Self {
            config: config.clone(),
            stemmer,
        }
    }

    fn normalize(&self, word: &str) -> Option<String> {
        let mut token = if self.config.lowercase {
            word.to_lowercase()
        } else {
            word.to_string()
        };

        let len = token.chars().count();
        if len < self.config.min_token_length || len > self.config.max_token_length {
            return None;
        }

        if let Some(stemmer) = &self.stemmer {
            token = stemmer.stem(&token).into_owned();
        }
        Some(token)
    }
}

impl Segmenter for UnicodeSegmenter {
    fn segment(&self, text: &str) -> Vec<Token> {
        text.unicode_word_indices()
            .filter_map(|(start, word)| {
                self.normalize(word)
                    .map(|token| Token::new(token, start, start + word.len()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(stem: bool, min: usize, max: usize) -> TokenizerConfig {
        TokenizerConfig {
            lowercase: true,
            stem,
            min_token_length: min,
            max_token_length: max,
        }
    }

    #[test]
    fn test_basic_segmentation() {
        let segmenter = UnicodeSegmenter::new(&config(false, 1, 50));
        let tokens = segmenter.segment("Hello World! This is a test.");

        assert_eq!(tokens[0], Token::new("hello", 0, 5));
        assert_eq!(tokens[1], Token::new("world", 6, 11));
        assert_eq!(
            segmenter.tokens("Hello World! This is a test."),
            vec!["hello", "world", "this", "is", "a", "test"]
        );
    }

    #[test]
    fn test_stemming() {
        let segmenter = UnicodeSegmenter::new(&config(true, 1, 50));
        let tokens = segmenter.tokens("running runs");

        assert!(tokens.iter().all(|t| t == "run"));
    }

    #[test]
    fn test_min_max_token_length() {
        let segmenter = UnicodeSegmenter::new(&config(false, 3, 5));
        let tokens = segmenter.tokens("a ab abc abcd abcde abcdef");

        assert_eq!(tokens, vec!["abc", "abcd", "abcde"]);
    }

    #[test]
    fn test_offsets_point_into_input_text() {
        let segmenter = UnicodeSegmenter::new(&config(false, 1, 50));
        let text = "Café déjà vu";
        for token in segmenter.segment(text) {
            assert_eq!(text[token.start..token.end].to_lowercase(), token.text);
        }
    }
}
