//! Text segmentation
//!
//! The engine only sees the [`Segmenter`] trait: a deterministic mapping
//! from text to an ordered sequence of tokens with byte ranges. Two
//! implementations are provided:
//!
//! - [`DictionarySegmenter`]: maximum-probability segmentation over a
//!   frequency dictionary, suited to text without word separators
//! - [`UnicodeSegmenter`]: unicode word boundaries with optional
//!   lowercasing and stemming

mod dictionary;
mod stop_tokens;
mod unicode;

pub use dictionary::{Dictionary, DictionarySegmenter};
pub use stop_tokens::StopTokens;
pub use unicode::UnicodeSegmenter;

/// A token with its byte range `[start, end)` in the segmented text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// Turns text into tokens. Must return identical output for identical input.
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<Token>;

    /// Token texts only, in order
    fn tokens(&self, text: &str) -> Vec<String> {
        self.segment(text).into_iter().map(|t| t.text).collect()
    }
}
