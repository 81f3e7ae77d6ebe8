use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::info;

use super::{Segmenter, Token};
use crate::error::{EngineError, Result};

/// Token frequency dictionary.
///
/// File format: one entry per line, `token frequency [part-of-speech]`,
/// whitespace separated. Blank lines and lines starting with `#` are
/// ignored, entries with frequency 0 are skipped.
#[derive(Clone, Debug, Default)]
pub struct Dictionary {
    frequencies: HashMap<String, u64>,
    total_frequency: u64,
    max_token_chars: usize,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a dictionary file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|source| EngineError::DictionaryUnreadable {
                path: path.to_path_buf(),
                source,
            })?;

        let mut dictionary = Self::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let invalid = |reason: String| EngineError::InvalidDictionary {
                path: path.to_path_buf(),
                line: idx + 1,
                reason,
            };
            let mut parts = line.split_whitespace();
            let token = parts
                .next()
                .ok_or_else(|| invalid("missing token".to_string()))?;
            let frequency = parts
                .next()
                .ok_or_else(|| invalid("missing frequency".to_string()))?;
            let frequency: u64 = frequency
                .parse()
                .map_err(|_| invalid(format!("invalid frequency {:?}", frequency)))?;
            dictionary.insert(token, frequency);
        }

        if dictionary.is_empty() {
            return Err(EngineError::EmptyDictionary(path.to_path_buf()));
        }
        info!(
            path = %path.display(),
            tokens = dictionary.len(),
            "loaded segmenter dictionary"
        );
        Ok(dictionary)
    }

    /// Build a dictionary from `(token, frequency)` pairs
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        let mut dictionary = Self::new();
        for (token, frequency) in entries {
            dictionary.insert(token.as_ref(), frequency);
        }
        dictionary
    }

    /// Add or replace an entry; tokens are stored lowercased
    pub fn insert(&mut self, token: &str, frequency: u64) {
        if frequency == 0 || token.is_empty() {
            return;
        }
        let token = token.to_lowercase();
        self.max_token_chars = self.max_token_chars.max(token.chars().count());
        if let Some(previous) = self.frequencies.insert(token, frequency) {
            self.total_frequency = self.total_frequency.saturating_sub(previous);
        }
        self.total_frequency = self.total_frequency.saturating_add(frequency);
    }

    pub fn frequency(&self, token: &str) -> Option<u64> {
        self.frequencies.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Negative log probability of a token with the given frequency
    fn cost(&self, frequency: u64) -> f64 {
        (self.total_frequency.max(1) as f64).ln() - (frequency as f64).ln()
    }

    /// Cost of a character the dictionary does not know, as if seen once
    fn unknown_cost(&self) -> f64 {
        self.cost(1)
    }
}

/// Smallest indivisible piece of text: one character, or a run of ASCII
/// letters and digits
#[derive(Debug)]
struct Unit {
    text: String,
    start: usize,
    end: usize,
}

/// Split text into whitespace-separated runs of units
fn split_runs(text: &str) -> Vec<Vec<Unit>> {
    let mut runs = Vec::new();
    let mut current: Vec<Unit> = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c.is_whitespace() {
            if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
            continue;
        }
        let mut end = start + c.len_utf8();
        if c.is_ascii_alphanumeric() {
            while let Some(&(idx, next)) = chars.peek() {
                if !next.is_ascii_alphanumeric() {
                    break;
                }
                end = idx + next.len_utf8();
                chars.next();
            }
        }
        current.push(Unit {
            text: text[start..end].to_lowercase(),
            start,
            end,
        });
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Maximum-probability segmenter over a [`Dictionary`]
#[derive(Clone, Debug)]
pub struct DictionarySegmenter {
    dictionary: Dictionary,
}

impl DictionarySegmenter {
    pub fn new(dictionary: Dictionary) -> Self {
        Self { dictionary }
    }

    /// Load the dictionary at `path` and build a segmenter from it
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Dictionary::load(path)?))
    }

    fn segment_run(&self, units: &[Unit], out: &mut Vec<Token>) {
        let n = units.len();
        let window = self.dictionary.max_token_chars.max(1);
        let unknown = self.dictionary.unknown_cost();

        // best[j]: cheapest segmentation of units[..j], back[j]: start of its last token
        let mut best = vec![f64::INFINITY; n + 1];
        let mut back = vec![0usize; n + 1];
        best[0] = 0.0;

        for i in 0..n {
            let mut word = String::new();
            for j in i..n.min(i + window) {
                word.push_str(&units[j].text);
                let cost = match self.dictionary.frequency(&word) {
                    Some(frequency) => self.dictionary.cost(frequency),
                    None if j == i => unknown,
                    None => continue,
                };
                let candidate = best[i] + cost;
                if candidate < best[j + 1] {
                    best[j + 1] = candidate;
                    back[j + 1] = i;
                }
            }
        }

        let mut bounds = Vec::new();
        let mut end = n;
        while end > 0 {
            let start = back[end];
            bounds.push((start, end));
            end = start;
        }

        for (start, end) in bounds.into_iter().rev() {
            let text: String = units[start..end].iter().map(|u| u.text.as_str()).collect();
            out.push(Token::new(text, units[start].start, units[end - 1].end));
        }
    }
}

impl Segmenter for DictionarySegmenter {
    fn segment(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        for run in split_runs(text) {
            self.segment_run(&run, &mut tokens);
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn test_segmenter() -> DictionarySegmenter {
        DictionarySegmenter::new(Dictionary::from_entries([
            ("中国", 10),
            ("人口", 10),
            ("十三亿", 10),
            ("有", 10),
        ]))
    }

    #[test]
    fn test_segment_with_byte_offsets() {
        let tokens = test_segmenter().segment("中国有十三亿人口人口");

        let expected = vec![
            Token::new("中国", 0, 6),
            Token::new("有", 6, 9),
            Token::new("十三亿", 9, 18),
            Token::new("人口", 18, 24),
            Token::new("人口", 24, 30),
        ];
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_unknown_characters_fall_back_to_single_tokens() {
        let tokens = test_segmenter().tokens("中国的人口");
        assert_eq!(tokens, vec!["中国", "的", "人口"]);
    }

    #[test]
    fn test_prefers_likelier_segmentation() {
        let segmenter = DictionarySegmenter::new(Dictionary::from_entries([
            ("中国", 100),
            ("中国人", 1),
            ("人口", 100),
        ]));
        assert_eq!(segmenter.tokens("中国人口"), vec!["中国", "人口"]);
    }

    #[test]
    fn test_ascii_words_and_whitespace() {
        let segmenter = DictionarySegmenter::new(Dictionary::from_entries([("rust", 5)]));
        let tokens = segmenter.segment("Rust  v2 中");

        assert_eq!(
            tokens,
            vec![
                Token::new("rust", 0, 4),
                Token::new("v2", 6, 8),
                Token::new("中", 9, 12),
            ]
        );
    }

    #[test]
    fn test_segment_is_deterministic() {
        let segmenter = test_segmenter();
        let text = "中国十三亿人口有人口";
        assert_eq!(segmenter.segment(text), segmenter.segment(text));
        assert!(segmenter.segment("").is_empty());
        assert!(segmenter.segment("   ").is_empty());
    }

    #[test]
    fn test_load_dictionary_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# test dictionary").unwrap();
        writeln!(file, "中国 10 ns").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "人口 10 n").unwrap();
        writeln!(file, "废弃 0").unwrap();

        let dictionary = Dictionary::load(file.path()).unwrap();
        assert_eq!(dictionary.len(), 2);
        assert_eq!(dictionary.frequency("中国"), Some(10));
        assert_eq!(dictionary.frequency("废弃"), None);
    }

    #[test]
    fn test_load_rejects_malformed_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "中国 10").unwrap();
        writeln!(file, "人口 many").unwrap();

        let err = Dictionary::load(file.path()).unwrap_err();
        match err {
            EngineError::InvalidDictionary { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "中国").unwrap();
        assert!(matches!(
            Dictionary::load(file.path()),
            Err(EngineError::InvalidDictionary { .. })
        ));
    }

    #[test]
    fn test_load_missing_or_empty_dictionary() {
        let err = Dictionary::load("/nonexistent/dictionary.txt").unwrap_err();
        assert!(matches!(err, EngineError::DictionaryUnreadable { .. }));
        assert!(err.is_config_error());

        let file = NamedTempFile::new().unwrap();
        assert!(matches!(
            Dictionary::load(file.path()),
            Err(EngineError::EmptyDictionary(_))
        ));
    }

    #[test]
    fn test_insert_replaces_frequency() {
        let mut dictionary = Dictionary::new();
        dictionary.insert("Rust", 3);
        dictionary.insert("rust", 5);
        assert_eq!(dictionary.len(), 1);
        assert_eq!(dictionary.frequency("rust"), Some(5));
        assert_eq!(dictionary.total_frequency, 5);
    }

    #[test]
    fn test_total_frequency_saturates() {
        let mut dictionary = Dictionary::new();
        dictionary.insert("alpha", u64::MAX);
        dictionary.insert("beta", u64::MAX);
        assert_eq!(dictionary.total_frequency, u64::MAX);
        assert!(dictionary.frequency("beta").is_some());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "alpha {} n", u64::MAX).unwrap();
        writeln!(file, "beta {} n", u64::MAX).unwrap();
        let loaded = Dictionary::load(file.path()).unwrap();
        assert_eq!(loaded.total_frequency, u64::MAX);
    }
}
