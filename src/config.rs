use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{EngineError, Result};
use crate::models::{IndexType, RankOptions};

/// BM25 parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term frequency saturation parameter
    pub k1: f32,
    /// Length normalization parameter
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Indexer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerOptions {
    pub index_type: IndexType,
    pub num_shards: usize,
    pub bm25: Bm25Params,
}

impl Default for IndexerOptions {
    fn default() -> Self {
        Self {
            index_type: IndexType::Frequencies,
            num_shards: 1,
            bm25: Bm25Params::default(),
        }
    }
}

/// Configuration of the unicode word segmenter used when no dictionary is set
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub lowercase: bool,
    pub stem: bool,
    pub min_token_length: usize,
    pub max_token_length: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            stem: false,
            min_token_length: 1,
            max_token_length: 50,
        }
    }
}

/// Engine configuration
#[derive(Clone, Debug, Default)]
pub struct EngineOptions {
    /// Segmenter dictionary; the unicode word segmenter is used when unset
    pub segmenter_dictionary_path: Option<PathBuf>,
    /// File with one stop token per line
    pub stop_token_path: Option<PathBuf>,
    /// Add the built-in English stop token list
    pub english_stop_tokens: bool,
    pub tokenizer: TokenizerConfig,
    pub default_rank_options: RankOptions,
    pub indexer: IndexerOptions,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dictionary(mut self, path: impl Into<PathBuf>) -> Self {
        self.segmenter_dictionary_path = Some(path.into());
        self
    }

    pub fn with_stop_tokens(mut self, path: impl Into<PathBuf>) -> Self {
        self.stop_token_path = Some(path.into());
        self
    }

    pub fn with_english_stop_tokens(mut self, enabled: bool) -> Self {
        self.english_stop_tokens = enabled;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: TokenizerConfig) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_rank_options(mut self, options: RankOptions) -> Self {
        self.default_rank_options = options;
        self
    }

    pub fn with_index_type(mut self, index_type: IndexType) -> Self {
        self.indexer.index_type = index_type;
        self
    }

    /// Set the number of indexer/ranker shard pairs
    pub fn with_num_shards(mut self, num_shards: usize) -> Self {
        self.indexer.num_shards = num_shards;
        self
    }

    pub fn with_bm25(mut self, params: Bm25Params) -> Self {
        self.indexer.bm25 = params;
        self
    }

    /// Reject option combinations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.indexer.num_shards == 0 {
            return Err(EngineError::InvalidConfig(
                "num_shards must be at least 1".to_string(),
            ));
        }
        let bm25 = &self.indexer.bm25;
        if !bm25.k1.is_finite() || bm25.k1 < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "bm25 k1 must be a non-negative number, got {}",
                bm25.k1
            )));
        }
        if !(0.0..=1.0).contains(&bm25.b) {
            return Err(EngineError::InvalidConfig(format!(
                "bm25 b must be within [0, 1], got {}",
                bm25.b
            )));
        }
        if self.tokenizer.min_token_length > self.tokenizer.max_token_length {
            return Err(EngineError::InvalidConfig(format!(
                "min_token_length {} exceeds max_token_length {}",
                self.tokenizer.min_token_length, self.tokenizer.max_token_length
            )));
        }
        Ok(())
    }
}
