//! In-process sharded full-text search engine.
//!
//! Documents are partitioned over indexer/ranker shard pairs, each run by
//! its own worker thread. Searches match conjunctively, score with BM25 and
//! token proximity, and rank through a pluggable [`ScoringCriteria`].

pub mod config;
pub mod engine;
pub mod error;
pub mod indexer;
pub mod metrics;
pub mod models;
pub mod ranker;
pub mod segmenter;

pub use config::{Bm25Params, EngineOptions, IndexerOptions, TokenizerConfig};
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use metrics::{EngineMetrics, EngineStats};
pub use models::*;
pub use ranker::{RankByBm25, RankByTokenProximity, ScoringCriteria};
pub use segmenter::{DictionarySegmenter, Segmenter, StopTokens, Token, UnicodeSegmenter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
