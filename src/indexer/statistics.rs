//! Corpus statistics for BM25 scoring
//!
//! Each indexer shard reports its document count, summed token length and
//! the document frequency of the query tokens. The engine sums those into
//! one [`CorpusStatistics`] so every ranker scores against the same global
//! numbers regardless of how documents are spread over shards.

use std::collections::HashMap;

/// Statistics one indexer shard reports alongside its matches
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShardStatistics {
    /// Number of documents in the shard
    pub doc_count: u64,
    /// Sum of the token lengths of those documents
    pub total_token_length: u64,
    /// Document frequency of each distinct query token within the shard
    pub token_dfs: HashMap<String, u64>,
}

/// Statistics of the whole corpus, summed over shards
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CorpusStatistics {
    pub total_docs: u64,
    pub total_token_length: u64,
    token_dfs: HashMap<String, u64>,
}

impl CorpusStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum the statistics of every shard
    pub fn aggregate<'a, I>(shards: I) -> Self
    where
        I: IntoIterator<Item = &'a ShardStatistics>,
    {
        let mut corpus = Self::new();
        for shard in shards {
            corpus.total_docs += shard.doc_count;
            corpus.total_token_length += shard.total_token_length;
            for (token, df) in &shard.token_dfs {
                *corpus.token_dfs.entry(token.clone()).or_insert(0) += df;
            }
        }
        corpus
    }

    /// Global average document length, 0 for an empty corpus
    pub fn avg_doc_length(&self) -> f32 {
        if self.total_docs == 0 {
            0.0
        } else {
            self.total_token_length as f32 / self.total_docs as f32
        }
    }

    /// Number of documents containing `token` across all shards
    pub fn document_frequency(&self, token: &str) -> u64 {
        self.token_dfs.get(token).copied().unwrap_or(0)
    }
}
