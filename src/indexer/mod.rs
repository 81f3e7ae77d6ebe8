//! Indexer shards
//!
//! Each shard owns the inverted index of one document-ID partition and is
//! driven by a single worker thread, so mutations and lookups on a shard
//! are applied strictly in arrival order without locking the index.

mod inverted;
mod shard;
mod statistics;

pub use inverted::{InvertedIndex, LookupQuery, MatchedDocument, ShardMatches};
pub use shard::{IndexerRequest, IndexerShard};
pub use statistics::{CorpusStatistics, ShardStatistics};
