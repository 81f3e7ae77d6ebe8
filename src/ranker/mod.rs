//! Ranker shards and scoring
//!
//! A ranker shard owns the opaque ranking fields of the documents in its
//! partition. During a search it receives the matches of its paired
//! indexer shard, computes BM25 and token proximity, and hands both
//! together with the fields to the [`ScoringCriteria`] of the request.

mod criteria;
mod proximity;
mod scoring;
mod shard;

pub use criteria::{RankByBm25, RankByTokenProximity, ScoringCriteria};
pub use proximity::compute_token_proximity;
pub use scoring::{bm25_score, compute_signals, RankContext};
pub use shard::{Ranker, RankerRequest, RankerShard};
