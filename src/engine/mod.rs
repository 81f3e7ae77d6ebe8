//! Engine: routes mutations to shards and runs searches across them
//!
//! ## Request flow
//!
//! ```text
//! index_document ─┬─> RankerShard[s]  (fields)
//!                 └─> IndexerShard[s] (postings)     s = shard_for(doc_id)
//!
//! search ──> every IndexerShard (lookup) ──> aggregate corpus statistics
//!        ──> paired RankerShard (signals + criteria) ──> merge, sort, paginate
//! ```
//!
//! Fields are enqueued before postings and removed after them, so any
//! document a lookup can see already has its fields on the ranker side.

mod router;

pub use router::shard_for;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam::channel::bounded;
use crossbeam::sync::WaitGroup;
use ordered_float::OrderedFloat;
use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::config::EngineOptions;
use crate::error::{EngineError, Result};
use crate::indexer::{CorpusStatistics, IndexerRequest, IndexerShard, LookupQuery, ShardMatches};
use crate::metrics::{EngineMetrics, EngineStats};
use crate::models::{
    DocumentId, DocumentIndexData, DocumentPostings, IndexType, KeywordPosting, PostingPayload,
    ScoredDocument, SearchRequest, SearchResponse,
};
use crate::ranker::{RankContext, RankerRequest, RankerShard};
use crate::segmenter::{DictionarySegmenter, Segmenter, StopTokens, Token, UnicodeSegmenter};

/// In-process sharded search engine.
///
/// All methods take `&self`; the engine can be shared between threads
/// behind an `Arc` and fed by several producers at once.
pub struct Engine {
    options: EngineOptions,
    segmenter: Arc<dyn Segmenter>,
    stop_tokens: StopTokens,
    indexers: Vec<IndexerShard>,
    rankers: Vec<RankerShard>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    metrics: EngineMetrics,
    closed: AtomicBool,
}

impl Engine {
    /// Build an engine, loading the segmenter dictionary and stop tokens
    /// named in `options` and spawning the shard workers
    pub fn new(options: EngineOptions) -> Result<Self> {
        options.validate()?;
        let segmenter: Arc<dyn Segmenter> = match &options.segmenter_dictionary_path {
            Some(path) => Arc::new(DictionarySegmenter::open(path)?),
            None => Arc::new(UnicodeSegmenter::new(&options.tokenizer)),
        };
        Self::with_segmenter(options, segmenter)
    }

    /// Build an engine around a caller-supplied segmenter.
    ///
    /// `options.segmenter_dictionary_path` and `options.tokenizer` are ignored.
    pub fn with_segmenter(options: EngineOptions, segmenter: Arc<dyn Segmenter>) -> Result<Self> {
        options.validate()?;

        let mut stop_tokens = match &options.stop_token_path {
            Some(path) => StopTokens::load(path)?,
            None => StopTokens::new(),
        };
        if options.english_stop_tokens {
            stop_tokens.extend(StopTokens::english().iter());
        }

        let metrics = EngineMetrics::new()?;
        let num_shards = options.indexer.num_shards;
        let mut indexers = Vec::with_capacity(num_shards);
        let mut rankers = Vec::with_capacity(num_shards);
        let mut workers = Vec::with_capacity(num_shards * 2);
        for id in 0..num_shards {
            let (indexer, join) =
                IndexerShard::spawn(id, options.indexer.index_type, metrics.clone())?;
            indexers.push(indexer);
            workers.push(join);

            let (ranker, join) = RankerShard::spawn(id)?;
            rankers.push(ranker);
            workers.push(join);
        }

        info!(
            num_shards,
            index_type = ?options.indexer.index_type,
            stop_tokens = stop_tokens.len(),
            "search engine started"
        );

        Ok(Self {
            options,
            segmenter,
            stop_tokens,
            indexers,
            rankers,
            workers: Mutex::new(workers),
            metrics,
            closed: AtomicBool::new(false),
        })
    }

    pub fn num_shards(&self) -> usize {
        self.indexers.len()
    }

    pub fn index_type(&self) -> IndexType {
        self.options.indexer.index_type
    }

    pub fn segmenter(&self) -> &dyn Segmenter {
        self.segmenter.as_ref()
    }

    /// Queue a document for indexing, replacing any previous version.
    ///
    /// Returns once the document is enqueued; call [`Engine::flush_index`]
    /// to wait until it is searchable.
    pub fn index_document(&self, doc_id: DocumentId, data: DocumentIndexData) -> Result<()> {
        self.metrics.indexing_requests.inc();

        let tokens = self.segmenter.segment(&data.content);
        let postings = document_postings(doc_id, &tokens, &data.labels, &self.stop_tokens);

        let shard = shard_for(doc_id, self.num_shards());
        self.rankers[shard].send(RankerRequest::SetFields {
            doc_id,
            fields: data.fields,
        })?;
        self.indexers[shard].send(IndexerRequest::Add(postings))
    }

    /// Queue removal of a document. Unknown IDs are ignored.
    pub fn remove_document(&self, doc_id: DocumentId) -> Result<()> {
        self.metrics.removal_requests.inc();

        let shard = shard_for(doc_id, self.num_shards());
        self.indexers[shard].send(IndexerRequest::Remove(doc_id))?;
        self.rankers[shard].send(RankerRequest::RemoveFields(doc_id))
    }

    /// Block until every request queued before this call has been applied
    pub fn flush_index(&self) -> Result<()> {
        let wait_group = WaitGroup::new();
        for indexer in &self.indexers {
            indexer.send(IndexerRequest::Flush(wait_group.clone()))?;
        }
        for ranker in &self.rankers {
            ranker.send(RankerRequest::Flush(wait_group.clone()))?;
        }
        wait_group.wait();
        debug!(num_shards = self.num_shards(), "flushed index");
        Ok(())
    }

    /// Run a ranked conjunctive search
    pub fn search(&self, request: SearchRequest) -> Result<SearchResponse> {
        let start = Instant::now();

        let tokens = self.query_tokens(&request);
        if tokens.is_empty() && request.labels.is_empty() {
            self.metrics.record_search(0, start.elapsed().as_secs_f64());
            return Ok(SearchResponse::default());
        }

        let rank_options = request
            .rank_options
            .unwrap_or_else(|| self.options.default_rank_options.clone());
        let query = Arc::new(LookupQuery {
            tokens: tokens.clone(),
            labels: request.labels,
            doc_ids: request.doc_ids,
        });

        let matches = self.lookup(query)?;
        let corpus = CorpusStatistics::aggregate(matches.iter().map(|m| &m.stats));
        let context = Arc::new(RankContext {
            index_type: self.index_type(),
            bm25: self.options.indexer.bm25,
            corpus,
            tokens: tokens.clone(),
            criteria: rank_options.scoring_criteria.clone(),
        });

        let mut scored = self.rank(matches, context)?;
        sort_scored(&mut scored, rank_options.reverse_order);

        let num_docs = scored.len();
        let (page_start, page_end) = rank_options.page_bounds(num_docs);
        let docs: Vec<ScoredDocument> = scored
            .into_iter()
            .skip(page_start)
            .take(page_end - page_start)
            .collect();

        let elapsed = start.elapsed();
        self.metrics.record_search(num_docs, elapsed.as_secs_f64());
        debug!(
            ?tokens,
            num_docs,
            returned = docs.len(),
            criteria = rank_options.scoring_criteria.name(),
            elapsed_us = elapsed.as_micros() as u64,
            "search finished"
        );

        Ok(SearchResponse {
            tokens,
            docs,
            num_docs,
        })
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn stats(&self) -> EngineStats {
        self.metrics.snapshot()
    }

    /// Stop every shard worker after it drains its queue.
    ///
    /// Later calls on the engine fail with [`EngineError::ShardUnavailable`].
    pub fn close(&self) {
        if self.closed.swap(true, AtomicOrdering::SeqCst) {
            return;
        }
        for indexer in &self.indexers {
            let _ = indexer.send(IndexerRequest::Shutdown);
        }
        for ranker in &self.rankers {
            let _ = ranker.send(RankerRequest::Shutdown);
        }
        for join in self.workers.lock().drain(..) {
            if join.join().is_err() {
                error!("shard worker panicked");
            }
        }
        info!("search engine closed");
    }

    /// Query tokens in query order with stop tokens removed
    fn query_tokens(&self, request: &SearchRequest) -> Vec<String> {
        let tokens = if request.tokens.is_empty() {
            self.segmenter.tokens(&request.text)
        } else {
            request.tokens.clone()
        };
        tokens
            .into_iter()
            .filter(|token| !self.stop_tokens.is_stop_token(token))
            .collect()
    }

    /// Broadcast a lookup and wait for exactly one reply per indexer shard
    fn lookup(&self, query: Arc<LookupQuery>) -> Result<Vec<ShardMatches>> {
        let (reply, replies) = bounded(self.num_shards());
        for indexer in &self.indexers {
            indexer.send(IndexerRequest::Lookup {
                query: query.clone(),
                reply: reply.clone(),
            })?;
        }
        drop(reply);

        let mut matches: Vec<Option<ShardMatches>> = vec![None; self.num_shards()];
        for _ in 0..self.num_shards() {
            match replies.recv() {
                Ok((shard, shard_matches)) => matches[shard] = Some(shard_matches),
                Err(_) => return Err(missing_shard(&matches)),
            }
        }
        Ok(matches.into_iter().flatten().collect())
    }

    /// Score each shard's matches on its paired ranker and merge the results
    fn rank(
        &self,
        matches: Vec<ShardMatches>,
        context: Arc<RankContext>,
    ) -> Result<Vec<ScoredDocument>> {
        let (reply, replies) = bounded(self.num_shards());
        // Shards without matches are skipped and count as answered
        let mut answered: Vec<Option<()>> = Vec::with_capacity(self.num_shards());
        for (shard, shard_matches) in matches.into_iter().enumerate() {
            if shard_matches.docs.is_empty() {
                answered.push(Some(()));
                continue;
            }
            self.rankers[shard].send(RankerRequest::Rank {
                docs: shard_matches.docs,
                context: context.clone(),
                reply: reply.clone(),
            })?;
            answered.push(None);
        }
        drop(reply);

        let pending = answered.iter().filter(|a| a.is_none()).count();
        let mut scored = Vec::new();
        for _ in 0..pending {
            match replies.recv() {
                Ok((shard, shard_scored)) => {
                    answered[shard] = Some(());
                    scored.extend(shard_scored);
                }
                Err(_) => return Err(missing_shard(&answered)),
            }
        }
        Ok(scored)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.close();
    }
}

/// First shard that did not answer a broadcast
fn missing_shard<T>(replies: &[Option<T>]) -> EngineError {
    let shard = replies.iter().position(Option::is_none).unwrap_or(0);
    error!(shard, "shard stopped during a search");
    EngineError::ShardUnavailable(shard)
}

/// Group segmented tokens into one posting per distinct keyword.
///
/// Stop tokens are skipped but still count toward the document length.
/// Labels become keywords without locations unless the text already
/// produced the same keyword.
fn document_postings(
    doc_id: DocumentId,
    tokens: &[Token],
    labels: &[String],
    stop_tokens: &StopTokens,
) -> DocumentPostings {
    let mut keywords: Vec<KeywordPosting> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for token in tokens {
        if stop_tokens.is_stop_token(&token.text) {
            continue;
        }
        let slot = *slots.entry(token.text.as_str()).or_insert_with(|| {
            keywords.push(KeywordPosting {
                keyword: token.text.clone(),
                payload: PostingPayload::Locations(Vec::new()),
            });
            keywords.len() - 1
        });
        if let PostingPayload::Locations(starts) = &mut keywords[slot].payload {
            starts.push(token.start);
        }
    }

    for label in labels {
        if !slots.contains_key(label.as_str()) {
            slots.insert(label.as_str(), keywords.len());
            keywords.push(KeywordPosting {
                keyword: label.clone(),
                payload: PostingPayload::DocId,
            });
        }
    }

    DocumentPostings {
        doc_id,
        token_length: tokens.len() as u32,
        keywords,
    }
}

/// Sort by score vector, descending unless `reverse`; ties by ascending ID
fn sort_scored(docs: &mut [ScoredDocument], reverse: bool) {
    docs.sort_by(|a, b| {
        let a_scores = a.scores.iter().map(|&s| OrderedFloat(s));
        let b_scores = b.scores.iter().map(|&s| OrderedFloat(s));
        let by_score = if reverse {
            a_scores.cmp(b_scores)
        } else {
            b_scores.cmp(a_scores)
        };
        match by_score {
            Ordering::Equal => a.doc_id.cmp(&b.doc_id),
            other => other,
        }
    });
}
