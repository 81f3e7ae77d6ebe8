use std::sync::Arc;
use std::thread;

use crossbeam::channel::{unbounded, Receiver, Sender};
use crossbeam::sync::WaitGroup;
use tracing::{debug, error, warn};

use crate::error::{EngineError, Result};
use crate::metrics::EngineMetrics;
use crate::models::{DocumentId, DocumentPostings, IndexType};

use super::inverted::{InvertedIndex, LookupQuery, ShardMatches};

/// Requests handled by an indexer shard, in arrival order
pub enum IndexerRequest {
    Add(DocumentPostings),
    Remove(DocumentId),
    Lookup {
        query: Arc<LookupQuery>,
        reply: Sender<(usize, ShardMatches)>,
    },
    /// Dropped once every earlier request has been applied
    Flush(WaitGroup),
    Shutdown,
}

/// Handle to an indexer shard worker
#[derive(Clone)]
pub struct IndexerShard {
    id: usize,
    tx: Sender<IndexerRequest>,
}

impl IndexerShard {
    /// Spawn the worker thread owning a fresh inverted index
    pub fn spawn(
        id: usize,
        index_type: IndexType,
        metrics: EngineMetrics,
    ) -> Result<(Self, thread::JoinHandle<()>)> {
        let (tx, rx) = unbounded();
        let join = thread::Builder::new()
            .name(format!("indexer-{id}"))
            .spawn(move || run_indexer(id, InvertedIndex::new(index_type), rx, metrics))?;
        debug!(shard = id, ?index_type, "spawned indexer shard");
        Ok((Self { id, tx }, join))
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn send(&self, request: IndexerRequest) -> Result<()> {
        self.tx.send(request).map_err(|_| {
            error!(shard = self.id, "indexer shard is gone");
            EngineError::ShardUnavailable(self.id)
        })
    }
}

fn run_indexer(
    id: usize,
    mut index: InvertedIndex,
    rx: Receiver<IndexerRequest>,
    metrics: EngineMetrics,
) {
    while let Ok(request) = rx.recv() {
        match request {
            IndexerRequest::Add(doc) => {
                let postings = doc.keywords.len();
                let replaced = index.add_document(doc);
                metrics.record_indexed(postings, replaced);
            }
            IndexerRequest::Remove(doc_id) => {
                if index.remove_document(doc_id) {
                    metrics.record_removed();
                }
            }
            IndexerRequest::Lookup { query, reply } => {
                let matches = index.lookup(&query);
                if reply.send((id, matches)).is_err() {
                    warn!(shard = id, "lookup reply dropped, searcher went away");
                }
            }
            IndexerRequest::Flush(wait_group) => drop(wait_group),
            IndexerRequest::Shutdown => break,
        }
    }
    debug!(
        shard = id,
        documents = index.num_documents(),
        keywords = index.num_keywords(),
        "indexer shard stopped"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{KeywordPosting, PostingPayload};
    use crossbeam::channel::bounded;

    fn postings(doc_id: DocumentId, keyword: &str) -> DocumentPostings {
        DocumentPostings {
            doc_id,
            token_length: 1,
            keywords: vec![KeywordPosting {
                keyword: keyword.to_string(),
                payload: PostingPayload::Locations(vec![0]),
            }],
        }
    }

    fn lookup(shard: &IndexerShard, token: &str) -> ShardMatches {
        let (reply, rx) = bounded(1);
        let query = Arc::new(LookupQuery {
            tokens: vec![token.to_string()],
            ..Default::default()
        });
        shard.send(IndexerRequest::Lookup { query, reply }).unwrap();
        let (id, matches) = rx.recv().unwrap();
        assert_eq!(id, shard.id());
        matches
    }

    #[test]
    fn test_requests_apply_in_order() {
        let metrics = EngineMetrics::new().unwrap();
        let (shard, join) = IndexerShard::spawn(3, IndexType::Locations, metrics.clone()).unwrap();

        shard.send(IndexerRequest::Add(postings(1, "rust"))).unwrap();
        shard.send(IndexerRequest::Add(postings(2, "rust"))).unwrap();
        shard.send(IndexerRequest::Remove(1)).unwrap();
        shard.send(IndexerRequest::Remove(99)).unwrap();

        let matches = lookup(&shard, "rust");
        assert_eq!(matches.docs.len(), 1);
        assert_eq!(matches.docs[0].doc_id, 2);
        assert_eq!(matches.stats.doc_count, 1);

        let stats = metrics.snapshot();
        assert_eq!(stats.documents_indexed, 2);
        assert_eq!(stats.documents_removed, 1);
        assert_eq!(stats.total_documents, 1);

        shard.send(IndexerRequest::Shutdown).unwrap();
        join.join().unwrap();
    }

    #[test]
    fn test_flush_waits_for_pending_requests() {
        let metrics = EngineMetrics::new().unwrap();
        let (shard, join) = IndexerShard::spawn(0, IndexType::Frequencies, metrics.clone()).unwrap();

        for doc_id in 0..100 {
            shard.send(IndexerRequest::Add(postings(doc_id, "bulk"))).unwrap();
        }
        let wait_group = WaitGroup::new();
        shard.send(IndexerRequest::Flush(wait_group.clone())).unwrap();
        wait_group.wait();
        assert_eq!(metrics.snapshot().documents_indexed, 100);

        shard.send(IndexerRequest::Shutdown).unwrap();
        join.join().unwrap();
    }

    #[test]
    fn test_send_after_shutdown_fails() {
        let metrics = EngineMetrics::new().unwrap();
        let (shard, join) = IndexerShard::spawn(5, IndexType::DocIds, metrics).unwrap();
        shard.send(IndexerRequest::Shutdown).unwrap();
        join.join().unwrap();

        let err = shard.send(IndexerRequest::Remove(1)).unwrap_err();
        assert!(matches!(err, EngineError::ShardUnavailable(5)));
    }
}
