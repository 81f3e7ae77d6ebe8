use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{unbounded, Receiver, Sender};
use crossbeam::sync::WaitGroup;
use tracing::{debug, error, warn};

use crate::error::{EngineError, Result};
use crate::indexer::MatchedDocument;
use crate::models::{DocumentId, Fields, ScoredDocument};

use super::scoring::{compute_signals, RankContext};

/// Ranking fields of one shard's documents
#[derive(Default)]
pub struct Ranker {
    fields: HashMap<DocumentId, Fields>,
}

impl Ranker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or clear the fields of a document
    pub fn set_fields(&mut self, doc_id: DocumentId, fields: Option<Fields>) {
        match fields {
            Some(fields) => {
                self.fields.insert(doc_id, fields);
            }
            None => {
                self.fields.remove(&doc_id);
            }
        }
    }

    pub fn remove_fields(&mut self, doc_id: DocumentId) {
        self.fields.remove(&doc_id);
    }

    pub fn fields(&self, doc_id: DocumentId) -> Option<&Fields> {
        self.fields.get(&doc_id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Score matched documents, dropping those the criteria leaves unscored
    pub fn rank(&self, docs: &[MatchedDocument], ctx: &RankContext) -> Vec<ScoredDocument> {
        docs.iter()
            .filter_map(|doc| {
                let signals = compute_signals(doc, ctx);
                let scores = ctx.criteria.score(&signals, self.fields(doc.doc_id));
                if scores.is_empty() {
                    return None;
                }
                Some(ScoredDocument {
                    doc_id: doc.doc_id,
                    scores,
                    token_snippet_positions: signals.token_snippet_positions,
                })
            })
            .collect()
    }
}

/// Requests handled by a ranker shard, in arrival order
pub enum RankerRequest {
    SetFields {
        doc_id: DocumentId,
        fields: Option<Fields>,
    },
    RemoveFields(DocumentId),
    Rank {
        docs: Vec<MatchedDocument>,
        context: Arc<RankContext>,
        reply: Sender<(usize, Vec<ScoredDocument>)>,
    },
    Flush(WaitGroup),
    Shutdown,
}

/// Handle to a ranker shard worker
#[derive(Clone)]
pub struct RankerShard {
    id: usize,
    tx: Sender<RankerRequest>,
}

impl RankerShard {
    pub fn spawn(id: usize) -> Result<(Self, thread::JoinHandle<()>)> {
        let (tx, rx) = unbounded();
        let join = thread::Builder::new()
            .name(format!("ranker-{id}"))
            .spawn(move || run_ranker(id, rx))?;
        debug!(shard = id, "spawned ranker shard");
        Ok((Self { id, tx }, join))
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn send(&self, request: RankerRequest) -> Result<()> {
        self.tx.send(request).map_err(|_| {
            error!(shard = self.id, "ranker shard is gone");
            EngineError::ShardUnavailable(self.id)
        })
    }
}

fn run_ranker(id: usize, rx: Receiver<RankerRequest>) {
    let mut ranker = Ranker::new();
    while let Ok(request) = rx.recv() {
        match request {
            RankerRequest::SetFields { doc_id, fields } => ranker.set_fields(doc_id, fields),
            RankerRequest::RemoveFields(doc_id) => ranker.remove_fields(doc_id),
            RankerRequest::Rank {
                docs,
                context,
                reply,
            } => {
                let scored = ranker.rank(&docs, &context);
                if reply.send((id, scored)).is_err() {
                    warn!(shard = id, "rank reply dropped, searcher went away");
                }
            }
            RankerRequest::Flush(wait_group) => drop(wait_group),
            RankerRequest::Shutdown => break,
        }
    }
    debug!(shard = id, documents = ranker.len(), "ranker shard stopped");
}
