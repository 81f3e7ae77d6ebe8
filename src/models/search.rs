use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::document::DocumentId;
use crate::ranker::{RankByBm25, ScoringCriteria};

/// Signals computed for one matched document during a search.
///
/// Built per query and handed to the scoring criteria; never stored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexedDocument {
    pub doc_id: DocumentId,
    /// Token proximity distance, -1 when the index carries no locations
    pub token_proximity: i32,
    /// BM25 relevance, 0 when the index carries no frequencies
    pub bm25: f32,
    /// Byte offset of each query token in the tightest arrangement
    pub token_snippet_positions: Vec<usize>,
    /// All byte offsets of each query token in the document
    pub token_locations: Vec<Vec<usize>>,
}

/// Ranking and pagination settings of one search
#[derive(Clone)]
pub struct RankOptions {
    pub output_offset: usize,
    /// Maximum number of returned documents, 0 means unlimited
    pub max_outputs: usize,
    /// Sort ascending instead of descending
    pub reverse_order: bool,
    pub scoring_criteria: Arc<dyn ScoringCriteria>,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            output_offset: 0,
            max_outputs: 0,
            reverse_order: false,
            scoring_criteria: Arc::new(RankByBm25),
        }
    }
}

impl RankOptions {
    pub fn new<C: ScoringCriteria + 'static>(criteria: C) -> Self {
        Self {
            scoring_criteria: Arc::new(criteria),
            ..Default::default()
        }
    }

    pub fn with_output_offset(mut self, offset: usize) -> Self {
        self.output_offset = offset;
        self
    }

    pub fn with_max_outputs(mut self, max_outputs: usize) -> Self {
        self.max_outputs = max_outputs;
        self
    }

    pub fn with_reverse_order(mut self, reverse: bool) -> Self {
        self.reverse_order = reverse;
        self
    }

    /// Window `[offset, offset + max_outputs)` of `total` results, clipped
    pub fn page_bounds(&self, total: usize) -> (usize, usize) {
        let start = self.output_offset.min(total);
        let end = if self.max_outputs == 0 {
            total
        } else {
            start.saturating_add(self.max_outputs).min(total)
        };
        (start, end)
    }
}

impl fmt::Debug for RankOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RankOptions")
            .field("output_offset", &self.output_offset)
            .field("max_outputs", &self.max_outputs)
            .field("reverse_order", &self.reverse_order)
            .field("scoring_criteria", &self.scoring_criteria.name())
            .finish()
    }
}

/// Search request
#[derive(Clone, Debug, Default)]
pub struct SearchRequest {
    /// Query text, segmented with the engine's segmenter
    pub text: String,
    /// Pre-segmented tokens; when non-empty `text` is ignored
    pub tokens: Vec<String>,
    /// Labels every returned document must carry
    pub labels: Vec<String>,
    /// Restrict matching to these documents
    pub doc_ids: Option<HashSet<DocumentId>>,
    /// Overrides the engine's default rank options
    pub rank_options: Option<RankOptions>,
}

impl SearchRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_doc_ids<I: IntoIterator<Item = DocumentId>>(mut self, doc_ids: I) -> Self {
        self.doc_ids = Some(doc_ids.into_iter().collect());
        self
    }

    pub fn with_rank_options(mut self, options: RankOptions) -> Self {
        self.rank_options = Some(options);
        self
    }
}

/// A ranked search hit
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredDocument {
    pub doc_id: DocumentId,
    pub scores: Vec<f32>,
    pub token_snippet_positions: Vec<usize>,
}

/// Search response
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchResponse {
    /// Query tokens in query order
    pub tokens: Vec<String>,
    /// Paginated, ranked hits
    pub docs: Vec<ScoredDocument>,
    /// Number of scored hits before pagination
    pub num_docs: usize,
}

impl SearchResponse {
    pub fn doc_ids(&self) -> Vec<DocumentId> {
        self.docs.iter().map(|d| d.doc_id).collect()
    }
}
