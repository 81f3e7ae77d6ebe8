use crate::models::{Fields, IndexedDocument};

/// Turns the signals of a matched document plus its ranking fields into a
/// score vector.
///
/// Vectors are compared lexicographically, element 0 first. An empty vector
/// means "not scored" and removes the document from the results, which is
/// also the expected answer when `fields` has a shape the criteria does not
/// understand.
pub trait ScoringCriteria: Send + Sync {
    fn score(&self, doc: &IndexedDocument, fields: Option<&Fields>) -> Vec<f32>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> ScoringCriteria for F
where
    F: Fn(&IndexedDocument, Option<&Fields>) -> Vec<f32> + Send + Sync,
{
    fn score(&self, doc: &IndexedDocument, fields: Option<&Fields>) -> Vec<f32> {
        self(doc, fields)
    }
}

/// Rank by BM25 relevance
#[derive(Clone, Copy, Debug, Default)]
pub struct RankByBm25;

impl ScoringCriteria for RankByBm25 {
    fn score(&self, doc: &IndexedDocument, _fields: Option<&Fields>) -> Vec<f32> {
        vec![doc.bm25]
    }

    fn name(&self) -> &str {
        "bm25"
    }
}

/// Rank by `1 / (proximity + 1)`; documents without proximity are dropped
#[derive(Clone, Copy, Debug, Default)]
pub struct RankByTokenProximity;

impl ScoringCriteria for RankByTokenProximity {
    fn score(&self, doc: &IndexedDocument, _fields: Option<&Fields>) -> Vec<f32> {
        if doc.token_proximity < 0 {
            return Vec::new();
        }
        vec![1.0 / (doc.token_proximity as f32 + 1.0)]
    }

    fn name(&self) -> &str {
        "token_proximity"
    }
}
