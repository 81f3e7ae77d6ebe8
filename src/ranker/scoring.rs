//! Signal computation for matched documents

use std::sync::Arc;

use crate::config::Bm25Params;
use crate::indexer::{CorpusStatistics, MatchedDocument};
use crate::models::{IndexType, IndexedDocument};

use super::criteria::ScoringCriteria;
use super::proximity::compute_token_proximity;

/// Everything a ranker shard needs to score its share of one search
pub struct RankContext {
    pub index_type: IndexType,
    pub bm25: Bm25Params,
    pub corpus: CorpusStatistics,
    /// Query tokens in query order, aligned with `MatchedDocument::token_payloads`
    pub tokens: Vec<String>,
    pub criteria: Arc<dyn ScoringCriteria>,
}

/// Compute BM25 score for a term in a document
///
/// # Arguments
/// * `tf` - Term frequency in document
/// * `df` - Document frequency (how many documents contain the term)
/// * `total_docs` - Total number of documents in the index
/// * `doc_len` - Length of the document (in tokens)
/// * `avg_doc_len` - Average document length across all documents
/// * `params` - Saturation and length normalization parameters
///
/// # Returns
/// BM25 relevance score
pub fn bm25_score(
    tf: f32,
    df: f32,
    total_docs: f32,
    doc_len: f32,
    avg_doc_len: f32,
    params: &Bm25Params,
) -> f32 {
    // Inverse document frequency
    let idf = ((total_docs - df + 0.5) / (df + 0.5) + 1.0).ln();

    // Length normalization
    let norm = 1.0 - params.b + params.b * (doc_len / avg_doc_len);

    idf * (tf * (params.k1 + 1.0)) / (tf + params.k1 * norm)
}

/// BM25 of a matched document summed over the distinct query tokens
fn document_bm25(doc: &MatchedDocument, ctx: &RankContext) -> f32 {
    let total_docs = ctx.corpus.total_docs as f32;
    let avg_doc_len = ctx.corpus.avg_doc_length();
    if total_docs == 0.0 || avg_doc_len == 0.0 {
        return 0.0;
    }

    let mut score = 0.0;
    for (i, (token, payload)) in ctx.tokens.iter().zip(&doc.token_payloads).enumerate() {
        if ctx.tokens[..i].contains(token) {
            continue;
        }
        let tf = payload.frequency();
        if tf == 0 {
            continue;
        }
        let df = ctx.corpus.document_frequency(token) as f32;
        score += bm25_score(
            tf as f32,
            df,
            total_docs,
            doc.token_length as f32,
            avg_doc_len,
            &ctx.bm25,
        );
    }
    score
}

/// Build the query-scoped signals of one matched document
pub fn compute_signals(doc: &MatchedDocument, ctx: &RankContext) -> IndexedDocument {
    let mut indexed = IndexedDocument {
        doc_id: doc.doc_id,
        token_proximity: -1,
        ..Default::default()
    };

    if ctx.index_type.has_locations() {
        let locations: Vec<&[usize]> = doc.token_payloads.iter().map(|p| p.locations()).collect();
        if let Some((proximity, positions)) =
            compute_token_proximity(ctx.tokens.as_slice(), &locations)
        {
            indexed.token_proximity = proximity;
            indexed.token_snippet_positions = positions;
        }
        indexed.token_locations = locations.iter().map(|starts| starts.to_vec()).collect();
    }

    if ctx.index_type.has_frequencies() {
        indexed.bm25 = document_bm25(doc, ctx);
    }

    indexed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::ShardStatistics;
    use crate::models::PostingPayload;
    use crate::ranker::RankByBm25;

    fn context(index_type: IndexType, tokens: &[&str], corpus: CorpusStatistics) -> RankContext {
        RankContext {
            index_type,
            bm25: Bm25Params::default(),
            corpus,
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            criteria: Arc::new(RankByBm25),
        }
    }

    fn corpus(total_docs: u64, total_len: u64, dfs: &[(&str, u64)]) -> CorpusStatistics {
        CorpusStatistics::aggregate(&[ShardStatistics {
            doc_count: total_docs,
            total_token_length: total_len,
            token_dfs: dfs.iter().map(|(t, df)| (t.to_string(), *df)).collect(),
        }])
    }

    #[test]
    fn test_bm25_score() {
        let params = Bm25Params::default();
        let score = bm25_score(5.0, 10.0, 1000.0, 100.0, 100.0, &params);
        assert!(score > 0.0);

        // Higher TF should give higher score (with same other params)
        let score1 = bm25_score(1.0, 10.0, 1000.0, 100.0, 100.0, &params);
        let score2 = bm25_score(5.0, 10.0, 1000.0, 100.0, 100.0, &params);
        assert!(score2 > score1);

        // Rarer terms weigh more
        let common = bm25_score(1.0, 500.0, 1000.0, 100.0, 100.0, &params);
        let rare = bm25_score(1.0, 5.0, 1000.0, 100.0, 100.0, &params);
        assert!(rare > common);

        // Longer documents are penalized
        let short = bm25_score(2.0, 10.0, 1000.0, 50.0, 100.0, &params);
        let long = bm25_score(2.0, 10.0, 1000.0, 200.0, 100.0, &params);
        assert!(short > long);
    }

    #[test]
    fn test_bm25_monotonic_in_tf() {
        let params = Bm25Params::default();
        let mut previous = 0.0;
        for tf in 1..50 {
            let score = bm25_score(tf as f32, 3.0, 10.0, 8.0, 6.0, &params);
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn test_signals_with_locations() {
        let ctx = context(
            IndexType::Locations,
            &["中国", "人口"],
            corpus(5, 17, &[("中国", 3), ("人口", 5)]),
        );
        let doc = MatchedDocument {
            doc_id: 0,
            token_length: 5,
            token_payloads: vec![
                PostingPayload::Locations(vec![0]),
                PostingPayload::Locations(vec![18, 24]),
            ],
        };

        let signals = compute_signals(&doc, &ctx);
        assert_eq!(signals.doc_id, 0);
        assert_eq!(signals.token_proximity, 12);
        assert_eq!(signals.token_snippet_positions, vec![0, 18]);
        assert_eq!(signals.token_locations, vec![vec![0], vec![18, 24]]);
        assert!(signals.bm25 > 0.0);
    }

    #[test]
    fn test_signals_without_locations() {
        let ctx = context(
            IndexType::Frequencies,
            &["中国", "人口"],
            corpus(5, 17, &[("中国", 3), ("人口", 5)]),
        );
        let doc = MatchedDocument {
            doc_id: 4,
            token_length: 3,
            token_payloads: vec![PostingPayload::Frequency(1), PostingPayload::Frequency(1)],
        };

        let signals = compute_signals(&doc, &ctx);
        assert_eq!(signals.token_proximity, -1);
        assert!(signals.token_snippet_positions.is_empty());
        assert!(signals.token_locations.is_empty());
        assert!(signals.bm25 > 0.0);
    }

    #[test]
    fn test_doc_ids_index_has_no_signals() {
        let ctx = context(IndexType::DocIds, &["a"], corpus(1, 1, &[("a", 1)]));
        let doc = MatchedDocument {
            doc_id: 1,
            token_length: 1,
            token_payloads: vec![PostingPayload::DocId],
        };
        let signals = compute_signals(&doc, &ctx);
        assert_eq!(signals.bm25, 0.0);
        assert_eq!(signals.token_proximity, -1);
    }

    #[test]
    fn test_bm25_counts_repeated_query_token_once() {
        let stats = corpus(4, 12, &[("a", 2)]);
        let doc = MatchedDocument {
            doc_id: 1,
            token_length: 3,
            token_payloads: vec![PostingPayload::Frequency(2)],
        };
        let once = compute_signals(&doc, &context(IndexType::Frequencies, &["a"], stats.clone()));

        let doc = MatchedDocument {
            token_payloads: vec![PostingPayload::Frequency(2), PostingPayload::Frequency(2)],
            ..doc
        };
        let twice = compute_signals(&doc, &context(IndexType::Frequencies, &["a", "a"], stats));
        assert!((once.bm25 - twice.bm25).abs() < 1e-6);
    }

    #[test]
    fn test_empty_corpus_scores_zero() {
        let ctx = context(IndexType::Frequencies, &["a"], CorpusStatistics::new());
        let doc = MatchedDocument {
            doc_id: 1,
            token_length: 0,
            token_payloads: vec![PostingPayload::Frequency(1)],
        };
        assert_eq!(compute_signals(&doc, &ctx).bm25, 0.0);
    }
}
