use std::collections::{HashMap, HashSet};

use crate::models::{DocumentId, DocumentPostings, IndexType, Posting, PostingList, PostingPayload};

use super::statistics::ShardStatistics;

/// Lookup broadcast to every indexer shard during a search
#[derive(Clone, Debug, Default)]
pub struct LookupQuery {
    /// Query tokens in query order, duplicates kept
    pub tokens: Vec<String>,
    /// Labels every match must carry
    pub labels: Vec<String>,
    /// Restrict matches to these documents
    pub doc_ids: Option<HashSet<DocumentId>>,
}

/// A document containing every query token and label
#[derive(Clone, Debug, PartialEq)]
pub struct MatchedDocument {
    pub doc_id: DocumentId,
    pub token_length: u32,
    /// Payload of each query token, aligned with `LookupQuery::tokens`
    pub token_payloads: Vec<PostingPayload>,
}

/// Reply of one indexer shard to a lookup
#[derive(Clone, Debug, Default)]
pub struct ShardMatches {
    /// Matches in ascending document ID order
    pub docs: Vec<MatchedDocument>,
    pub stats: ShardStatistics,
}

/// Inverted index of one shard.
///
/// Keeps a reverse map from each document to its keywords so removal only
/// touches the posting lists the document actually appears in.
#[derive(Debug)]
pub struct InvertedIndex {
    index_type: IndexType,
    table: HashMap<String, PostingList>,
    doc_keywords: HashMap<DocumentId, HashSet<String>>,
    doc_lengths: HashMap<DocumentId, u32>,
    total_token_length: u64,
}

impl InvertedIndex {
    pub fn new(index_type: IndexType) -> Self {
        Self {
            index_type,
            table: HashMap::new(),
            doc_keywords: HashMap::new(),
            doc_lengths: HashMap::new(),
            total_token_length: 0,
        }
    }

    /// Index a document, replacing any previous version.
    ///
    /// Returns true when a previous version was replaced.
    pub fn add_document(&mut self, doc: DocumentPostings) -> bool {
        let replaced = self.remove_document(doc.doc_id);

        let mut keywords = HashSet::with_capacity(doc.keywords.len());
        for keyword in doc.keywords {
            let posting = Posting {
                doc_id: doc.doc_id,
                payload: conform_payload(self.index_type, keyword.payload),
            };
            self.table
                .entry(keyword.keyword.clone())
                .or_default()
                .add_posting(posting);
            keywords.insert(keyword.keyword);
        }

        self.doc_keywords.insert(doc.doc_id, keywords);
        self.doc_lengths.insert(doc.doc_id, doc.token_length);
        self.total_token_length += u64::from(doc.token_length);
        replaced
    }

    /// Remove every posting of a document. Returns false if it was absent.
    pub fn remove_document(&mut self, doc_id: DocumentId) -> bool {
        let Some(keywords) = self.doc_keywords.remove(&doc_id) else {
            return false;
        };

        for keyword in keywords {
            if let Some(list) = self.table.get_mut(&keyword) {
                list.remove_document(doc_id);
                if list.is_empty() {
                    self.table.remove(&keyword);
                }
            }
        }

        if let Some(length) = self.doc_lengths.remove(&doc_id) {
            self.total_token_length -= u64::from(length);
        }
        true
    }

    /// Find documents containing every query token and label
    pub fn lookup(&self, query: &LookupQuery) -> ShardMatches {
        ShardMatches {
            docs: self.intersect(query),
            stats: self.statistics(&query.tokens),
        }
    }

    /// Shard statistics restricted to the given tokens
    pub fn statistics(&self, tokens: &[String]) -> ShardStatistics {
        let token_dfs = tokens
            .iter()
            .map(|token| (token.clone(), self.document_frequency(token) as u64))
            .collect();
        ShardStatistics {
            doc_count: self.num_documents() as u64,
            total_token_length: self.total_token_length,
            token_dfs,
        }
    }

    pub fn num_documents(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn num_keywords(&self) -> usize {
        self.table.len()
    }

    pub fn contains(&self, doc_id: DocumentId) -> bool {
        self.doc_lengths.contains_key(&doc_id)
    }

    pub fn document_frequency(&self, keyword: &str) -> usize {
        self.table
            .get(keyword)
            .map(PostingList::document_frequency)
            .unwrap_or(0)
    }

    pub fn postings(&self, keyword: &str) -> Option<&PostingList> {
        self.table.get(keyword)
    }

    fn intersect(&self, query: &LookupQuery) -> Vec<MatchedDocument> {
        let mut keywords: Vec<&str> = Vec::new();
        for keyword in query.tokens.iter().chain(&query.labels) {
            if !keywords.contains(&keyword.as_str()) {
                keywords.push(keyword.as_str());
            }
        }
        if keywords.is_empty() {
            return Vec::new();
        }

        // A keyword missing from the table empties a conjunctive match
        let mut lists = Vec::with_capacity(keywords.len());
        for keyword in &keywords {
            match self.table.get(*keyword) {
                Some(list) => lists.push(list),
                None => return Vec::new(),
            }
        }
        lists.sort_by_key(|list| list.document_frequency());
        let (driver, others) = lists.split_at(1);

        driver[0]
            .iter()
            .map(|posting| posting.doc_id)
            .filter(|doc_id| {
                query
                    .doc_ids
                    .as_ref()
                    .map_or(true, |allowed| allowed.contains(doc_id))
            })
            .filter(|doc_id| others.iter().all(|list| list.contains(*doc_id)))
            .map(|doc_id| self.matched_document(doc_id, &query.tokens))
            .collect()
    }

    fn matched_document(&self, doc_id: DocumentId, tokens: &[String]) -> MatchedDocument {
        let token_payloads = tokens
            .iter()
            .map(|token| {
                self.table
                    .get(token)
                    .and_then(|list| list.get(doc_id))
                    .map(|posting| posting.payload.clone())
                    .unwrap_or(PostingPayload::DocId)
            })
            .collect();
        MatchedDocument {
            doc_id,
            token_length: self.doc_lengths.get(&doc_id).copied().unwrap_or(0),
            token_payloads,
        }
    }
}

/// Strip payload details the index type does not keep
fn conform_payload(index_type: IndexType, payload: PostingPayload) -> PostingPayload {
    match (index_type, payload) {
        (_, PostingPayload::DocId) | (IndexType::DocIds, _) => PostingPayload::DocId,
        (IndexType::Frequencies, payload) => PostingPayload::Frequency(payload.frequency()),
        (IndexType::Locations, payload) => payload,
    }
}
