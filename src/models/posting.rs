use serde::{Deserialize, Serialize};

use super::document::DocumentId;

/// Richness level of the inverted index.
///
/// Each level carries everything the previous one does:
/// `DocIds ⊂ Frequencies ⊂ Locations`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    /// Document IDs only
    DocIds,
    /// Term frequency and document length, enables BM25
    #[default]
    Frequencies,
    /// Token start offsets, enables proximity and snippets
    Locations,
}

impl IndexType {
    pub fn has_frequencies(self) -> bool {
        matches!(self, IndexType::Frequencies | IndexType::Locations)
    }

    pub fn has_locations(self) -> bool {
        matches!(self, IndexType::Locations)
    }
}

/// Per-posting data, shaped by the index type
#[derive(Clone, Debug, PartialEq)]
pub enum PostingPayload {
    DocId,
    Frequency(u32),
    /// Byte offsets of each occurrence's first byte, ascending
    Locations(Vec<usize>),
}

impl PostingPayload {
    /// Term frequency carried by this payload; 0 when the index has none
    pub fn frequency(&self) -> u32 {
        match self {
            PostingPayload::DocId => 0,
            PostingPayload::Frequency(tf) => *tf,
            PostingPayload::Locations(starts) => starts.len() as u32,
        }
    }

    pub fn locations(&self) -> &[usize] {
        match self {
            PostingPayload::Locations(starts) => starts,
            _ => &[],
        }
    }
}

/// Association of one keyword with one document
#[derive(Clone, Debug, PartialEq)]
pub struct Posting {
    pub doc_id: DocumentId,
    pub payload: PostingPayload,
}

/// One keyword of a document about to be indexed
#[derive(Clone, Debug, PartialEq)]
pub struct KeywordPosting {
    pub keyword: String,
    pub payload: PostingPayload,
}

/// Everything an indexer shard needs to index one document
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentPostings {
    pub doc_id: DocumentId,
    /// Number of tokens the segmenter produced, stop tokens included
    pub token_length: u32,
    pub keywords: Vec<KeywordPosting>,
}

/// Postings of one keyword, kept sorted by document ID
#[derive(Clone, Debug, Default)]
pub struct PostingList {
    postings: Vec<Posting>,
}

impl PostingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the posting for `posting.doc_id`
    pub fn add_posting(&mut self, posting: Posting) {
        match self.position(posting.doc_id) {
            Ok(idx) => self.postings[idx] = posting,
            Err(idx) => self.postings.insert(idx, posting),
        }
    }

    /// Remove a document from this posting list, returning whether it was present
    pub fn remove_document(&mut self, doc_id: DocumentId) -> bool {
        match self.position(doc_id) {
            Ok(idx) => {
                self.postings.remove(idx);
                true
            }
            Err(_) => false,
        }
    }

    pub fn get(&self, doc_id: DocumentId) -> Option<&Posting> {
        self.position(doc_id).ok().map(|idx| &self.postings[idx])
    }

    pub fn contains(&self, doc_id: DocumentId) -> bool {
        self.position(doc_id).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Posting> {
        self.postings.iter()
    }

    /// Check if this posting list is empty
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Get the document frequency (number of documents containing this keyword)
    pub fn document_frequency(&self) -> usize {
        self.postings.len()
    }

    fn position(&self, doc_id: DocumentId) -> std::result::Result<usize, usize> {
        self.postings.binary_search_by_key(&doc_id, |p| p.doc_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(doc_id: DocumentId, tf: u32) -> Posting {
        Posting {
            doc_id,
            payload: PostingPayload::Frequency(tf),
        }
    }

    #[test]
    fn test_posting_list_operations() {
        let mut list = PostingList::new();
        assert!(list.is_empty());

        list.add_posting(posting(5, 1));
        list.add_posting(posting(2, 3));
        list.add_posting(posting(9, 2));
        assert_eq!(list.document_frequency(), 3);

        let ids: Vec<DocumentId> = list.iter().map(|p| p.doc_id).collect();
        assert_eq!(ids, vec![2, 5, 9]);

        assert!(list.remove_document(5));
        assert!(!list.remove_document(5));
        assert_eq!(list.document_frequency(), 2);
        assert!(!list.contains(5));
    }

    #[test]
    fn test_add_replaces_existing_posting() {
        let mut list = PostingList::new();
        list.add_posting(posting(1, 1));
        list.add_posting(posting(1, 4));

        assert_eq!(list.document_frequency(), 1);
        assert_eq!(list.get(1).unwrap().payload.frequency(), 4);
    }

    #[test]
    fn test_payload_accessors() {
        assert_eq!(PostingPayload::DocId.frequency(), 0);
        assert!(PostingPayload::DocId.locations().is_empty());

        let payload = PostingPayload::Locations(vec![0, 18, 24]);
        assert_eq!(payload.frequency(), 3);
        assert_eq!(payload.locations(), &[0, 18, 24]);
    }

    #[test]
    fn test_index_type_capabilities() {
        assert!(!IndexType::DocIds.has_frequencies());
        assert!(IndexType::Frequencies.has_frequencies());
        assert!(!IndexType::Frequencies.has_locations());
        assert!(IndexType::Locations.has_frequencies());
        assert!(IndexType::Locations.has_locations());
        assert_eq!(IndexType::default(), IndexType::Frequencies);
    }
}
