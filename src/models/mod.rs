pub mod document;
pub mod posting;
pub mod search;

pub use document::{DocumentId, DocumentIndexData, Fields};
pub use posting::{DocumentPostings, IndexType, KeywordPosting, Posting, PostingList, PostingPayload};
pub use search::{IndexedDocument, RankOptions, ScoredDocument, SearchRequest, SearchResponse};
