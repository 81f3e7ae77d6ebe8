use crate::models::DocumentId;

/// Shard owning `doc_id`. Indexer and ranker shards share this partition.
pub fn shard_for(doc_id: DocumentId, num_shards: usize) -> usize {
    debug_assert!(num_shards > 0);
    crc32fast::hash(&doc_id.to_le_bytes()) as usize % num_shards
}
