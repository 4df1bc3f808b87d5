//! Content indexing.
//!
//! [`ContentIndexer`] keeps the vector index consistent with a logical
//! content identity: indexing chunks + embeds + upserts in one pass,
//! deletion removes every derived record, and update is delete followed
//! by re-index.
//!
//! The consistency invariant: no vector record may outlive or outnumber
//! its content item's current chunking. Chunked records are keyed
//! `{content_id}_chunk_{i}` and carry `parent_id = content_id` so a
//! single filter delete reaches all of them; the bare `content_id` is
//! deleted too to cover unchunked records.
//!
//! Provider failures during indexing are caught and reported through
//! return values; retry policy belongs to the caller.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::chunk::chunk_text;
use crate::embedding::Embedder;
use crate::error::ProviderError;
use crate::index::{MetadataFilter, VectorIndex};
use crate::models::{RecordMetadata, VectorRecord};

/// Result of one indexing attempt.
///
/// `indexed == false` covers both blank input (zero chunks) and provider
/// failure; either way no usable vector state was written.
#[derive(Debug, Clone, Default)]
pub struct IndexOutcome {
    pub indexed: bool,
    pub chunk_ids: Vec<String>,
}

impl IndexOutcome {
    fn empty() -> Self {
        Self::default()
    }
}

/// Orchestrates chunking, batch embedding, and vector upserts for
/// content items.
pub struct ContentIndexer {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    chunk_size: usize,
}

impl ContentIndexer {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, chunk_size: usize) -> Self {
        Self {
            embedder,
            index,
            chunk_size,
        }
    }

    /// Index `content` under `content_id`.
    ///
    /// With `chunk == true` the body is chunked and each chunk becomes a
    /// record `{content_id}_chunk_{i}`; zero chunks (blank input) yields
    /// `indexed: false` without touching any provider. With
    /// `chunk == false` the whole body becomes a single record under
    /// `content_id`.
    pub async fn index(
        &self,
        content: &str,
        metadata: &RecordMetadata,
        content_id: &str,
        chunk: bool,
    ) -> IndexOutcome {
        let result = if chunk {
            self.index_chunked(content, metadata, content_id).await
        } else {
            self.index_single(content, metadata, content_id).await
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(content_id, error = %e, "indexing failed");
                IndexOutcome::empty()
            }
        }
    }

    async fn index_chunked(
        &self,
        content: &str,
        metadata: &RecordMetadata,
        content_id: &str,
    ) -> Result<IndexOutcome, ProviderError> {
        let title = metadata.title.as_deref().filter(|t| !t.is_empty());
        let chunks = chunk_text(content, title, self.chunk_size);

        if chunks.is_empty() {
            warn!(content_id, "no chunks generated, nothing to index");
            return Ok(IndexOutcome::empty());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let mut records = Vec::with_capacity(chunks.len());
        let mut chunk_ids = Vec::with_capacity(chunks.len());

        for (chunk, values) in chunks.iter().zip(embeddings) {
            let chunk_id = format!("{}_chunk_{}", content_id, chunk.index);

            let mut record_metadata = metadata.clone();
            record_metadata.content = chunk.text.clone();
            record_metadata.chunk_index = Some(chunk.index);
            record_metadata.total_chunks = Some(chunk.total);
            record_metadata.parent_id = Some(content_id.to_string());

            records.push(VectorRecord {
                id: chunk_id.clone(),
                values,
                metadata: record_metadata,
            });
            chunk_ids.push(chunk_id);
        }

        self.index.upsert(&records).await?;

        info!(content_id, chunks = chunk_ids.len(), "indexed content");
        Ok(IndexOutcome {
            indexed: true,
            chunk_ids,
        })
    }

    async fn index_single(
        &self,
        content: &str,
        metadata: &RecordMetadata,
        content_id: &str,
    ) -> Result<IndexOutcome, ProviderError> {
        let values = self.embedder.embed(content).await?;

        let mut record_metadata = metadata.clone();
        record_metadata.content = content.to_string();

        self.index
            .upsert(&[VectorRecord {
                id: content_id.to_string(),
                values,
                metadata: record_metadata,
            }])
            .await?;

        info!(content_id, "indexed single record");
        Ok(IndexOutcome {
            indexed: true,
            chunk_ids: vec![content_id.to_string()],
        })
    }

    /// Delete every vector record derived from `content_id`: the
    /// filter delete covers chunked records, the id delete covers the
    /// unchunked case. Idempotent; true even when nothing matched.
    pub async fn delete(&self, content_id: &str) -> bool {
        let filter = MetadataFilter::equals("parent_id", content_id);
        match self
            .index
            .delete(&[content_id.to_string()], Some(&filter))
            .await
        {
            Ok(()) => {
                info!(content_id, "deleted content records");
                true
            }
            Err(e) => {
                error!(content_id, error = %e, "delete failed");
                false
            }
        }
    }

    /// Replace the indexed state for `content_id`: delete, then
    /// re-index.
    ///
    /// Not transactional. When re-indexing fails after the delete
    /// succeeded the content stays unindexed and `false` is returned so
    /// the caller can alert or retry `index` later.
    pub async fn update(
        &self,
        content: &str,
        metadata: &RecordMetadata,
        content_id: &str,
    ) -> bool {
        self.delete(content_id).await;
        self.index(content, metadata, content_id, true).await.indexed
    }
}
