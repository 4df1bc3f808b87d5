//! Vector index gateway.
//!
//! Defines the [`VectorIndex`] trait — upsert, query-by-vector with an
//! equality metadata filter, delete by ids and/or filter, and stats —
//! plus two implementations:
//!
//! - **[`PineconeIndex`]** — adapter over the Pinecone data-plane REST
//!   API, with upsert paging and the shared retry policy.
//! - **[`MemoryIndex`]** — in-process index (brute-force cosine ranking)
//!   for tests and local development.
//!
//! Upserts are idempotent: writing an id that already exists replaces
//! the prior record entirely, metadata included.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::IndexConfig;
use crate::embedding::cosine_similarity;
use crate::error::ProviderError;
use crate::http;
use crate::models::{IndexStats, RecordMetadata, RetrievalMatch, VectorRecord};

/// Maximum records per physical upsert call; larger batches are paged
/// transparently.
pub const UPSERT_PAGE_SIZE: usize = 100;

/// Simple equality predicate over one metadata field, serialized on the
/// wire as `{field: {"$eq": value}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataFilter {
    pub field: String,
    pub value: serde_json::Value,
}

impl MetadataFilter {
    pub fn equals(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ &self.field: { "$eq": self.value } })
    }

    /// Evaluate the predicate against a record's metadata.
    fn matches(&self, metadata: &RecordMetadata) -> bool {
        let flat = serde_json::to_value(metadata).unwrap_or_default();
        flat.get(&self.field) == Some(&self.value)
    }
}

/// Adapter over an external similarity-search store.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or fully replace records by id. Callers may pass any
    /// number of records; physical calls are paged at
    /// [`UPSERT_PAGE_SIZE`].
    async fn upsert(&self, records: &[VectorRecord]) -> Result<(), ProviderError>;

    /// Return up to `top_k` matches ranked by descending similarity.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalMatch>, ProviderError>;

    /// Delete by explicit id list and/or metadata filter in one logical
    /// operation. Deleting a non-existent id is a no-op.
    async fn delete(
        &self,
        ids: &[String],
        filter: Option<&MetadataFilter>,
    ) -> Result<(), ProviderError>;

    /// Index statistics: total vectors, dimension, per-namespace counts.
    async fn describe(&self) -> Result<IndexStats, ProviderError>;
}

/// Construct the configured index backend.
pub fn create_index(config: &IndexConfig) -> anyhow::Result<std::sync::Arc<dyn VectorIndex>> {
    match config.provider.as_str() {
        "pinecone" => Ok(std::sync::Arc::new(PineconeIndex::new(config)?)),
        "memory" => Ok(std::sync::Arc::new(MemoryIndex::new())),
        other => anyhow::bail!("Unknown index provider: {}", other),
    }
}

// ============ Pinecone ============

/// Vector index backed by the Pinecone data-plane REST API.
///
/// Requires the `PINECONE_API_KEY` environment variable and the index
/// data-plane host in the config.
pub struct PineconeIndex {
    client: reqwest::Client,
    host: String,
    api_key: String,
    namespace: Option<String>,
    max_retries: u32,
}

impl PineconeIndex {
    pub fn new(config: &IndexConfig) -> Result<Self, ProviderError> {
        let api_key = std::env::var("PINECONE_API_KEY")
            .map_err(|_| ProviderError::MissingCredentials("PINECONE_API_KEY"))?;

        let host = config
            .host
            .clone()
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: "pinecone",
                detail: "index.host not configured".to_string(),
            })?;

        Ok(Self {
            client: http::client_with_timeout(config.timeout_secs)?,
            host: host.trim_end_matches('/').to_string(),
            api_key,
            namespace: config.namespace.clone(),
            max_retries: config.max_retries,
        })
    }

    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        let url = format!("{}{}", self.host, path);
        http::send_with_retry("pinecone", self.max_retries, || {
            self.client
                .post(&url)
                .header("Api-Key", &self.api_key)
                .json(&body)
        })
        .await
    }

    fn with_namespace(&self, mut body: serde_json::Value) -> serde_json::Value {
        if let Some(ns) = &self.namespace {
            body["namespace"] = serde_json::json!(ns);
        }
        body
    }
}

#[derive(Deserialize)]
struct PineconeQueryResponse {
    #[serde(default)]
    matches: Vec<PineconeMatch>,
}

#[derive(Deserialize)]
struct PineconeMatch {
    id: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    metadata: RecordMetadata,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PineconeStatsResponse {
    #[serde(default)]
    total_vector_count: u64,
    #[serde(default)]
    dimension: usize,
    #[serde(default)]
    namespaces: BTreeMap<String, PineconeNamespaceStats>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PineconeNamespaceStats {
    #[serde(default)]
    vector_count: u64,
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<(), ProviderError> {
        for page in records.chunks(UPSERT_PAGE_SIZE) {
            let body = self.with_namespace(serde_json::json!({ "vectors": page }));
            self.post("/vectors/upsert", body).await?;
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalMatch>, ProviderError> {
        let mut body = serde_json::json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });
        if let Some(f) = filter {
            body["filter"] = f.to_json();
        }

        let json = self.post("/query", self.with_namespace(body)).await?;
        let parsed: PineconeQueryResponse =
            serde_json::from_value(json).map_err(|e| ProviderError::InvalidResponse {
                provider: "pinecone",
                detail: e.to_string(),
            })?;

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| RetrievalMatch {
                chunk_id: m.id,
                score: m.score,
                content: m.metadata.content.clone(),
                metadata: m.metadata,
            })
            .collect())
    }

    async fn delete(
        &self,
        ids: &[String],
        filter: Option<&MetadataFilter>,
    ) -> Result<(), ProviderError> {
        // The provider accepts ids or a filter per call, not both; a
        // combined delete is two physical calls behind one logical op.
        if let Some(f) = filter {
            let body = self.with_namespace(serde_json::json!({ "filter": f.to_json() }));
            self.post("/vectors/delete", body).await?;
        }
        if !ids.is_empty() {
            let body = self.with_namespace(serde_json::json!({ "ids": ids }));
            self.post("/vectors/delete", body).await?;
        }
        Ok(())
    }

    async fn describe(&self) -> Result<IndexStats, ProviderError> {
        let json = self
            .post("/describe_index_stats", serde_json::json!({}))
            .await?;
        let parsed: PineconeStatsResponse =
            serde_json::from_value(json).map_err(|e| ProviderError::InvalidResponse {
                provider: "pinecone",
                detail: e.to_string(),
            })?;

        Ok(IndexStats {
            total_vector_count: parsed.total_vector_count,
            dimension: parsed.dimension,
            namespaces: parsed
                .namespaces
                .into_iter()
                .map(|(name, ns)| (name, ns.vector_count))
                .collect(),
        })
    }
}

// ============ In-memory ============

/// In-process [`VectorIndex`] for tests and local development.
///
/// Records live in a `BTreeMap` behind an `RwLock`; queries are
/// brute-force cosine similarity over all stored vectors, which keeps
/// tie order stable across identical calls.
pub struct MemoryIndex {
    records: RwLock<BTreeMap<String, VectorRecord>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored records. Test helper.
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of all stored records, in sorted order. Test helper.
    pub fn ids(&self) -> Vec<String> {
        self.records.read().unwrap().keys().cloned().collect()
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<(), ProviderError> {
        let mut stored = self.records.write().unwrap();
        for record in records {
            stored.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalMatch>, ProviderError> {
        let stored = self.records.read().unwrap();
        let mut matches: Vec<RetrievalMatch> = stored
            .values()
            .filter(|r| filter.map_or(true, |f| f.matches(&r.metadata)))
            .map(|r| RetrievalMatch {
                chunk_id: r.id.clone(),
                score: cosine_similarity(vector, &r.values) as f64,
                content: r.metadata.content.clone(),
                metadata: r.metadata.clone(),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn delete(
        &self,
        ids: &[String],
        filter: Option<&MetadataFilter>,
    ) -> Result<(), ProviderError> {
        let mut stored = self.records.write().unwrap();
        if let Some(f) = filter {
            stored.retain(|_, r| !f.matches(&r.metadata));
        }
        for id in ids {
            stored.remove(id);
        }
        Ok(())
    }

    async fn describe(&self) -> Result<IndexStats, ProviderError> {
        let stored = self.records.read().unwrap();
        let dimension = stored.values().next().map_or(0, |r| r.values.len());
        let mut namespaces = BTreeMap::new();
        namespaces.insert(String::new(), stored.len() as u64);

        Ok(IndexStats {
            total_vector_count: stored.len() as u64,
            dimension,
            namespaces,
        })
    }
}
