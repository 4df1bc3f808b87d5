//! Core data types flowing through the retrieval pipeline.
//!
//! These types represent the content items, chunks, vector records, and
//! retrieval results exchanged between the chunker, the gateways, and the
//! retrieval/indexing orchestrators.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A logical unit of knowledge, as managed by the content admin surface.
///
/// The body text is the source of truth; everything in the vector index
/// is derived, regenerable state keyed back to this item's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Stable opaque id. Generated (`kb_<uuid>`) when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: String,
    /// Caller-supplied custom metadata, copied onto every vector record.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Inactive items are skipped by bulk seeding and re-indexing.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// A bounded-size segment of a content body, the unit of embedding.
///
/// Chunks are ephemeral: recomputed on every (re)index and never stored
/// outside the vector index itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// 0-based position within the chunking of one content body.
    pub index: usize,
    /// Total chunk count of that chunking, identical across siblings.
    pub total: usize,
}

/// Metadata attached to a vector record.
///
/// The known fields are typed; anything else the caller supplies rides in
/// `extra` and is flattened into the same flat metadata object on the
/// wire, which is what the vector-store providers expect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// The chunk (or whole-content) text this record was embedded from.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Content id this record was derived from; the delete-by-filter key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<usize>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A single record in the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// One ranked match returned from a similarity query. Transient.
#[derive(Debug, Clone)]
pub struct RetrievalMatch {
    pub chunk_id: String,
    /// Similarity in `0..1`, higher is more similar.
    pub score: f64,
    pub content: String,
    pub metadata: RecordMetadata,
}

/// Source summary for one match that survived threshold filtering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRef {
    pub title: String,
    pub category: String,
    /// Rounded to three decimal places.
    pub score: f64,
    pub chunk_id: String,
}

/// Aggregate of a query's surviving matches, built fresh per request.
#[derive(Debug, Clone, Default)]
pub struct ContextBundle {
    /// Formatted matches joined with a visible separator.
    pub context: String,
    pub sources: Vec<SourceRef>,
    pub total_matches: usize,
    /// Mean score over survivors, rounded to three decimal places.
    pub average_score: f64,
}

impl ContextBundle {
    /// True when no match survived filtering (or retrieval degraded).
    pub fn is_empty(&self) -> bool {
        self.total_matches == 0
    }
}

/// Vector index statistics as reported by the provider.
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub total_vector_count: u64,
    pub dimension: usize,
    /// Vector counts per namespace; the default namespace is `""`.
    pub namespaces: BTreeMap<String, u64>,
}

/// Role of one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a conversation, as sent to the completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Raw reply from the completion provider.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_metadata_flattens_extra() {
        let mut meta = RecordMetadata {
            content: "body".to_string(),
            title: Some("Guide".to_string()),
            parent_id: Some("kb_1".to_string()),
            chunk_index: Some(0),
            ..Default::default()
        };
        meta.extra
            .insert("author".to_string(), serde_json::json!("tay"));

        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["content"], "body");
        assert_eq!(value["title"], "Guide");
        assert_eq!(value["parent_id"], "kb_1");
        assert_eq!(value["chunk_index"], 0);
        // Extra keys live at the same level as the typed fields.
        assert_eq!(value["author"], "tay");
        // Absent optionals are omitted entirely.
        assert!(value.get("category").is_none());
    }

    #[test]
    fn test_record_metadata_roundtrip() {
        let mut meta = RecordMetadata {
            content: "text".to_string(),
            category: Some("hair_education".to_string()),
            ..Default::default()
        };
        meta.extra.insert("id".to_string(), serde_json::json!(7));

        let value = serde_json::to_value(&meta).unwrap();
        let back: RecordMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_chat_message_roles_serialize_lowercase() {
        let msg = ChatMessage::assistant("hi");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
    }

    #[test]
    fn test_content_item_defaults() {
        let item: ContentItem =
            serde_json::from_str(r#"{"title": "T", "content": "body"}"#).unwrap();
        assert!(item.id.is_none());
        assert!(item.active);
        assert!(item.category.is_empty());
        assert!(item.metadata.is_empty());
    }

    #[test]
    fn test_empty_bundle() {
        let bundle = ContextBundle::default();
        assert!(bundle.is_empty());
        assert_eq!(bundle.context, "");
        assert_eq!(bundle.average_score, 0.0);
    }
}
