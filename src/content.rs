//! Content administration commands.
//!
//! Thin CLI surface over the content indexer: add, update, and delete
//! single items, bulk-seed the knowledge base from a JSON file, and
//! re-index a seed file in place. Each command maps 1:1 onto a core
//! indexer operation; relational bookkeeping (listing, history, usage)
//! lives outside this crate.
//!
//! A seed file is a JSON array of content items:
//!
//! ```json
//! [
//!   {
//!     "id": "kb_porosity",
//!     "title": "Understanding Hair Porosity",
//!     "category": "hair_education",
//!     "content": "Porosity determines how your hair absorbs...",
//!     "metadata": { "author": "studio" }
//!   }
//! ]
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;
use uuid::Uuid;

use crate::config::Config;
use crate::embedding::OpenAiEmbedder;
use crate::index::create_index;
use crate::indexer::ContentIndexer;
use crate::models::{ContentItem, RecordMetadata};

/// Build the indexer against the configured providers.
fn build_indexer(config: &Config) -> Result<ContentIndexer> {
    let embedder = Arc::new(OpenAiEmbedder::new(&config.embedding)?);
    let index = create_index(&config.index)?;
    Ok(ContentIndexer::new(
        embedder,
        index,
        config.chunking.chunk_size,
    ))
}

/// Stable id for an item: the declared one, or a generated `kb_<uuid>`.
fn content_id_for(item: &ContentItem) -> String {
    item.id
        .clone()
        .unwrap_or_else(|| format!("kb_{}", Uuid::new_v4().simple()))
}

/// Vector metadata derived from an item's fields plus its custom map.
fn metadata_for(item: &ContentItem) -> RecordMetadata {
    RecordMetadata {
        title: Some(item.title.clone()),
        category: Some(item.category.clone()),
        source: Some("knowledge_base".to_string()),
        extra: item.metadata.clone(),
        ..Default::default()
    }
}

fn load_items(path: &Path) -> Result<Vec<ContentItem>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse seed file: {}", path.display()))
}

/// Bulk-index every active item from a seed file.
pub async fn run_seed(
    config: &Config,
    path: &Path,
    dry_run: bool,
    category: Option<String>,
) -> Result<()> {
    let items: Vec<ContentItem> = load_items(path)?
        .into_iter()
        .filter(|item| item.active)
        .filter(|item| category.as_deref().map_or(true, |c| item.category == c))
        .collect();

    if dry_run {
        println!("seed (dry-run)");
        println!("  items to index: {}", items.len());
        for item in &items {
            println!("  - [{}] {}", item.category, item.title);
        }
        return Ok(());
    }

    let indexer = build_indexer(config)?;

    let mut indexed = 0usize;
    let mut skipped = 0usize;
    let mut total_chunks = 0usize;

    for item in &items {
        let content_id = content_id_for(item);
        let outcome = indexer
            .index(&item.content, &metadata_for(item), &content_id, true)
            .await;

        if outcome.indexed {
            indexed += 1;
            total_chunks += outcome.chunk_ids.len();
        } else {
            skipped += 1;
            warn!(content_id = %content_id, title = %item.title, "item not indexed");
        }
    }

    println!("seed");
    println!("  indexed: {} / {}", indexed, items.len());
    println!("  chunks written: {}", total_chunks);
    if skipped > 0 {
        println!("  skipped: {} (blank content or provider failure)", skipped);
    }

    Ok(())
}

/// Re-index every active item from a seed file: delete then index, so
/// stale chunks from earlier versions cannot linger.
pub async fn run_reindex(config: &Config, path: &Path) -> Result<()> {
    let items: Vec<ContentItem> = load_items(path)?
        .into_iter()
        .filter(|item| item.active)
        .collect();

    let indexer = build_indexer(config)?;

    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for item in &items {
        let content_id = content_id_for(item);
        if indexer
            .update(&item.content, &metadata_for(item), &content_id)
            .await
        {
            succeeded += 1;
        } else {
            failed += 1;
            warn!(content_id = %content_id, title = %item.title, "re-index failed");
        }
    }

    println!("reindex");
    println!("  succeeded: {} / {}", succeeded, items.len());
    if failed > 0 {
        println!("  failed: {}", failed);
    }

    Ok(())
}

/// Index a single new content item from a body file.
pub async fn run_add(
    config: &Config,
    title: String,
    category: String,
    body_path: &Path,
    id: Option<String>,
) -> Result<()> {
    let content = std::fs::read_to_string(body_path)
        .with_context(|| format!("Failed to read content file: {}", body_path.display()))?;

    let item = ContentItem {
        id,
        title,
        content,
        category,
        metadata: Default::default(),
        active: true,
    };

    let content_id = content_id_for(&item);
    let indexer = build_indexer(config)?;
    let outcome = indexer
        .index(&item.content, &metadata_for(&item), &content_id, true)
        .await;

    if outcome.indexed {
        println!("indexed {} ({} chunks)", content_id, outcome.chunk_ids.len());
    } else {
        println!("not indexed: blank content or provider failure");
    }

    Ok(())
}

/// Replace an existing item's indexed state from a body file.
pub async fn run_update(
    config: &Config,
    id: String,
    title: String,
    category: String,
    body_path: &Path,
) -> Result<()> {
    let content = std::fs::read_to_string(body_path)
        .with_context(|| format!("Failed to read content file: {}", body_path.display()))?;

    let item = ContentItem {
        id: Some(id.clone()),
        title,
        content,
        category,
        metadata: Default::default(),
        active: true,
    };

    let indexer = build_indexer(config)?;
    if indexer
        .update(&item.content, &metadata_for(&item), &id)
        .await
    {
        println!("updated {}", id);
    } else {
        println!("update failed for {}; item is currently unindexed", id);
    }

    Ok(())
}

/// Delete every vector record for a content id.
pub async fn run_delete(config: &Config, id: String) -> Result<()> {
    let indexer = build_indexer(config)?;
    if indexer.delete(&id).await {
        println!("deleted {}", id);
    } else {
        println!("delete failed for {}", id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_seed_file_parses() {
        let json = r#"[
            { "id": "kb_1", "title": "A", "content": "body", "category": "hair_education" },
            { "title": "B", "content": "body", "active": false }
        ]"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let items = load_items(file.path()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id.as_deref(), Some("kb_1"));
        assert!(!items[1].active);
    }

    #[test]
    fn test_generated_ids_are_prefixed_and_unique() {
        let item = ContentItem {
            id: None,
            title: "T".to_string(),
            content: "body".to_string(),
            category: String::new(),
            metadata: Default::default(),
            active: true,
        };
        let a = content_id_for(&item);
        let b = content_id_for(&item);
        assert!(a.starts_with("kb_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_metadata_carries_item_fields() {
        let mut item = ContentItem {
            id: Some("kb_1".to_string()),
            title: "Porosity".to_string(),
            content: "body".to_string(),
            category: "hair_education".to_string(),
            metadata: Default::default(),
            active: true,
        };
        item.metadata
            .insert("author".to_string(), serde_json::json!("studio"));

        let meta = metadata_for(&item);
        assert_eq!(meta.title.as_deref(), Some("Porosity"));
        assert_eq!(meta.category.as_deref(), Some("hair_education"));
        assert_eq!(meta.source.as_deref(), Some("knowledge_base"));
        assert_eq!(meta.extra.get("author"), Some(&serde_json::json!("studio")));
        // Derived fields are the indexer's job, not ours.
        assert!(meta.parent_id.is_none());
        assert!(meta.chunk_index.is_none());
    }
}
