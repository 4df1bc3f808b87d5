//! Context retrieval.
//!
//! [`ContextRetriever`] orchestrates one retrieval round: embed the
//! query, run the similarity search, drop matches under the score
//! threshold, and format the survivors into a single context string plus
//! a structured source list.
//!
//! Retrieval is best-effort by contract: a provider failure here must
//! never block the caller from getting an LLM answer, so every
//! [`ProviderError`] degrades to an empty [`ContextBundle`] instead of
//! propagating. The unformatted [`search`](ContextRetriever::search)
//! path, used by the admin CLI, does propagate.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::embedding::{Embedder, OpenAiEmbedder};
use crate::error::ProviderError;
use crate::index::{create_index, MetadataFilter, VectorIndex};
use crate::models::{ContextBundle, RetrievalMatch, SourceRef};

/// Separator between formatted matches in the joined context string.
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Retrieves and formats knowledge-base context for a query.
pub struct ContextRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl ContextRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Retrieve context for `query`, degrading to an empty bundle on any
    /// provider failure.
    ///
    /// Matches scoring below `score_threshold` are dropped; zero
    /// survivors is a normal outcome, not an error.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        score_threshold: f64,
        filter: Option<&MetadataFilter>,
    ) -> ContextBundle {
        match self
            .try_retrieve(query, top_k, score_threshold, filter)
            .await
        {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!(error = %e, "context retrieval failed, continuing without context");
                ContextBundle::default()
            }
        }
    }

    /// Convenience wrapper returning only the joined context string.
    pub async fn retrieve_text(
        &self,
        query: &str,
        top_k: usize,
        score_threshold: f64,
        filter: Option<&MetadataFilter>,
    ) -> String {
        self.retrieve(query, top_k, score_threshold, filter)
            .await
            .context
    }

    async fn try_retrieve(
        &self,
        query: &str,
        top_k: usize,
        score_threshold: f64,
        filter: Option<&MetadataFilter>,
    ) -> Result<ContextBundle, ProviderError> {
        let embedding = self.embedder.embed(query).await?;
        let matches = self.index.query(&embedding, top_k, filter).await?;

        let survivors: Vec<RetrievalMatch> = matches
            .into_iter()
            .filter(|m| m.score >= score_threshold)
            .collect();

        if survivors.is_empty() {
            info!(threshold = score_threshold, "no matches above threshold");
            return Ok(ContextBundle::default());
        }

        let context = survivors
            .iter()
            .map(format_match)
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        let average =
            survivors.iter().map(|m| m.score).sum::<f64>() / survivors.len() as f64;

        let sources = survivors
            .iter()
            .map(|m| SourceRef {
                title: m
                    .metadata
                    .title
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
                category: m.metadata.category.clone().unwrap_or_default(),
                score: round3(m.score),
                chunk_id: m.chunk_id.clone(),
            })
            .collect();

        Ok(ContextBundle {
            context,
            total_matches: survivors.len(),
            average_score: round3(average),
            sources,
        })
    }

    /// Raw similarity search without threshold filtering or formatting.
    /// Provider failures propagate; this backs the admin `search`
    /// command, not the conversational path.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalMatch>, ProviderError> {
        let embedding = self.embedder.embed(query).await?;
        self.index.query(&embedding, top_k, filter).await
    }
}

/// Format one match: `**{title}** ({category})` header line when a title
/// is present, then the content; bare content otherwise.
fn format_match(m: &RetrievalMatch) -> String {
    match m.metadata.title.as_deref() {
        Some(title) if !title.is_empty() => {
            let mut header = format!("**{}**", title);
            if let Some(category) = m.metadata.category.as_deref() {
                if !category.is_empty() {
                    header.push_str(&format!(" ({})", category));
                }
            }
            format!("{}\n{}", header, m.content)
        }
        _ => m.content.clone(),
    }
}

/// Round to three decimal places for display and source lists.
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Run the semantic-search CLI command.
pub async fn run_search(
    config: &Config,
    query: &str,
    top_k: Option<usize>,
    category: Option<String>,
) -> Result<()> {
    let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(&config.embedding)?);
    let index = create_index(&config.index)?;
    let retriever = ContextRetriever::new(embedder, index);

    let filter = category.map(|c| MetadataFilter::equals("category", c));
    let top_k = top_k.unwrap_or(config.retrieval.top_k);

    let matches = retriever.search(query, top_k, filter.as_ref()).await?;

    if matches.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, m) in matches.iter().enumerate() {
        let title = m.metadata.title.as_deref().unwrap_or("(untitled)");
        let category = m.metadata.category.as_deref().unwrap_or("");
        println!(
            "{:>2}. [{:.3}] {} {}",
            i + 1,
            m.score,
            title,
            if category.is_empty() {
                String::new()
            } else {
                format!("({})", category)
            }
        );
        println!("    id: {}", m.chunk_id);
        let snippet: String = m.content.chars().take(160).collect();
        println!("    {}", snippet.replace('\n', " "));
    }

    Ok(())
}
