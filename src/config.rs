use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::persona::Persona;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub persona: Persona,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dims: default_dims(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_dims() -> usize {
    1536
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// `"pinecone"` for the hosted index, `"memory"` for the in-process
    /// index used in tests and local development.
    #[serde(default = "default_index_provider")]
    pub provider: String,
    /// Data-plane base URL of the hosted index (required for pinecone).
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            provider: default_index_provider(),
            host: None,
            namespace: None,
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_index_provider() -> String {
    "pinecone".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_chunk_size() -> usize {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            score_threshold: default_score_threshold(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_score_threshold() -> f64 {
    0.7
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_completion_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Conversation turns kept when building the message list.
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    #[serde(default = "default_completion_retries")]
    pub max_retries: u32,
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: default_completion_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_history: default_max_history(),
            max_retries: default_completion_retries(),
            timeout_secs: default_completion_timeout(),
        }
    }
}

fn default_completion_model() -> String {
    "gpt-4o".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_max_history() -> usize {
    10
}
fn default_completion_retries() -> u32 {
    2
}
fn default_completion_timeout() -> u64 {
    60
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }

    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    if !(0.0..=1.0).contains(&config.retrieval.score_threshold) {
        anyhow::bail!("retrieval.score_threshold must be in [0.0, 1.0]");
    }

    if config.embedding.dims == 0 {
        anyhow::bail!("embedding.dims must be > 0");
    }

    match config.index.provider.as_str() {
        "pinecone" => {
            if config.index.host.as_deref().unwrap_or("").is_empty() {
                anyhow::bail!("index.host is required when index.provider is 'pinecone'");
            }
        }
        "memory" => {}
        other => anyhow::bail!(
            "Unknown index provider: '{}'. Must be pinecone or memory.",
            other
        ),
    }

    if config.persona.name.trim().is_empty() {
        anyhow::bail!("persona.name must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_from_str(toml_str: &str) -> Result<Config> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml_str.as_bytes()).unwrap();
        load_config(file.path())
    }

    #[test]
    fn test_empty_config_uses_memory_defaults() {
        let config = load_from_str("[index]\nprovider = \"memory\"\n").unwrap();
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.score_threshold, 0.7);
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.embedding.dims, 1536);
        assert_eq!(config.completion.max_history, 10);
    }

    #[test]
    fn test_pinecone_requires_host() {
        let err = load_from_str("[index]\nprovider = \"pinecone\"\n").unwrap_err();
        assert!(err.to_string().contains("index.host"));
    }

    #[test]
    fn test_unknown_index_provider_rejected() {
        let err = load_from_str("[index]\nprovider = \"chroma\"\n").unwrap_err();
        assert!(err.to_string().contains("Unknown index provider"));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let err = load_from_str(
            "[index]\nprovider = \"memory\"\n\n[retrieval]\nscore_threshold = 1.5\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("score_threshold"));
    }

    #[test]
    fn test_persona_override() {
        let config = load_from_str(
            "[index]\nprovider = \"memory\"\n\n[persona]\nname = \"TestBot\"\n",
        )
        .unwrap();
        assert_eq!(config.persona.name, "TestBot");
        // Fields not named in the override keep their defaults.
        assert!(!config.persona.guidelines.is_empty());
    }

    #[test]
    fn test_full_section_parse() {
        let config = load_from_str(
            r#"
            [embedding]
            model = "text-embedding-3-large"
            dims = 3072

            [index]
            provider = "pinecone"
            host = "https://kb-abc123.svc.us-east-1.pinecone.io"
            namespace = "prod"

            [chunking]
            chunk_size = 800

            [retrieval]
            top_k = 8
            score_threshold = 0.55

            [completion]
            model = "gpt-4o-mini"
            temperature = 0.5
            max_tokens = 700
            "#,
        )
        .unwrap();
        assert_eq!(config.embedding.dims, 3072);
        assert_eq!(config.index.namespace.as_deref(), Some("prod"));
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.completion.model, "gpt-4o-mini");
    }
}
