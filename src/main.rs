//! # StrandWise CLI
//!
//! The `strandwise` binary is the admin and testing interface for the
//! retrieval-augmented mentorship backend. It manages the knowledge
//! base, runs semantic searches, inspects index statistics, and drives
//! the full persona pipeline against arbitrary messages without
//! persisting anything.
//!
//! ## Usage
//!
//! ```bash
//! strandwise --config ./strandwise.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `strandwise seed <file>` | Bulk-index content items from a JSON seed file |
//! | `strandwise reindex <file>` | Delete and re-index every item in a seed file |
//! | `strandwise content add` | Index a single new content item |
//! | `strandwise content update` | Replace an item's indexed state |
//! | `strandwise content delete <id>` | Remove all vector records for an id |
//! | `strandwise search "<query>"` | Semantic search over the knowledge base |
//! | `strandwise stats` | Show vector index statistics |
//! | `strandwise ask "<message>"` | Run the persona/topic pipeline for one message |
//!
//! Provider credentials come from the environment: `OPENAI_API_KEY` for
//! embeddings and completions, `PINECONE_API_KEY` for the hosted vector
//! index.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use strandwise::topic::ConversationTopic;
use strandwise::{chat, config, content, retrieve, stats};

/// StrandWise — retrieval-augmented mentorship chatbot backend.
#[derive(Parser)]
#[command(
    name = "strandwise",
    about = "StrandWise — retrieval-augmented mentorship chatbot backend",
    version,
    long_about = "StrandWise manages a vector-indexed knowledge base of hair-care and \
    salon-business content and answers questions through a persona-driven RAG pipeline: \
    classify the topic, retrieve relevant chunks, compose the mentor prompt, and call the \
    completion API."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./strandwise.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Bulk-index content items from a JSON seed file.
    ///
    /// Each item is chunked, embedded in one batched call, and upserted
    /// under `<id>_chunk_<n>` record ids. Inactive items are skipped.
    Seed {
        /// Path to the JSON seed file.
        file: PathBuf,

        /// Show what would be indexed without calling any provider.
        #[arg(long)]
        dry_run: bool,

        /// Only index items with this category.
        #[arg(long)]
        category: Option<String>,
    },

    /// Delete and re-index every active item in a seed file.
    ///
    /// Use after editing seed content so stale chunks from earlier
    /// versions cannot linger in the index.
    Reindex {
        /// Path to the JSON seed file.
        file: PathBuf,
    },

    /// Manage individual content items.
    Content {
        #[command(subcommand)]
        action: ContentAction,
    },

    /// Semantic search over the knowledge base.
    ///
    /// Embeds the query and prints ranked matches with scores. Unlike
    /// the chat path this does not apply the score threshold.
    Search {
        /// The search query.
        query: String,

        /// Maximum number of results.
        #[arg(long)]
        top_k: Option<usize>,

        /// Filter matches to one category.
        #[arg(long)]
        category: Option<String>,
    },

    /// Show vector index statistics.
    Stats,

    /// Run the persona/topic pipeline for one message.
    ///
    /// Classifies the topic, retrieves context, composes the prompt,
    /// and calls the completion API. Nothing is persisted.
    Ask {
        /// The message to answer.
        message: String,

        /// Force a topic instead of classifying the message
        /// (hair_education, business_mentorship, product_recommendation,
        /// troubleshooting, general).
        #[arg(long)]
        topic: Option<String>,

        /// Also print the first 500 characters of the system prompt.
        #[arg(long)]
        show_prompt: bool,
    },
}

/// Content management subcommands.
#[derive(Subcommand)]
enum ContentAction {
    /// Index a new content item from a body file.
    Add {
        /// Item title, prepended to the first chunk of long content.
        #[arg(long)]
        title: String,

        /// Category tag (e.g. hair_education, business).
        #[arg(long, default_value = "")]
        category: String,

        /// Path to the content body (plain text or markdown).
        #[arg(long)]
        file: PathBuf,

        /// Explicit content id; generated (`kb_<uuid>`) when omitted.
        #[arg(long)]
        id: Option<String>,
    },

    /// Replace an existing item's indexed state from a body file.
    Update {
        /// Content id to update.
        #[arg(long)]
        id: String,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        category: String,

        /// Path to the new content body.
        #[arg(long)]
        file: PathBuf,
    },

    /// Remove all vector records for a content id.
    Delete {
        /// Content id to delete.
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log to stderr so stdout stays clean for command output.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Seed {
            file,
            dry_run,
            category,
        } => {
            content::run_seed(&cfg, &file, dry_run, category).await?;
        }
        Commands::Reindex { file } => {
            content::run_reindex(&cfg, &file).await?;
        }
        Commands::Content { action } => match action {
            ContentAction::Add {
                title,
                category,
                file,
                id,
            } => {
                content::run_add(&cfg, title, category, &file, id).await?;
            }
            ContentAction::Update {
                id,
                title,
                category,
                file,
            } => {
                content::run_update(&cfg, id, title, category, &file).await?;
            }
            ContentAction::Delete { id } => {
                content::run_delete(&cfg, id).await?;
            }
        },
        Commands::Search {
            query,
            top_k,
            category,
        } => {
            retrieve::run_search(&cfg, &query, top_k, category).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Ask {
            message,
            topic,
            show_prompt,
        } => {
            let forced = topic
                .map(|t| t.parse::<ConversationTopic>())
                .transpose()
                .map_err(|e| anyhow::anyhow!(e))?;
            chat::run_ask(&cfg, &message, forced, show_prompt).await?;
        }
    }

    Ok(())
}
