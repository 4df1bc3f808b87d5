//! # StrandWise
//!
//! A retrieval-augmented mentorship chatbot backend for hair
//! professionals.
//!
//! StrandWise turns a knowledge base of hair-care and salon-business
//! content into grounded, persona-driven answers: content is chunked,
//! embedded, and upserted into a vector index; each user message is
//! classified by topic, enriched with the most relevant chunks, and sent
//! to an LLM completion API under a mentor persona.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌─────────────┐
//! │   Content    │──▶│   Indexer    │──▶│   Vector    │
//! │  (seed/CLI)  │   │ chunk+embed  │   │   index     │
//! └──────────────┘   └──────────────┘   └──────┬──────┘
//!                                              │
//!                    ┌──────────────┐   ┌──────▼──────┐
//! user message ─────▶│  Classifier  │   │  Retriever  │
//!                    └──────┬───────┘   └──────┬──────┘
//!                           ▼                  ▼
//!                    ┌─────────────────────────────────┐
//!                    │   Prompt composer → completion  │
//!                    └─────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! strandwise seed knowledge.json       # index the knowledge base
//! strandwise search "hair porosity"    # semantic search
//! strandwise stats                     # inspect the vector index
//! strandwise ask "How should I price my services?"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Provider error taxonomy |
//! | [`chunk`] | Text chunking |
//! | [`embedding`] | Embedding gateway |
//! | [`index`] | Vector index gateway |
//! | [`retrieve`] | Context retrieval |
//! | [`indexer`] | Content indexing lifecycle |
//! | [`topic`] | Conversation topic detection |
//! | [`persona`] | Assistant persona profile |
//! | [`prompt`] | Prompt composition |
//! | [`completion`] | Completion gateway |
//! | [`chat`] | End-to-end chat pipeline |
//! | [`content`] | Content admin commands |
//! | [`stats`] | Index statistics command |

pub mod chat;
pub mod chunk;
pub mod completion;
pub mod config;
pub mod content;
pub mod embedding;
pub mod error;
mod http;
pub mod index;
pub mod indexer;
pub mod models;
pub mod persona;
pub mod prompt;
pub mod retrieve;
pub mod stats;
pub mod topic;
