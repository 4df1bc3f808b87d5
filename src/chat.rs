//! Conversational pipeline.
//!
//! [`ChatPipeline`] runs one message through the full flow: classify the
//! topic, retrieve knowledge-base context, compose the message list
//! (persona system prompt, optional context injection, trimmed history,
//! current message), and call the completion provider.
//!
//! Retrieval is already best-effort inside the retriever; a completion
//! failure degrades to the fixed fallback reply instead of surfacing a
//! raw error to the end user. Persistence and usage accounting belong to
//! the caller.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use crate::completion::{CompletionProvider, OpenAiCompletions};
use crate::config::Config;
use crate::embedding::OpenAiEmbedder;
use crate::index::create_index;
use crate::models::{ChatMessage, SourceRef};
use crate::persona::Persona;
use crate::prompt;
use crate::retrieve::ContextRetriever;
use crate::topic::ConversationTopic;

/// Result of one conversational turn.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub reply: String,
    pub total_tokens: u32,
    pub topic: ConversationTopic,
    /// Sources behind the injected context, in match order.
    pub sources: Vec<SourceRef>,
    /// True when the completion provider failed and the reply is the
    /// fixed fallback.
    pub degraded: bool,
}

/// Tunables for one pipeline instance, lifted from [`Config`].
#[derive(Debug, Clone, Copy)]
pub struct ChatSettings {
    pub top_k: usize,
    pub score_threshold: f64,
    /// History turns kept when building the message list.
    pub max_history: usize,
}

impl ChatSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            score_threshold: config.retrieval.score_threshold,
            max_history: config.completion.max_history,
        }
    }
}

/// The end-to-end RAG chat flow.
pub struct ChatPipeline {
    retriever: ContextRetriever,
    completions: Arc<dyn CompletionProvider>,
    persona: Persona,
    settings: ChatSettings,
}

impl ChatPipeline {
    pub fn new(
        retriever: ContextRetriever,
        completions: Arc<dyn CompletionProvider>,
        persona: Persona,
        settings: ChatSettings,
    ) -> Self {
        Self {
            retriever,
            completions,
            persona,
            settings,
        }
    }

    /// Wire up a pipeline against the configured providers.
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = Arc::new(OpenAiEmbedder::new(&config.embedding)?);
        let index = create_index(&config.index)?;
        let completions = Arc::new(OpenAiCompletions::new(&config.completion)?);

        Ok(Self::new(
            ContextRetriever::new(embedder, index),
            completions,
            config.persona.clone(),
            ChatSettings::from_config(config),
        ))
    }

    /// Respond to `message`, classifying its topic first.
    pub async fn respond(&self, message: &str, history: &[ChatMessage]) -> ChatOutcome {
        let topic = ConversationTopic::classify(message);
        self.respond_with_topic(message, history, topic).await
    }

    /// Respond with a caller-forced topic (used by the persona test
    /// path).
    pub async fn respond_with_topic(
        &self,
        message: &str,
        history: &[ChatMessage],
        topic: ConversationTopic,
    ) -> ChatOutcome {
        info!(topic = %topic, "processing message");

        let bundle = self
            .retriever
            .retrieve(
                message,
                self.settings.top_k,
                self.settings.score_threshold,
                None,
            )
            .await;

        let messages = self.build_messages(message, &bundle.context, history, topic);

        match self.completions.complete(&messages).await {
            Ok(completion) => {
                info!(tokens = completion.total_tokens, "completion received");
                ChatOutcome {
                    reply: completion.text,
                    total_tokens: completion.total_tokens,
                    topic,
                    sources: bundle.sources,
                    degraded: false,
                }
            }
            Err(e) => {
                error!(error = %e, "completion failed, substituting fallback reply");
                ChatOutcome {
                    reply: prompt::FALLBACK_ERROR.to_string(),
                    total_tokens: 0,
                    topic,
                    sources: bundle.sources,
                    degraded: true,
                }
            }
        }
    }

    /// Compose the system prompt this pipeline would send for a topic.
    /// Used by the `ask` command's prompt preview.
    pub fn system_prompt(&self, topic: ConversationTopic) -> String {
        prompt::system_prompt(&self.persona, topic, true)
    }

    /// Assemble the ordered message list: system prompt, optional
    /// context-injection turn, the last `max_history` non-empty history
    /// entries, then the current message.
    fn build_messages(
        &self,
        user_message: &str,
        context: &str,
        history: &[ChatMessage],
        topic: ConversationTopic,
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(prompt::system_prompt(
            &self.persona,
            topic,
            true,
        ))];

        let injection = prompt::context_injection(context);
        if !injection.is_empty() {
            messages.push(ChatMessage::system(injection));
        }

        let start = history.len().saturating_sub(self.settings.max_history);
        for entry in &history[start..] {
            if !entry.content.trim().is_empty() {
                messages.push(entry.clone());
            }
        }

        messages.push(ChatMessage::user(user_message));
        messages
    }
}

/// Run the `ask` CLI command: drive the pipeline for one message without
/// persisting anything.
pub async fn run_ask(
    config: &Config,
    message: &str,
    forced_topic: Option<ConversationTopic>,
    show_prompt: bool,
) -> Result<()> {
    let pipeline = ChatPipeline::from_config(config)?;

    let topic = forced_topic.unwrap_or_else(|| ConversationTopic::classify(message));
    let outcome = pipeline.respond_with_topic(message, &[], topic).await;

    println!("topic: {}", outcome.topic);
    println!("tokens: {}", outcome.total_tokens);
    if outcome.degraded {
        println!("(completion provider unavailable, fallback reply)");
    }
    println!();
    println!("{}", outcome.reply);

    if !outcome.sources.is_empty() {
        println!();
        println!("sources:");
        for s in &outcome.sources {
            println!("  [{:.3}] {} ({})", s.score, s.title, s.chunk_id);
        }
    }

    if show_prompt {
        let preview: String = pipeline.system_prompt(topic).chars().take(500).collect();
        println!();
        println!("system prompt preview:");
        println!("{}...", preview);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::embedding::Embedder;
    use crate::error::ProviderError;
    use crate::index::{MemoryIndex, VectorIndex};
    use crate::models::{Completion, RecordMetadata, Role, VectorRecord};

    struct UnitEmbedder;

    #[async_trait]
    impl Embedder for UnitEmbedder {
        fn model_name(&self) -> &str {
            "unit"
        }
        fn dimensions(&self) -> usize {
            2
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    /// Records the message list it was called with and echoes a fixed
    /// reply.
    struct CapturingCompletions {
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl CapturingCompletions {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
            })
        }

        fn last_messages(&self) -> Vec<ChatMessage> {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl CompletionProvider for CapturingCompletions {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, ProviderError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            Ok(Completion {
                text: "mentor reply".to_string(),
                total_tokens: 42,
            })
        }
    }

    struct FailingCompletions;

    #[async_trait]
    impl CompletionProvider for FailingCompletions {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<Completion, ProviderError> {
            Err(ProviderError::Api {
                provider: "openai completions",
                status: 500,
                body: "down".to_string(),
            })
        }
    }

    fn settings() -> ChatSettings {
        ChatSettings {
            top_k: 5,
            score_threshold: 0.7,
            max_history: 10,
        }
    }

    async fn seeded_index() -> Arc<MemoryIndex> {
        let index = Arc::new(MemoryIndex::new());
        index
            .upsert(&[VectorRecord {
                id: "kb_1_chunk_0".to_string(),
                values: vec![1.0, 0.0],
                metadata: RecordMetadata {
                    content: "Porosity drives product choice.".to_string(),
                    title: Some("Porosity Guide".to_string()),
                    category: Some("hair_education".to_string()),
                    parent_id: Some("kb_1".to_string()),
                    ..Default::default()
                },
            }])
            .await
            .unwrap();
        index
    }

    fn pipeline_with(
        index: Arc<MemoryIndex>,
        completions: Arc<dyn CompletionProvider>,
    ) -> ChatPipeline {
        ChatPipeline::new(
            ContextRetriever::new(Arc::new(UnitEmbedder), index),
            completions,
            Persona::default(),
            settings(),
        )
    }

    #[tokio::test]
    async fn test_message_shape_with_context() {
        let completions = CapturingCompletions::new();
        let pipeline = pipeline_with(seeded_index().await, completions.clone());

        let outcome = pipeline.respond("How do I figure out my hair porosity?", &[]).await;

        assert_eq!(outcome.reply, "mentor reply");
        assert_eq!(outcome.total_tokens, 42);
        assert_eq!(outcome.topic, ConversationTopic::HairEducation);
        assert_eq!(outcome.sources.len(), 1);
        assert!(!outcome.degraded);

        let messages = completions.last_messages();
        // system prompt, context injection, user message
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Sage"));
        assert_eq!(messages[1].role, Role::System);
        assert!(messages[1].content.contains("Porosity drives product choice."));
        assert_eq!(messages[2].role, Role::User);
        assert_eq!(messages[2].content, "How do I figure out my hair porosity?");
    }

    #[tokio::test]
    async fn test_no_context_means_no_injection_turn() {
        let completions = CapturingCompletions::new();
        // Empty index: retrieval yields nothing above threshold.
        let pipeline = pipeline_with(Arc::new(MemoryIndex::new()), completions.clone());

        pipeline.respond("Hello!", &[]).await;

        let messages = completions.last_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
    }

    #[tokio::test]
    async fn test_history_capped_at_max() {
        let completions = CapturingCompletions::new();
        let pipeline = pipeline_with(Arc::new(MemoryIndex::new()), completions.clone());

        let history: Vec<ChatMessage> = (0..15)
            .flat_map(|i| {
                [
                    ChatMessage::user(format!("question {}", i)),
                    ChatMessage::assistant(format!("answer {}", i)),
                ]
            })
            .collect();

        pipeline.respond("Hello!", &history).await;

        let messages = completions.last_messages();
        // system + 10 history turns + current user message
        assert_eq!(messages.len(), 12);
        // The kept turns are the most recent ones.
        assert_eq!(messages[1].content, "question 10");
        assert_eq!(messages[10].content, "answer 14");
    }

    #[tokio::test]
    async fn test_completion_failure_uses_fallback() {
        let pipeline = pipeline_with(seeded_index().await, Arc::new(FailingCompletions));

        let outcome = pipeline.respond("My hair is breaking, help!", &[]).await;

        assert!(outcome.degraded);
        assert_eq!(outcome.reply, prompt::FALLBACK_ERROR);
        assert_eq!(outcome.total_tokens, 0);
        assert_eq!(outcome.topic, ConversationTopic::Troubleshooting);
        // Retrieval still ran; sources survive for diagnostics.
        assert_eq!(outcome.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_forced_topic_skips_classification() {
        let completions = CapturingCompletions::new();
        let pipeline = pipeline_with(Arc::new(MemoryIndex::new()), completions.clone());

        let outcome = pipeline
            .respond_with_topic("Hello!", &[], ConversationTopic::BusinessMentorship)
            .await;

        assert_eq!(outcome.topic, ConversationTopic::BusinessMentorship);
        let messages = completions.last_messages();
        assert!(messages[0].content.contains("## Business Mentorship Mode"));
    }

    #[tokio::test]
    async fn test_blank_history_entries_skipped() {
        let completions = CapturingCompletions::new();
        let pipeline = pipeline_with(Arc::new(MemoryIndex::new()), completions.clone());

        let history = vec![
            ChatMessage::user("real question"),
            ChatMessage::assistant("   "),
        ];
        pipeline.respond("Hello!", &history).await;

        let messages = completions.last_messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content, "real question");
    }
}
