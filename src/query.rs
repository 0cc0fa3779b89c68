//! Question answering: translate → search → prompt → complete.
//!
//! Steps run strictly in that order, each under its own timeout. The first
//! failure ends the request; nothing partial is returned.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, PromptConfig};
use crate::error::{RagError, Result};
use crate::ingest::Retriever;
use crate::llm::LanguageModel;
use crate::models::{Answer, ChatMessage, Fragment};

#[derive(Debug, Clone)]
pub struct QuerySettings {
    pub prompt: PromptConfig,
    pub temperature: f32,
    pub model_timeout: Duration,
    pub search_timeout: Duration,
}

impl QuerySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            prompt: config.prompt.clone(),
            temperature: config.model.temperature,
            model_timeout: config.model.timeout(),
            search_timeout: config.retrieval.search_timeout(),
        }
    }
}

pub struct QueryEngine {
    model: Arc<dyn LanguageModel>,
    retriever: Arc<Retriever>,
    settings: QuerySettings,
}

impl QueryEngine {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        retriever: Arc<Retriever>,
        settings: QuerySettings,
    ) -> Self {
        Self {
            model,
            retriever,
            settings,
        }
    }

    /// Answer `question` using the `top_k` best matching fragments.
    pub async fn answer(&self, question: &str, top_k: i64) -> Result<Answer> {
        let prompt = &self.settings.prompt;

        let search_query = bounded(
            "translation",
            self.settings.model_timeout,
            self.model.translate(question, &prompt.search_language),
        )
        .await?;
        tracing::debug!(%search_query, "translated question");

        let hits = bounded(
            "search",
            self.settings.search_timeout,
            self.retriever.search(&search_query, top_k),
        )
        .await?;
        tracing::debug!(hits = hits.len(), "retrieved fragments");

        let messages = build_messages(prompt, &hits, question);

        let answer = bounded(
            "completion",
            self.settings.model_timeout,
            self.model.complete(&messages, self.settings.temperature),
        )
        .await?;

        Ok(Answer {
            answer,
            sources: hits,
        })
    }
}

async fn bounded<T, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(RagError::Timeout { operation, limit }),
    }
}

/// Render retrieved fragments as the snippet block of the prompt.
/// Empty when nothing was retrieved.
pub fn format_context(prompt: &PromptConfig, hits: &[Fragment]) -> String {
    if hits.is_empty() {
        return String::new();
    }
    let snippets = hits
        .iter()
        .map(|hit| format!("Document: {}\nContent: {}", hit.path, hit.content))
        .collect::<Vec<_>>()
        .join("\n---\n");
    format!(
        "RAG_SNIPPETS ({} original):\n{}",
        prompt.search_language, snippets
    )
}

/// System instruction plus a user turn holding the snippets and the
/// original, untranslated question.
pub fn build_messages(prompt: &PromptConfig, hits: &[Fragment], question: &str) -> Vec<ChatMessage> {
    let user = format!(
        "{}\n\nUser Question ({}): {}",
        format_context(prompt, hits),
        prompt.question_language,
        question
    );
    vec![ChatMessage::system(&prompt.system), ChatMessage::user(user)]
}
