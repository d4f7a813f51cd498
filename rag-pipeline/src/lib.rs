#![allow(clippy::missing_docs_in_private_items)]

pub mod engine;
pub mod prompt;
pub mod report;

pub use engine::RagEngine;
pub use report::{generate_report, parse_topics, Report, TopicResult};

use std::sync::Arc;

use async_openai::types::{
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;

use common::{
    error::AppError,
    storage::vector_index::{RetrievedChunk, VectorIndex},
    utils::{config::AppConfig, embedding::EmbeddingProvider},
};

/// Nearest-neighbor lookup over one index, addressed by query text.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, take: usize) -> Result<Vec<RetrievedChunk>, AppError>;
}

/// Default retriever: embed the query, search the wrapped index.
pub struct VectorRetriever {
    index: Arc<VectorIndex>,
    embedder: Arc<EmbeddingProvider>,
}

impl VectorRetriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<EmbeddingProvider>) -> Self {
        Self { index, embedder }
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str, take: usize) -> Result<Vec<RetrievedChunk>, AppError> {
        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|err| AppError::Embedding(err.to_string()))?;
        Ok(self.index.search(&query_embedding, take))
    }
}

/// The generation capability: one composed prompt in, one analysis text out.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AppError>;
}

/// Chat-completion backed generator. The sampling knobs are deployment
/// policy and always come from configuration.
pub struct OpenAiGenerator {
    client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
    model: String,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

impl OpenAiGenerator {
    pub fn from_config(
        client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
        config: &AppConfig,
    ) -> Self {
        Self {
            client,
            model: config.chat_model.clone(),
            temperature: config.chat_temperature,
            top_p: config.chat_top_p,
            max_tokens: config.chat_max_tokens,
        }
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AppError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .top_p(self.top_p)
            .max_completion_tokens(self.max_tokens)
            .messages([
                ChatCompletionRequestSystemMessage::from(system_prompt.to_string()).into(),
                ChatCompletionRequestUserMessage::from(user_prompt.to_string()).into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::InternalError("no content in model response".into()))
    }
}
