use async_openai::error::OpenAIError;
use thiserror::Error;
use tokio::task::JoinError;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Extraction error: {0}")]
    Extraction(String),
    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("Embedding error: {0}")]
    Embedding(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Topic '{topic}' failed: {source}")]
    Rag {
        topic: String,
        #[source]
        source: Box<AppError>,
    },
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Wraps a failure from one topic's retrieval/generation cycle so the
    /// batch aggregation can report which topic sank it.
    pub fn rag(topic: impl Into<String>, source: AppError) -> Self {
        Self::Rag {
            topic: topic.into(),
            source: Box::new(source),
        }
    }
}
