use std::sync::Arc;

use common::{
    storage::{session::SessionStore, vector_index::VectorIndex},
    utils::{config::AppConfig, embedding::EmbeddingProvider},
};
use rag_pipeline::{Generator, RagEngine};

/// Shared state behind every contract route. The reference index is loaded
/// once at startup and shared read-only; the session store is the only
/// mutable cross-request structure.
#[derive(Clone)]
pub struct ApiState {
    pub config: AppConfig,
    pub reference_index: Arc<VectorIndex>,
    pub sessions: Arc<SessionStore>,
    pub embedding: Arc<EmbeddingProvider>,
    pub generator: Arc<dyn Generator>,
}

impl ApiState {
    pub fn new(
        config: AppConfig,
        reference_index: Arc<VectorIndex>,
        sessions: Arc<SessionStore>,
        embedding: Arc<EmbeddingProvider>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            config,
            reference_index,
            sessions,
            embedding,
            generator,
        }
    }

    /// Engine for one request, bound to the given contract index and the
    /// shared reference index.
    pub fn engine_for(&self, contract_index: Arc<VectorIndex>) -> RagEngine {
        RagEngine::with_indices(
            Arc::clone(&self.reference_index),
            contract_index,
            Arc::clone(&self.embedding),
            Arc::clone(&self.generator),
            self.config.retrieval_take,
        )
    }
}
