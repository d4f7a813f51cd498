use std::sync::Arc;

use tracing::debug;

use common::{
    error::AppError,
    storage::vector_index::{RetrievedChunk, VectorIndex},
    utils::embedding::EmbeddingProvider,
};

use crate::{prompt, report::TopicResult, Generator, Retriever, VectorRetriever};

/// Per-topic retrieval-augmented generation.
///
/// For one topic the engine runs two independent retrieval queries (labor
/// law from the reference index, matching terms from the contract index),
/// fuses both into the fixed prompt, and makes a single generation call.
/// The retrievals run concurrently; generation waits on both.
pub struct RagEngine {
    law: Arc<dyn Retriever>,
    contract: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    take: usize,
}

impl RagEngine {
    pub fn new(
        law: Arc<dyn Retriever>,
        contract: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        take: usize,
    ) -> Self {
        Self {
            law,
            contract,
            generator,
            take,
        }
    }

    /// Convenience constructor wiring both indices through the default
    /// vector retriever.
    pub fn with_indices(
        reference_index: Arc<VectorIndex>,
        contract_index: Arc<VectorIndex>,
        embedder: Arc<EmbeddingProvider>,
        generator: Arc<dyn Generator>,
        take: usize,
    ) -> Self {
        Self::new(
            Arc::new(VectorRetriever::new(reference_index, Arc::clone(&embedder))),
            Arc::new(VectorRetriever::new(contract_index, embedder)),
            generator,
            take,
        )
    }

    /// Produces the analysis text for one topic. Any failure along the way,
    /// including a blank topic from the comma-split rule list, fails the
    /// topic as a whole; no partial text is ever substituted.
    #[tracing::instrument(skip(self))]
    pub async fn analyse_topic(&self, topic: &str) -> Result<TopicResult, AppError> {
        if topic.trim().is_empty() {
            return Err(AppError::rag(
                topic,
                AppError::Validation("empty topic in rule list".into()),
            ));
        }

        let law_query = format!("Find applicable law related to {topic}");
        let term_query = format!("Find applicable term related to {topic}");

        let (law_hits, contract_hits) = tokio::try_join!(
            self.law.retrieve(&law_query, self.take),
            self.contract.retrieve(&term_query, self.take),
        )
        .map_err(|err| AppError::rag(topic, err))?;

        debug!(
            law_hits = law_hits.len(),
            contract_hits = contract_hits.len(),
            "retrieval complete"
        );

        let law_context = concat_context(&law_hits);
        let contract_context = concat_context(&contract_hits);

        let system_prompt = prompt::system_prompt(topic, &law_context);
        let user_prompt = prompt::user_prompt(topic, &contract_context);

        let text = self
            .generator
            .generate(&system_prompt, &user_prompt)
            .await
            .map_err(|err| AppError::rag(topic, err))?;

        Ok(TopicResult {
            topic: topic.to_string(),
            text,
        })
    }
}

/// Retrieved chunk texts in similarity-rank order, blank-line separated.
fn concat_context(hits: &[RetrievedChunk]) -> String {
    hits.iter()
        .map(|hit| hit.chunk.chunk.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
