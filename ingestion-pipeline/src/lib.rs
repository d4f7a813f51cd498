#![allow(clippy::missing_docs_in_private_items)]

pub mod chunk;
pub mod extract;
pub mod index;

pub use chunk::chunk_text;
pub use extract::extract_text;
pub use index::{build_index, load_reference_index};

use tracing::info;

use common::{error::AppError, storage::vector_index::VectorIndex, utils::embedding::EmbeddingProvider};

/// Full ingestion path for one uploaded document:
/// extract text, split into overlapping token-bounded chunks, embed, index.
#[tracing::instrument(skip(bytes, embedder), fields(bytes = bytes.len()))]
pub async fn ingest_document(
    bytes: Vec<u8>,
    source_id: &str,
    embedder: &EmbeddingProvider,
    max_tokens: usize,
    overlap_tokens: usize,
) -> Result<VectorIndex, AppError> {
    let text = extract::extract_text(bytes).await?;
    let chunks = chunk::chunk_text(&text, source_id, max_tokens, overlap_tokens)?;
    info!(chunk_count = chunks.len(), "document chunked");
    index::build_index(chunks, embedder).await
}
