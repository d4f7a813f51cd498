use std::path::Path;

use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};
use tracing::debug;

use common::{
    error::AppError,
    storage::{types::text_chunk::TextChunk, vector_index::VectorIndex},
    utils::embedding::EmbeddingProvider,
};

/// Embeds every chunk and assembles the in-memory index.
///
/// The build is all-or-nothing: a failed or mis-sized embedding aborts the
/// whole index rather than leaving a partial one behind, since retrieval
/// over a partial index silently skews results.
pub async fn build_index(
    chunks: Vec<TextChunk>,
    embedder: &EmbeddingProvider,
) -> Result<VectorIndex, AppError> {
    let texts: Vec<String> = chunks.iter().map(|chunk| chunk.chunk.clone()).collect();

    let retry_strategy = ExponentialBackoff::from_millis(100).map(jitter).take(3);
    let embeddings = Retry::spawn(retry_strategy, || embedder.embed_batch(texts.clone()))
        .await
        .map_err(|err| AppError::Embedding(err.to_string()))?;

    if embeddings.len() != chunks.len() {
        return Err(AppError::Embedding(format!(
            "embedding count mismatch: got {} vectors for {} chunks",
            embeddings.len(),
            chunks.len()
        )));
    }

    let expected_dimension = embedder.dimension();
    let mut index = VectorIndex::new();
    for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
        if embedding.len() != expected_dimension {
            return Err(AppError::Embedding(format!(
                "embedding for chunk {} has dimension {}, expected {}",
                chunk.ordinal,
                embedding.len(),
                expected_dimension
            )));
        }
        index.insert(chunk, embedding);
    }

    debug!(chunks = index.len(), "built vector index");
    Ok(index)
}

/// Loads the persisted reference-corpus index without re-embedding.
pub async fn load_reference_index(dir: &Path) -> Result<VectorIndex, AppError> {
    VectorIndex::load(dir).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(texts: &[&str]) -> Vec<TextChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(ordinal, text)| TextChunk::new("doc".into(), (*text).to_string(), ordinal))
            .collect()
    }

    #[tokio::test]
    async fn build_preserves_chunk_identity_and_order() {
        let embedder = EmbeddingProvider::new_hashed(32);
        let index = build_index(chunks(&["jam kerja", "upah bulanan", "cuti tahunan"]), &embedder)
            .await
            .unwrap();

        assert_eq!(index.len(), 3);
        let query = embedder.embed("upah bulanan").await.unwrap();
        let hits = index.search(&query, 1);
        assert_eq!(hits[0].chunk.chunk, "upah bulanan");
        assert_eq!(hits[0].chunk.ordinal, 1);
    }

    #[tokio::test]
    async fn empty_chunk_list_builds_an_empty_index() {
        let embedder = EmbeddingProvider::new_hashed(32);
        let index = build_index(Vec::new(), &embedder).await.unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn persisted_index_loads_without_reembedding() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = EmbeddingProvider::new_hashed(32);
        let index = build_index(chunks(&["pasal satu", "pasal dua"]), &embedder)
            .await
            .unwrap();
        index.save(dir.path()).await.unwrap();

        let loaded = load_reference_index(dir.path()).await.unwrap();
        assert_eq!(loaded.len(), 2);
    }
}
