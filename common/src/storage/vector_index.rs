use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{error::AppError, storage::types::text_chunk::TextChunk};

const INDEX_FILE: &str = "index.json";

/// A supporting chunk plus its similarity score, ordered for downstream
/// prompt assembly.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk: TextChunk,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    chunk: TextChunk,
    embedding: Vec<f32>,
}

/// In-memory nearest-neighbor index over (chunk, embedding) pairs.
///
/// Contract indexes live for one request (or one cached session); the
/// reference-corpus index is built once by the `indexer` binary, persisted
/// with [`VectorIndex::save`], and loaded read-only at server start.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chunk: TextChunk, embedding: Vec<f32>) {
        self.entries.push(IndexEntry { chunk, embedding });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact top-K search by cosine similarity, descending. An exhaustive
    /// scan is the right tradeoff here: contract indexes hold at most a few
    /// hundred chunks and queries ask for ten.
    pub fn search(&self, query: &[f32], take: usize) -> Vec<RetrievedChunk> {
        let mut scored: Vec<RetrievedChunk> = self
            .entries
            .iter()
            .map(|entry| RetrievedChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query, &entry.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(take);
        scored
    }

    pub async fn save(&self, dir: &Path) -> Result<(), AppError> {
        tokio::fs::create_dir_all(dir).await?;
        let serialized = serde_json::to_vec(self)?;
        tokio::fs::write(dir.join(INDEX_FILE), serialized).await?;
        Ok(())
    }

    pub async fn load(dir: &Path) -> Result<Self, AppError> {
        let raw = tokio::fs::read(dir.join(INDEX_FILE)).await?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
