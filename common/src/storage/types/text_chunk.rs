use serde::{Deserialize, Serialize};

/// A bounded segment of source text, the unit of embedding and retrieval.
/// `ordinal` preserves the chunk's position within its source document;
/// adjacent chunks intentionally share boundary text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub source_id: String,
    pub chunk: String,
    pub ordinal: usize,
}

impl TextChunk {
    pub fn new(source_id: String, chunk: String, ordinal: usize) -> Self {
        Self {
            source_id,
            chunk,
            ordinal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_round_trips_through_serde() {
        let chunk = TextChunk::new("contract.pdf".into(), "Pasal 1. Jam kerja.".into(), 3);
        let json = serde_json::to_string(&chunk).unwrap();
        let back: TextChunk = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chunk);
    }
}
