use std::sync::OnceLock;

use text_splitter::{ChunkConfig, ChunkSizer, TextSplitter};
use tiktoken_rs::{o200k_base, CoreBPE};

use common::{error::AppError, storage::types::text_chunk::TextChunk};

/// Chunk sizes are measured in BPE tokens, not characters, so boundaries
/// are reproducible on identical input.
struct TokenSizer(&'static CoreBPE);

impl ChunkSizer for TokenSizer {
    fn size(&self, chunk: &str) -> usize {
        self.0.encode_ordinary(chunk).len()
    }
}

/// Splits extracted text into ordered, token-bounded chunks.
///
/// Adjacent chunks of the same source share `overlap_tokens` of boundary
/// content so retrieval does not lose context at split points. Trimming is
/// disabled: concatenating the chunks with their overlaps removed yields the
/// input text byte for byte. Empty input yields an empty sequence.
pub fn chunk_text(
    text: &str,
    source_id: &str,
    max_tokens: usize,
    overlap_tokens: usize,
) -> Result<Vec<TextChunk>, AppError> {
    let spans = chunk_spans(text, max_tokens, overlap_tokens)?;
    Ok(spans
        .into_iter()
        .enumerate()
        .map(|(ordinal, (_, chunk))| TextChunk::new(source_id.to_string(), chunk, ordinal))
        .collect())
}

/// Chunks with their byte offsets into the source text, in source order.
fn chunk_spans(
    text: &str,
    max_tokens: usize,
    overlap_tokens: usize,
) -> Result<Vec<(usize, String)>, AppError> {
    if max_tokens == 0 {
        return Err(AppError::Validation(
            "chunk_max_tokens must be greater than zero".into(),
        ));
    }
    if overlap_tokens >= max_tokens {
        return Err(AppError::Validation(format!(
            "chunk_overlap_tokens ({overlap_tokens}) must be smaller than chunk_max_tokens ({max_tokens})"
        )));
    }
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let tokenizer = get_tokenizer()?;
    let chunk_config = ChunkConfig::new(max_tokens)
        .with_sizer(TokenSizer(tokenizer))
        .with_overlap(overlap_tokens)
        .map_err(|e| AppError::Validation(format!("invalid chunk overlap: {e}")))?
        .with_trim(false);
    let splitter = TextSplitter::new(chunk_config);

    Ok(splitter
        .chunk_indices(text)
        .map(|(offset, chunk)| (offset, chunk.to_owned()))
        .collect())
}

/// Token counting must be reproducible across runs and machines, so the BPE
/// tables ship with the binary instead of being fetched at startup.
fn get_tokenizer() -> Result<&'static CoreBPE, AppError> {
    static TOKENIZER: OnceLock<Result<CoreBPE, String>> = OnceLock::new();

    match TOKENIZER
        .get_or_init(|| o200k_base().map_err(|e| format!("failed to initialize tokenizer: {e}")))
    {
        Ok(tokenizer) => Ok(tokenizer),
        Err(err) => Err(AppError::InternalError(err.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_text() -> String {
        (1..=400)
            .map(|n| format!("Pasal {n} mengatur hak dan kewajiban pekerja."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn empty_input_yields_empty_sequence() {
        let chunks = chunk_text("", "doc", 200, 20).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn short_input_yields_single_chunk_with_full_text() {
        let chunks = chunk_text("Upah dibayar setiap bulan.", "doc", 200, 20).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk, "Upah dibayar setiap bulan.");
        assert_eq!(chunks[0].ordinal, 0);
        assert_eq!(chunks[0].source_id, "doc");
    }

    #[test]
    fn ordinals_follow_source_order() {
        let text = long_text();
        let chunks = chunk_text(&text, "doc", 50, 10).unwrap();
        assert!(chunks.len() > 1);
        for (expected, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.ordinal, expected);
        }
    }

    #[test]
    fn chunks_respect_the_token_budget() {
        let text = long_text();
        let tokenizer = o200k_base().unwrap();
        for chunk in chunk_text(&text, "doc", 50, 10).unwrap() {
            assert!(tokenizer.encode_ordinary(&chunk.chunk).len() <= 50);
        }
    }

    #[test]
    fn overlaps_removed_reconstruct_the_source_exactly() {
        let text = long_text();
        let spans = chunk_spans(&text, 50, 10).unwrap();

        assert_eq!(spans.first().map(|(offset, _)| *offset), Some(0));
        let mut rebuilt = String::new();
        let mut covered = 0usize;
        for (offset, chunk) in &spans {
            assert!(*offset <= covered, "gap between adjacent chunks");
            rebuilt.push_str(&chunk[covered - offset..]);
            covered = offset + chunk.len();
        }
        assert_eq!(covered, text.len());
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn adjacent_chunks_share_boundary_content() {
        let text = long_text();
        let spans = chunk_spans(&text, 50, 10).unwrap();
        assert!(spans.len() > 1);
        for pair in spans.windows(2) {
            let (previous_offset, previous_chunk) = &pair[0];
            let (next_offset, _) = &pair[1];
            assert!(
                *next_offset < previous_offset + previous_chunk.len(),
                "adjacent chunks should overlap"
            );
        }
    }

    #[test]
    fn overlap_wider_than_budget_is_rejected() {
        let err = chunk_text("text", "doc", 20, 20).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
