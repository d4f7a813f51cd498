use std::{path::Path, sync::Arc};

use common::utils::{config::get_config, embedding::EmbeddingProvider};
use ingestion_pipeline::ingest_document;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Batch job: build the reference-corpus index from the labor-law PDF and
/// persist it for the server to load at startup. Build once, load many.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = get_config()?;

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));
    let embedding = Arc::new(EmbeddingProvider::from_config(&config, openai_client));

    info!(
        corpus = %config.reference_corpus_path,
        backend = embedding.backend_label(),
        "Building reference corpus index"
    );

    let bytes = tokio::fs::read(&config.reference_corpus_path).await?;
    let index = ingest_document(
        bytes,
        &config.reference_corpus_path,
        &embedding,
        config.chunk_max_tokens,
        config.chunk_overlap_tokens,
    )
    .await?;

    index.save(Path::new(&config.reference_index_dir)).await?;
    info!(
        chunks = index.len(),
        dir = %config.reference_index_dir,
        "Reference corpus index written"
    );

    Ok(())
}
