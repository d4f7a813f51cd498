use std::{path::Path, sync::Arc};

use api_router::{api_state::ApiState, contract_routes};
use common::{
    storage::{session::SessionStore, vector_index::VectorIndex},
    utils::{config::get_config, embedding::EmbeddingProvider},
};
use rag_pipeline::{Generator, OpenAiGenerator};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    let embedding = Arc::new(EmbeddingProvider::from_config(
        &config,
        Arc::clone(&openai_client),
    ));
    info!(
        embedding_backend = embedding.backend_label(),
        embedding_dimension = embedding.dimension(),
        "Embedding provider initialized"
    );

    // The reference corpus index is built once by the indexer binary and
    // loaded read-only here, shared by every request.
    let reference_index = match VectorIndex::load(Path::new(&config.reference_index_dir)).await {
        Ok(index) => {
            info!(
                chunks = index.len(),
                dir = %config.reference_index_dir,
                "Loaded reference corpus index"
            );
            Arc::new(index)
        }
        Err(err) if config.allow_missing_reference_index => {
            warn!(
                error = %err,
                "Reference corpus index unavailable; serving without reference context"
            );
            Arc::new(VectorIndex::new())
        }
        Err(err) => {
            error!(
                error = %err,
                dir = %config.reference_index_dir,
                "Failed to load reference corpus index; run the indexer binary first"
            );
            return Err(Box::new(err) as Box<dyn std::error::Error>);
        }
    };

    let sessions = Arc::new(SessionStore::from_config(&config));
    let generator: Arc<dyn Generator> =
        Arc::new(OpenAiGenerator::from_config(openai_client, &config));

    let app_state = ApiState::new(
        config.clone(),
        reference_index,
        sessions,
        embedding,
        generator,
    );
    let app = contract_routes(&app_state);

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
