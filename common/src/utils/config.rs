use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    OpenAI,
    Hashed,
}

fn default_embedding_backend() -> EmbeddingBackend {
    EmbeddingBackend::OpenAI
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub openai_api_key: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_chat_temperature")]
    pub chat_temperature: f32,
    #[serde(default = "default_chat_top_p")]
    pub chat_top_p: f32,
    #[serde(default = "default_chat_max_tokens")]
    pub chat_max_tokens: u32,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: u32,
    #[serde(default = "default_embedding_backend")]
    pub embedding_backend: EmbeddingBackend,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_reference_index_dir")]
    pub reference_index_dir: String,
    #[serde(default = "default_reference_corpus_path")]
    pub reference_corpus_path: String,
    #[serde(default)]
    pub allow_missing_reference_index: bool,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_session_capacity")]
    pub session_capacity: usize,
    #[serde(default = "default_chunk_max_tokens")]
    pub chunk_max_tokens: usize,
    #[serde(default = "default_chunk_overlap_tokens")]
    pub chunk_overlap_tokens: usize,
    #[serde(default = "default_retrieval_take")]
    pub retrieval_take: usize,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

// The reviewer prompt relies on model variance for phrasing; both sampling
// knobs ship wide open and are overridable per deployment.
fn default_chat_temperature() -> f32 {
    1.0
}

fn default_chat_top_p() -> f32 {
    1.0
}

fn default_chat_max_tokens() -> u32 {
    16_000
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimensions() -> u32 {
    1536
}

fn default_http_port() -> u16 {
    3000
}

fn default_reference_index_dir() -> String {
    "vector".to_string()
}

fn default_reference_corpus_path() -> String {
    "upload/UU_13_2003.pdf".to_string()
}

fn default_session_ttl_secs() -> u64 {
    600
}

fn default_session_capacity() -> usize {
    10
}

fn default_chunk_max_tokens() -> usize {
    200
}

fn default_chunk_overlap_tokens() -> usize {
    20
}

fn default_retrieval_take() -> usize {
    10
}

fn default_max_upload_bytes() -> usize {
    4 * 1024 * 1024
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
