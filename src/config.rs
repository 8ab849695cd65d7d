//! Pipeline configuration.
//!
//! All tunables in one place, with defaults matching the shipped corpus
//! setup and an environment-variable override layer (`HELPDESK_QA_*`).
//! `.env` files are honored via `dotenvy`.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::chunking::ChunkerConfig;
use crate::embeddings::{HttpEmbeddingProvider, DEFAULT_EMBEDDING_DIM};
use crate::retrieval::DEFAULT_TOP_K;
use crate::scoring::ConfidenceScorer;
use crate::synthesis::{HttpCompletionProvider, SynthesisConfig};
use crate::types::QaError;

/// Default per-request timeout for the external services.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for ingestion and serving.
#[derive(Clone, Debug)]
pub struct QaConfig {
    /// Full URL of the OpenAI-compatible `/embeddings` endpoint.
    pub embedding_endpoint: Option<Url>,
    /// Embedding model name passed on the wire.
    pub embedding_model: String,
    /// Embedding dimensionality agreed with the index.
    pub embedding_dims: usize,
    /// Full URL of the OpenAI-compatible `/chat/completions` endpoint.
    pub completion_endpoint: Option<Url>,
    /// Completion model name passed on the wire.
    pub completion_model: String,
    /// API key sent as a bearer token to both services.
    pub api_key: Option<String>,
    /// Timeout applied to each service request.
    pub request_timeout: Duration,
    /// Where the index snapshot lives.
    pub index_path: PathBuf,
    /// Chunker window parameters.
    pub chunker: ChunkerConfig,
    /// Confidence calibration.
    pub scorer: ConfidenceScorer,
    /// Synthesis tunables.
    pub synthesis: SynthesisConfig,
    /// Candidates fetched per query.
    pub top_k: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            embedding_endpoint: None,
            embedding_model: "all-MiniLM-L6-v2".to_string(),
            embedding_dims: DEFAULT_EMBEDDING_DIM,
            completion_endpoint: None,
            completion_model: "llama-3.3-70b-versatile".to_string(),
            api_key: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            index_path: PathBuf::from("data/index.json"),
            chunker: ChunkerConfig::default(),
            scorer: ConfidenceScorer::default(),
            synthesis: SynthesisConfig::default(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl QaConfig {
    /// Builds a config from defaults overridden by `HELPDESK_QA_*`
    /// environment variables. A `.env` file in the working directory is
    /// loaded first when present.
    pub fn from_env() -> Result<Self, QaError> {
        // Missing .env is fine; only an unreadable one matters, and even
        // then the process env still applies.
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Some(value) = env_var("HELPDESK_QA_EMBEDDING_ENDPOINT") {
            config.embedding_endpoint = Some(parse_url("HELPDESK_QA_EMBEDDING_ENDPOINT", &value)?);
        }
        if let Some(value) = env_var("HELPDESK_QA_EMBEDDING_MODEL") {
            config.embedding_model = value;
        }
        if let Some(value) = env_var("HELPDESK_QA_EMBEDDING_DIMS") {
            config.embedding_dims = parse_number("HELPDESK_QA_EMBEDDING_DIMS", &value)?;
        }
        if let Some(value) = env_var("HELPDESK_QA_COMPLETION_ENDPOINT") {
            config.completion_endpoint =
                Some(parse_url("HELPDESK_QA_COMPLETION_ENDPOINT", &value)?);
        }
        if let Some(value) = env_var("HELPDESK_QA_COMPLETION_MODEL") {
            config.completion_model = value;
        }
        if let Some(value) = env_var("HELPDESK_QA_API_KEY") {
            config.api_key = Some(value);
        }
        if let Some(value) = env_var("HELPDESK_QA_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_number("HELPDESK_QA_REQUEST_TIMEOUT_SECS", &value)?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(value) = env_var("HELPDESK_QA_INDEX_PATH") {
            config.index_path = PathBuf::from(value);
        }
        if let Some(value) = env_var("HELPDESK_QA_TOP_K") {
            config.top_k = parse_number("HELPDESK_QA_TOP_K", &value)?;
        }
        if let Some(value) = env_var("HELPDESK_QA_RELEVANCE_THRESHOLD") {
            config.scorer.relevance_threshold =
                parse_number("HELPDESK_QA_RELEVANCE_THRESHOLD", &value)?;
        }
        if let Some(value) = env_var("HELPDESK_QA_DISTANCE_SCALE") {
            config.scorer.distance_scale = parse_number("HELPDESK_QA_DISTANCE_SCALE", &value)?;
        }

        Ok(config)
    }

    /// A reqwest client configured with this config's request timeout.
    pub fn http_client(&self) -> Result<reqwest::Client, QaError> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .use_rustls_tls()
            .build()
            .map_err(|err| QaError::Config(format!("http client: {err}")))
    }

    /// Builds the HTTP embedding provider, or `None` when no embedding
    /// endpoint is configured (mock/offline setups).
    pub fn embedding_provider(&self) -> Result<Option<HttpEmbeddingProvider>, QaError> {
        let Some(endpoint) = self.embedding_endpoint.clone() else {
            return Ok(None);
        };
        Ok(Some(HttpEmbeddingProvider::new(
            self.http_client()?,
            endpoint,
            self.api_key.clone(),
            self.embedding_model.clone(),
            self.embedding_dims,
        )))
    }

    /// Builds the HTTP completion provider, or `None` when no completion
    /// endpoint is configured.
    pub fn completion_provider(&self) -> Result<Option<HttpCompletionProvider>, QaError> {
        let Some(endpoint) = self.completion_endpoint.clone() else {
            return Ok(None);
        };
        Ok(Some(HttpCompletionProvider::new(
            self.http_client()?,
            endpoint,
            self.api_key.clone(),
            self.completion_model.clone(),
        )))
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn parse_url(name: &str, value: &str) -> Result<Url, QaError> {
    Url::parse(value).map_err(|err| QaError::Config(format!("{name}: {err}")))
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, QaError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|err| QaError::Config(format!("{name}: {err}")))
}
