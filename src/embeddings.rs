//! Embedding providers.
//!
//! The pipeline treats embedding as an external capability behind the
//! [`EmbeddingProvider`] trait: a batch of texts in, one fixed-dimension
//! vector per text out, in input order. Dimensionality is a contract agreed
//! with the vector index at construction time; the index rejects vectors of
//! any other length.
//!
//! Two implementations ship with the crate:
//!
//! - [`HttpEmbeddingProvider`] calls an OpenAI-compatible `/embeddings`
//!   endpoint over HTTPS.
//! - [`MockEmbeddingProvider`] derives deterministic vectors from a text
//!   hash, for tests and offline runs.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::QaError;

/// Default embedding dimensionality, matching all-MiniLM-class models.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Maps text to fixed-dimension dense vectors.
///
/// Implementations must be deterministic (same text, same vector) and must
/// return batch results in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embedding dimensionality produced by this provider.
    fn dims(&self) -> usize;

    /// Embeds a batch of texts, one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, QaError>;

    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, QaError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| QaError::Embedding("provider returned no vectors".to_string()))
    }
}

// ---------------------------------------------------------------------------
// HTTP provider (OpenAI-compatible wire format)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

/// Embedding provider backed by an OpenAI-compatible `/embeddings` endpoint.
#[derive(Clone)]
pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    model: String,
    dims: usize,
}

impl HttpEmbeddingProvider {
    /// Creates a provider for the given endpoint and model.
    ///
    /// `endpoint` is the full `/embeddings` URL. `dims` must match what the
    /// remote model actually produces; responses of any other length are
    /// rejected as a [`QaError::DimensionMismatch`].
    pub fn new(
        client: Client,
        endpoint: Url,
        api_key: Option<String>,
        model: impl Into<String>,
        dims: usize,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            model: model.into(),
            dims,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, QaError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbeddingsRequest {
            model: &self.model,
            input: texts,
        };

        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| QaError::Embedding(err.to_string()))?
            .error_for_status()
            .map_err(|err| QaError::Embedding(err.to_string()))?;

        let mut payload: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|err| QaError::Embedding(err.to_string()))?;

        if payload.data.len() != texts.len() {
            return Err(QaError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                payload.data.len()
            )));
        }

        // The wire format carries an explicit index per item; order by it
        // rather than trusting response order.
        payload.data.sort_by_key(|item| item.index);

        let mut vectors = Vec::with_capacity(payload.data.len());
        for item in payload.data {
            if item.embedding.len() != self.dims {
                return Err(QaError::DimensionMismatch {
                    expected: self.dims,
                    actual: item.embedding.len(),
                });
            }
            vectors.push(item.embedding);
        }
        Ok(vectors)
    }
}

// ---------------------------------------------------------------------------
// Mock provider
// ---------------------------------------------------------------------------

/// Deterministic embedding provider for tests and offline runs.
///
/// Vectors are derived from a hash of the input text: identical texts map to
/// identical vectors, different texts almost surely differ. The vectors carry
/// no semantic signal.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    dims: usize,
}

impl MockEmbeddingProvider {
    /// Creates a provider with the default dimensionality.
    pub fn new() -> Self {
        Self::with_dims(DEFAULT_EMBEDDING_DIM)
    }

    /// Creates a provider producing vectors of the given length.
    pub fn with_dims(dims: usize) -> Self {
        Self { dims }
    }

    fn hash_to_vec(&self, text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();
        (0..self.dims)
            .map(|i| {
                let bits = seed.rotate_left((i % 64) as u32) ^ ((i as u64) << 17);
                (bits as f32) / (u64::MAX as f32)
            })
            .collect()
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, QaError> {
        Ok(texts.iter().map(|text| self.hash_to_vec(text)).collect())
    }
}
