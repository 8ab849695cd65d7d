//! Answer synthesis from retrieved context.
//!
//! [`AnswerSynthesizer`] assembles a bounded context window from retrieved
//! chunks, renders a deterministic prompt, and asks a completion service for
//! the answer. The completion service is a black box behind the
//! [`CompletionProvider`] trait; [`HttpCompletionProvider`] speaks the
//! OpenAI-compatible `/chat/completions` wire format, which is what
//! Groq-style backends expose.
//!
//! Failures carry a typed cause ([`GenerationFailure`]) so the pipeline can
//! distinguish a timed-out call (retryable, sources are still useful) from a
//! service that answered with nothing.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::index::SearchHit;
use crate::types::{GenerationFailure, QaError};

/// Default sampling temperature; low to favor grounded answers over
/// creative ones.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Default response token budget.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Default context budget in characters.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 6000;

/// Text-generation capability consumed by the synthesizer.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Completes `prompt`, honoring the sampling temperature and response
    /// token budget. Implementations do not retry; callers decide.
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, QaError>;
}

// ---------------------------------------------------------------------------
// HTTP provider (OpenAI-compatible chat completions)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Completion provider backed by an OpenAI-compatible `/chat/completions`
/// endpoint.
///
/// Timeouts come from the [`Client`]'s configured request timeout and map to
/// [`GenerationFailure::Timeout`]; other request failures map to
/// [`GenerationFailure::Transport`]. A response without usable content maps
/// to [`GenerationFailure::EmptyResponse`].
#[derive(Clone)]
pub struct HttpCompletionProvider {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    model: String,
}

impl HttpCompletionProvider {
    pub fn new(
        client: Client,
        endpoint: Url,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            model: model.into(),
        }
    }

    fn map_request_error(err: reqwest::Error) -> QaError {
        let cause = if err.is_timeout() {
            GenerationFailure::Timeout
        } else {
            GenerationFailure::Transport
        };
        QaError::generation(cause, err.to_string())
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, QaError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
            max_tokens,
        };

        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(Self::map_request_error)?
            .error_for_status()
            .map_err(Self::map_request_error)?;

        let payload: ChatResponse = response.json().await.map_err(|err| {
            QaError::generation(GenerationFailure::EmptyResponse, err.to_string())
        })?;

        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(QaError::generation(
                GenerationFailure::EmptyResponse,
                "completion response contained no content",
            ));
        }
        Ok(content)
    }
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

/// Tunables for answer synthesis.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Maximum context size in characters. Chunks that would overflow the
    /// budget are dropped whole; a chunk is never cut mid-text.
    pub max_context_chars: usize,
    /// Sampling temperature passed to the completion service.
    pub temperature: f32,
    /// Response token budget passed to the completion service.
    pub max_tokens: u32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Builds prompts from retrieved context and delegates to a
/// [`CompletionProvider`].
pub struct AnswerSynthesizer {
    provider: std::sync::Arc<dyn CompletionProvider>,
    config: SynthesisConfig,
}

impl AnswerSynthesizer {
    pub fn new(provider: std::sync::Arc<dyn CompletionProvider>, config: SynthesisConfig) -> Self {
        Self { provider, config }
    }

    /// Synthesizes an answer for `question` from the retrieved hits.
    pub async fn synthesize(
        &self,
        question: &str,
        hits: &[SearchHit],
    ) -> Result<String, QaError> {
        let prompt = self.build_prompt(question, hits);
        debug!(
            prompt_chars = prompt.len(),
            hits = hits.len(),
            "requesting completion"
        );
        self.provider
            .complete(&prompt, self.config.temperature, self.config.max_tokens)
            .await
    }

    /// Renders the deterministic prompt: context blocks in hit order, then
    /// the question, then the grounding instructions.
    pub fn build_prompt(&self, question: &str, hits: &[SearchHit]) -> String {
        let context = self.build_context(hits);
        format!(
            "You are a helpful customer support assistant. Answer the user's \
             question using only the context below.\n\n\
             CONTEXT:\n{context}\n\
             USER QUESTION: {question}\n\n\
             INSTRUCTIONS:\n\
             1. Answer based only on the provided context.\n\
             2. Be specific and helpful.\n\
             3. If the context does not contain enough information to answer, \
             say so plainly instead of guessing.\n\
             4. Keep the tone friendly and professional.\n\n\
             ANSWER:"
        )
    }

    /// Concatenates chunk texts in hit order up to the context budget.
    /// Excess chunks are dropped whole.
    fn build_context(&self, hits: &[SearchHit]) -> String {
        let mut parts = Vec::new();
        let mut used = 0usize;
        for (i, hit) in hits.iter().enumerate() {
            let block = format!("Context {}:\n{}\n", i + 1, hit.chunk.text);
            if used + block.len() > self.config.max_context_chars && !parts.is_empty() {
                break;
            }
            used += block.len();
            parts.push(block);
        }
        parts.join("\n")
    }
}
