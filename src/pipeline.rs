//! The question-answering façade.
//!
//! [`QaPipeline::ask`] is the entire surface the UI layer depends on. Each
//! call runs the same phases:
//!
//! ```text
//! validate ──► retrieve ──► score ──┬─► ShortCircuit ──► canned low-confidence answer
//!                                   └─► Synthesize ───► completion service
//!                                                         │
//!                                                         ├─ ok ──► answer + sources
//!                                                         └─ err ─► fallback answer + sources
//! ```
//!
//! Retrieval confidence gates generation: when the best hit is too far away
//! the language model is never called, bounding both cost and hallucination
//! risk on out-of-domain questions. The gate is an explicit
//! [`SynthesisDecision`] rather than an inline conditional so it can be
//! tested on its own.
//!
//! A generation failure after successful retrieval does not discard the work
//! already done: the result keeps the retrieved sources and carries a
//! fallback answer with zero confidence.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::embeddings::EmbeddingProvider;
use crate::index::{SearchHit, VectorIndex};
use crate::retrieval::{Retriever, DEFAULT_TOP_K};
use crate::scoring::{Confidence, ConfidenceScorer};
use crate::synthesis::{AnswerSynthesizer, CompletionProvider, SynthesisConfig};
use crate::types::{GenerationFailure, QaError};

/// Canned answer for questions the corpus has nothing relevant for.
pub const OUT_OF_SCOPE_ANSWER: &str = "I couldn't find information related to your question in \
     the support documentation. Could you rephrase it, or ask about something else?";

/// Fallback answer when the completion service answered with nothing usable.
pub const INSUFFICIENT_INFORMATION_ANSWER: &str = "The support documentation I found doesn't \
     contain enough information to answer that confidently. The sources below may still help.";

/// Fallback answer when the completion service was unreachable or timed out.
pub const GENERATION_UNAVAILABLE_ANSWER: &str = "I found relevant documentation but couldn't \
     generate an answer right now. Please try again; the sources below may help in the meantime.";

/// Source attribution for one retrieved chunk.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: Url,
    pub distance: f32,
}

impl From<&SearchHit> for Source {
    fn from(hit: &SearchHit) -> Self {
        Source {
            title: hit.chunk.title.clone(),
            url: hit.chunk.url.clone(),
            distance: hit.distance,
        }
    }
}

/// Final output of one `ask` call. Immutable once produced.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnswerResult {
    pub question: String,
    pub answer_text: String,
    /// Normalized confidence in [0, 1].
    pub confidence: f32,
    /// Attribution for the retrieved context, in hit order. Empty when the
    /// question was judged out of scope.
    pub sources: Vec<Source>,
    pub is_relevant: bool,
}

/// The confidence gate's verdict for one query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SynthesisDecision {
    /// Retrieval was too weak; answer without calling the language model.
    ShortCircuit,
    /// Retrieval cleared the threshold; synthesize from the hits.
    Synthesize,
}

impl SynthesisDecision {
    /// Derives the verdict from scored retrieval confidence.
    pub fn from_confidence(confidence: &Confidence) -> Self {
        if confidence.is_relevant {
            SynthesisDecision::Synthesize
        } else {
            SynthesisDecision::ShortCircuit
        }
    }
}

/// Retrieval-augmented question answering over an ingested corpus.
///
/// Holds only shared immutable state (`Arc`s and plain config), so a single
/// pipeline value serves concurrent `ask` calls without locking.
pub struct QaPipeline {
    retriever: Retriever,
    scorer: ConfidenceScorer,
    synthesizer: AnswerSynthesizer,
    top_k: usize,
}

impl QaPipeline {
    /// Starts building a pipeline.
    pub fn builder() -> QaPipelineBuilder {
        QaPipelineBuilder::default()
    }

    /// Answers `question` from the ingested corpus.
    ///
    /// Fails with [`QaError::InvalidInput`] on an empty question and
    /// [`QaError::EmptyIndex`] when no corpus has been ingested. Generation
    /// failures degrade to a labeled fallback result instead of an error.
    pub async fn ask(&self, question: &str) -> Result<AnswerResult, QaError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QaError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }

        let hits = self.retriever.retrieve(question, self.top_k).await?;
        let confidence = self.scorer.score(&hits);

        match SynthesisDecision::from_confidence(&confidence) {
            SynthesisDecision::ShortCircuit => {
                info!(
                    confidence = confidence.value,
                    "question judged out of scope, skipping generation"
                );
                Ok(AnswerResult {
                    question: question.to_string(),
                    answer_text: OUT_OF_SCOPE_ANSWER.to_string(),
                    confidence: confidence.value,
                    sources: Vec::new(),
                    is_relevant: false,
                })
            }
            SynthesisDecision::Synthesize => {
                let sources: Vec<Source> = hits.iter().map(Source::from).collect();
                match self.synthesizer.synthesize(question, &hits).await {
                    Ok(answer_text) => Ok(AnswerResult {
                        question: question.to_string(),
                        answer_text,
                        confidence: confidence.value,
                        sources,
                        is_relevant: true,
                    }),
                    Err(QaError::Generation { cause, message }) => {
                        warn!(%cause, %message, "generation failed, returning fallback answer");
                        let answer_text = match cause {
                            GenerationFailure::EmptyResponse => INSUFFICIENT_INFORMATION_ANSWER,
                            GenerationFailure::Timeout | GenerationFailure::Transport => {
                                GENERATION_UNAVAILABLE_ANSWER
                            }
                        };
                        Ok(AnswerResult {
                            question: question.to_string(),
                            answer_text: answer_text.to_string(),
                            confidence: 0.0,
                            sources,
                            is_relevant: true,
                        })
                    }
                    Err(other) => Err(other),
                }
            }
        }
    }
}

/// Builder for [`QaPipeline`].
#[derive(Default)]
pub struct QaPipelineBuilder {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    completion: Option<Arc<dyn CompletionProvider>>,
    index: Option<Arc<VectorIndex>>,
    scorer: Option<ConfidenceScorer>,
    synthesis: Option<SynthesisConfig>,
    top_k: Option<usize>,
}

impl QaPipelineBuilder {
    /// Embedding provider used for queries. Required.
    #[must_use]
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Completion provider used for synthesis. Required.
    #[must_use]
    pub fn completion(mut self, completion: Arc<dyn CompletionProvider>) -> Self {
        self.completion = Some(completion);
        self
    }

    /// The ingested corpus to serve. Required.
    #[must_use]
    pub fn index(mut self, index: Arc<VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Confidence calibration. Defaults to [`ConfidenceScorer::default`].
    #[must_use]
    pub fn scorer(mut self, scorer: ConfidenceScorer) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Synthesis tunables. Defaults to [`SynthesisConfig::default`].
    #[must_use]
    pub fn synthesis(mut self, config: SynthesisConfig) -> Self {
        self.synthesis = Some(config);
        self
    }

    /// Candidates fetched per query. Defaults to [`DEFAULT_TOP_K`].
    #[must_use]
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Takes scorer, synthesis, and top-K settings from a [`QaConfig`].
    #[must_use]
    pub fn with_config(self, config: &crate::config::QaConfig) -> Self {
        self.scorer(config.scorer)
            .synthesis(config.synthesis)
            .top_k(config.top_k)
    }

    /// Builds the pipeline, or `None` when a required component is missing.
    pub fn try_build(self) -> Option<QaPipeline> {
        let embedder = self.embedder?;
        let completion = self.completion?;
        let index = self.index?;
        Some(QaPipeline {
            retriever: Retriever::new(embedder, index),
            scorer: self.scorer.unwrap_or_default(),
            synthesizer: AnswerSynthesizer::new(completion, self.synthesis.unwrap_or_default()),
            top_k: self.top_k.unwrap_or(DEFAULT_TOP_K).max(1),
        })
    }

    /// Builds the pipeline.
    ///
    /// # Panics
    ///
    /// Panics when the embedder, completion provider, or index is missing.
    pub fn build(self) -> QaPipeline {
        self.try_build()
            .expect("QaPipelineBuilder requires embedder, completion, and index")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_follows_relevance() {
        let relevant = Confidence {
            value: 0.8,
            is_relevant: true,
        };
        let irrelevant = Confidence {
            value: 0.1,
            is_relevant: false,
        };
        assert_eq!(
            SynthesisDecision::from_confidence(&relevant),
            SynthesisDecision::Synthesize
        );
        assert_eq!(
            SynthesisDecision::from_confidence(&irrelevant),
            SynthesisDecision::ShortCircuit
        );
    }

    #[test]
    fn builder_requires_core_components() {
        assert!(QaPipeline::builder().try_build().is_none());
    }
}
