//! Retrieval-augmented question answering over scraped support documents.
//!
//! ```text
//! Scraper output ──► ingest::Ingestor ──► chunking (sliding window)
//!                                    │
//!                                    ├─► embeddings::EmbeddingProvider
//!                                    └─► index::VectorIndex ──► persist / load
//!
//! Question ──► pipeline::QaPipeline::ask
//!                 ├─► retrieval::Retriever (embed + top-K search)
//!                 ├─► scoring::ConfidenceScorer (gate)
//!                 └─► synthesis::AnswerSynthesizer ──► CompletionProvider
//!                         │
//!                         └──► AnswerResult { answer, confidence, sources }
//! ```
//!
//! The index is built once offline and immutable while serving; every `ask`
//! call is independent, so one pipeline value can serve concurrent callers.

pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod ingest;
pub mod pipeline;
pub mod retrieval;
pub mod scoring;
pub mod synthesis;
pub mod types;

pub use chunking::{chunk_document, Chunk, ChunkerConfig};
pub use config::QaConfig;
pub use embeddings::{
    EmbeddingProvider, HttpEmbeddingProvider, MockEmbeddingProvider, DEFAULT_EMBEDDING_DIM,
};
pub use index::{EmbeddedChunk, LoadOutcome, SearchHit, VectorIndex};
pub use ingest::{load_or_ingest, Document, IngestReport, Ingestor};
pub use pipeline::{AnswerResult, QaPipeline, Source, SynthesisDecision};
pub use retrieval::{Retriever, DEFAULT_TOP_K};
pub use scoring::{Confidence, ConfidenceScorer};
pub use synthesis::{
    AnswerSynthesizer, CompletionProvider, HttpCompletionProvider, SynthesisConfig,
};
pub use types::{GenerationFailure, QaError};
