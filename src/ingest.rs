//! Offline ingestion: documents in, searchable index out.
//!
//! Ingestion and serving are mutually exclusive phases. The [`Ingestor`]
//! consumes the scraper's output once, chunks and embeds it, and hands back
//! an immutable [`VectorIndex`] for the serving side. Rebuilding a corpus
//! means running ingestion again and swapping the new index in.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::chunking::{chunk_document, Chunk, ChunkerConfig};
use crate::embeddings::EmbeddingProvider;
use crate::index::{EmbeddedChunk, LoadOutcome, VectorIndex};
use crate::types::QaError;

/// A raw scraped document, as produced by the external scraper.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub url: Url,
    pub title: String,
    pub text: String,
}

/// Summary of one ingestion run.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct IngestReport {
    /// Documents consumed.
    pub documents: usize,
    /// Chunks embedded and stored.
    pub chunks: usize,
    /// Documents skipped because they produced no chunks.
    pub skipped_documents: usize,
}

/// Chunks and embeds documents into a [`VectorIndex`].
pub struct Ingestor {
    chunker: ChunkerConfig,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Ingestor {
    pub fn new(chunker: ChunkerConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { chunker, embedder }
    }

    /// Runs the full chunk → embed → build pipeline over `documents`.
    ///
    /// Chunk window validation errors and dimension mismatches abort the run;
    /// ingestion is the place to catch configuration bugs, not serving.
    pub async fn ingest(
        &self,
        documents: &[Document],
    ) -> Result<(VectorIndex, IngestReport), QaError> {
        let mut report = IngestReport::default();
        let mut entries: Vec<EmbeddedChunk> = Vec::new();

        for document in documents {
            report.documents += 1;
            let chunks = chunk_document(
                &document.id,
                &document.url,
                &document.title,
                &document.text,
                &self.chunker,
            )?;

            if chunks.is_empty() {
                report.skipped_documents += 1;
                warn!(document = %document.id, "document produced no chunks, skipping");
                continue;
            }

            let embedded = self.embed_chunks(chunks).await?;
            let chunk_count = embedded.len();
            report.chunks += chunk_count;
            entries.extend(embedded);
            info!(document = %document.id, chunks = chunk_count, "ingested document");
        }

        let index = VectorIndex::build(self.embedder.dims(), entries)?;
        info!(
            documents = report.documents,
            chunks = report.chunks,
            skipped = report.skipped_documents,
            "ingestion complete"
        );
        Ok((index, report))
    }

    async fn embed_chunks(&self, chunks: Vec<Chunk>) -> Result<Vec<EmbeddedChunk>, QaError> {
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(QaError::Embedding(format!(
                "embedded {} of {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }
        Ok(chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddedChunk { chunk, vector })
            .collect())
    }
}

/// Loads a persisted index when one exists, otherwise ingests `documents`
/// and persists the freshly built index before returning it.
pub async fn load_or_ingest(
    path: impl AsRef<Path>,
    documents: &[Document],
    ingestor: &Ingestor,
) -> Result<VectorIndex, QaError> {
    let path = path.as_ref();
    match VectorIndex::load(path).await? {
        LoadOutcome::Loaded(index) => Ok(index),
        LoadOutcome::NotFound => {
            info!(path = %path.display(), "no persisted index, ingesting");
            let (index, _report) = ingestor.ingest(documents).await?;
            index.persist(path).await?;
            Ok(index)
        }
    }
}
