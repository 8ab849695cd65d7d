//! Query-side retrieval: embed the question, search the index.

use std::sync::Arc;

use tracing::debug;

use crate::embeddings::EmbeddingProvider;
use crate::index::{SearchHit, VectorIndex};
use crate::types::QaError;

/// Default number of candidate chunks fetched per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Embeds questions and fetches top-K candidates from the index.
///
/// Pure composition over [`EmbeddingProvider`] and [`VectorIndex`]; holds no
/// state of its own, so concurrent `retrieve` calls are independent.
/// [`QaError::EmptyIndex`] propagates unchanged — it is the "no data loaded"
/// condition the pipeline surfaces distinctly from a generation failure.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// The index this retriever searches.
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Returns the `k` chunks closest to `question`, ascending by distance.
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<SearchHit>, QaError> {
        let query = self.embedder.embed(question).await?;
        let hits = self.index.search(&query, k)?;
        debug!(
            k,
            returned = hits.len(),
            best_distance = hits.first().map(|h| h.distance),
            "retrieved candidates"
        );
        Ok(hits)
    }
}
