//! Sliding-window document chunking.
//!
//! Documents are split into overlapping windows of whole words. The window
//! advances by `max_chunk_size - overlap` words per step, so consecutive
//! chunks from the same document share exactly `overlap` words. The final
//! chunk may be shorter than the window; a document shorter than the window
//! produces exactly one chunk.
//!
//! Word boundaries come from Unicode segmentation rather than naive
//! whitespace splitting, so punctuation-adjacent words are windowed cleanly.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;
use url::Url;
use uuid::Uuid;

use crate::types::QaError;

/// Window parameters for the chunker, counted in words.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum number of words per chunk.
    pub max_chunk_size: usize,
    /// Number of words shared between consecutive chunks.
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        // Window sizes carried over from the original corpus preparation.
        Self {
            max_chunk_size: 500,
            overlap: 50,
        }
    }
}

impl ChunkerConfig {
    fn validate(&self) -> Result<(), QaError> {
        if self.max_chunk_size == 0 {
            return Err(QaError::InvalidInput(
                "max_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.overlap >= self.max_chunk_size {
            return Err(QaError::InvalidInput(format!(
                "overlap ({}) must be smaller than max_chunk_size ({})",
                self.overlap, self.max_chunk_size
            )));
        }
        Ok(())
    }
}

/// A bounded slice of a source document, the unit of retrieval.
///
/// Carries the source url and title so search hits can be attributed without
/// a separate document lookup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier for this chunk.
    pub id: Uuid,
    /// Identifier of the source document.
    pub document_id: String,
    /// Source page url.
    pub url: Url,
    /// Source page title.
    pub title: String,
    /// The chunk text.
    pub text: String,
    /// Byte offset of the chunk within the source document's text.
    pub start_offset: usize,
    /// Zero-based position of this chunk within its document.
    pub chunk_index: usize,
}

/// Splits `text` into overlapping word windows.
///
/// Returns chunks in document order. Empty or whitespace-only text produces
/// no chunks. Fails with [`QaError::InvalidInput`] when the window parameters
/// are unusable.
pub fn chunk_document(
    document_id: &str,
    url: &Url,
    title: &str,
    text: &str,
    config: &ChunkerConfig,
) -> Result<Vec<Chunk>, QaError> {
    config.validate()?;

    let words: Vec<(usize, &str)> = text.unicode_word_indices().collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let stride = config.max_chunk_size - config.overlap;
    let mut chunks = Vec::new();
    let mut start = 0usize;

    loop {
        let end = (start + config.max_chunk_size).min(words.len());
        let (first_offset, _) = words[start];
        let (last_offset, last_word) = words[end - 1];
        let chunk_text = &text[first_offset..last_offset + last_word.len()];

        chunks.push(Chunk {
            id: Uuid::new_v4(),
            document_id: document_id.to_string(),
            url: url.clone(),
            title: title.to_string(),
            text: chunk_text.to_string(),
            start_offset: first_offset,
            chunk_index: chunks.len(),
        });

        if end == words.len() {
            break;
        }
        start += stride;
    }

    Ok(chunks)
}
