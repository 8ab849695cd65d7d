//! Flat nearest-neighbor vector index.
//!
//! A [`VectorIndex`] owns the embedded corpus for the lifetime of the
//! process. It is built once during ingestion and immutable afterwards, so
//! concurrent searches need no locking; rebuilding means constructing a new
//! index and swapping it in, never mutating in place.
//!
//! Search is an exhaustive scan ranked by squared Euclidean distance, which
//! is exact and plenty fast at support-corpus scale. Ties are broken by
//! insertion order (stable sort).
//!
//! Persistence is a single JSON snapshot written atomically (temp file plus
//! rename), so a failed write never clobbers an existing index. Loading a
//! missing snapshot is not an error: [`VectorIndex::load`] returns a tagged
//! [`LoadOutcome`] so callers get an explicit decision point for the
//! "load or rebuild" fallback.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::chunking::Chunk;
use crate::types::QaError;

/// A chunk paired with its embedding vector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// One search result: a chunk and its squared Euclidean distance to the
/// query. Lower is more similar.
#[derive(Clone, Debug)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Result of attempting to load a persisted index.
#[derive(Debug)]
pub enum LoadOutcome {
    /// A snapshot existed and was loaded.
    Loaded(VectorIndex),
    /// No snapshot exists at the given path; the caller should ingest.
    NotFound,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    dims: usize,
    chunks: Vec<EmbeddedChunk>,
}

/// Flat, immutable-after-build vector index.
#[derive(Clone, Debug)]
pub struct VectorIndex {
    dims: usize,
    entries: Vec<EmbeddedChunk>,
}

impl VectorIndex {
    /// Builds an index from embedded chunks.
    ///
    /// Every vector must have length `dims`; a mismatch is a configuration
    /// bug and fails the build with [`QaError::DimensionMismatch`].
    pub fn build(dims: usize, chunks: Vec<EmbeddedChunk>) -> Result<Self, QaError> {
        for entry in &chunks {
            if entry.vector.len() != dims {
                return Err(QaError::DimensionMismatch {
                    expected: dims,
                    actual: entry.vector.len(),
                });
            }
        }
        debug!(dims, entries = chunks.len(), "built vector index");
        Ok(Self {
            dims,
            entries: chunks,
        })
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no vectors are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding dimensionality this index was built for.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Returns the `k` nearest chunks to `query`, ascending by squared
    /// Euclidean distance, ties broken by insertion order.
    ///
    /// Returns fewer than `k` hits only when the index holds fewer entries.
    /// Fails with [`QaError::EmptyIndex`] when nothing has been ingested and
    /// [`QaError::DimensionMismatch`] when the query has the wrong length.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, QaError> {
        if self.entries.is_empty() {
            return Err(QaError::EmptyIndex);
        }
        if query.len() != self.dims {
            return Err(QaError::DimensionMismatch {
                expected: self.dims,
                actual: query.len(),
            });
        }

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                chunk: entry.chunk.clone(),
                distance: squared_l2(query, &entry.vector),
            })
            .collect();

        // Stable sort keeps insertion order for equal distances.
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    /// Writes the index to `path` as a JSON snapshot.
    ///
    /// The snapshot is written to a sibling temp file first and renamed into
    /// place, so an interrupted write leaves any previous snapshot intact.
    pub async fn persist(&self, path: impl AsRef<Path>) -> Result<(), QaError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let snapshot = Snapshot {
            dims: self.dims,
            chunks: self.entries.clone(),
        };
        let serialized =
            serde_json::to_vec(&snapshot).map_err(|err| QaError::Storage(err.to_string()))?;

        let tmp_path = temp_sibling(path);
        if let Err(err) = fs::write(&tmp_path, &serialized).await {
            // Drop the partial artifact before reporting.
            let _ = fs::remove_file(&tmp_path).await;
            return Err(QaError::Io(err));
        }
        if let Err(err) = fs::rename(&tmp_path, path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(QaError::Io(err));
        }

        info!(path = %path.display(), entries = self.entries.len(), "persisted vector index");
        Ok(())
    }

    /// Loads a persisted index, or reports that none exists.
    pub async fn load(path: impl AsRef<Path>) -> Result<LoadOutcome, QaError> {
        let path = path.as_ref();
        let data = match fs::read(path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LoadOutcome::NotFound);
            }
            Err(err) => return Err(QaError::Io(err)),
        };

        let snapshot: Snapshot =
            serde_json::from_slice(&data).map_err(|err| QaError::Storage(err.to_string()))?;
        let index = VectorIndex::build(snapshot.dims, snapshot.chunks)?;
        info!(path = %path.display(), entries = index.len(), "loaded vector index");
        Ok(LoadOutcome::Loaded(index))
    }

    /// Loads a persisted index, failing with [`QaError::IndexNotFound`] when
    /// no snapshot exists.
    pub async fn load_required(path: impl AsRef<Path>) -> Result<VectorIndex, QaError> {
        let path = path.as_ref();
        match Self::load(path).await? {
            LoadOutcome::Loaded(index) => Ok(index),
            LoadOutcome::NotFound => Err(QaError::IndexNotFound {
                path: path.to_path_buf(),
            }),
        }
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string());
    name.push_str(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;
    use uuid::Uuid;

    fn make_chunk(label: &str) -> Chunk {
        Chunk {
            id: Uuid::new_v4(),
            document_id: format!("doc-{label}"),
            url: Url::parse("https://support.example.com/page").unwrap(),
            title: label.to_string(),
            text: format!("content for {label}"),
            start_offset: 0,
            chunk_index: 0,
        }
    }

    fn entry(label: &str, vector: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk {
            chunk: make_chunk(label),
            vector,
        }
    }

    #[test]
    fn search_orders_by_ascending_distance() {
        let index = VectorIndex::build(
            2,
            vec![
                entry("far", vec![3.0, 4.0]),
                entry("near", vec![0.1, 0.0]),
                entry("mid", vec![1.0, 1.0]),
            ],
        )
        .unwrap();

        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        let titles: Vec<&str> = hits.iter().map(|h| h.chunk.title.as_str()).collect();
        assert_eq!(titles, vec!["near", "mid", "far"]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let index = VectorIndex::build(
            1,
            vec![
                entry("first", vec![1.0]),
                entry("second", vec![-1.0]),
                entry("third", vec![1.0]),
            ],
        )
        .unwrap();

        // All three are at squared distance 1 from the origin.
        let hits = index.search(&[0.0], 3).unwrap();
        let titles: Vec<&str> = hits.iter().map(|h| h.chunk.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn search_returns_at_most_index_size() {
        let index = VectorIndex::build(1, vec![entry("only", vec![0.5])]).unwrap();
        let hits = index.search(&[0.0], 5).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn empty_index_fails_search() {
        let index = VectorIndex::build(4, Vec::new()).unwrap();
        assert!(matches!(
            index.search(&[0.0; 4], 3),
            Err(QaError::EmptyIndex)
        ));
    }

    #[test]
    fn wrong_query_dimension_is_rejected() {
        let index = VectorIndex::build(2, vec![entry("a", vec![0.0, 0.0])]).unwrap();
        assert!(matches!(
            index.search(&[0.0; 3], 1),
            Err(QaError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn wrong_vector_dimension_fails_build() {
        let result = VectorIndex::build(3, vec![entry("bad", vec![0.0, 0.0])]);
        assert!(matches!(
            result,
            Err(QaError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[tokio::test]
    async fn persist_then_load_round_trips_search_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let index = VectorIndex::build(
            2,
            vec![
                entry("alpha", vec![0.0, 1.0]),
                entry("beta", vec![1.0, 0.0]),
                entry("gamma", vec![0.7, 0.7]),
            ],
        )
        .unwrap();
        index.persist(&path).await.unwrap();

        let loaded = match VectorIndex::load(&path).await.unwrap() {
            LoadOutcome::Loaded(loaded) => loaded,
            LoadOutcome::NotFound => panic!("snapshot should exist"),
        };
        assert_eq!(loaded.len(), index.len());
        assert_eq!(loaded.dims(), index.dims());

        for probe in [[0.0, 0.9], [0.9, 0.1], [0.5, 0.5]] {
            let before = index.search(&probe, 3).unwrap();
            let after = loaded.search(&probe, 3).unwrap();
            let ids_before: Vec<_> = before.iter().map(|h| h.chunk.id).collect();
            let ids_after: Vec<_> = after.iter().map(|h| h.chunk.id).collect();
            assert_eq!(ids_before, ids_after);
            for (b, a) in before.iter().zip(after.iter()) {
                assert!((b.distance - a.distance).abs() < f32::EPSILON);
            }
        }
    }

    #[tokio::test]
    async fn failed_persist_leaves_no_temp_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("index.json");
        // A directory at the target path makes the final rename fail.
        fs::create_dir(&target).await.unwrap();

        let index = VectorIndex::build(1, vec![entry("only", vec![0.5])]).unwrap();
        let err = index.persist(&target).await.unwrap_err();
        assert!(matches!(err, QaError::Io(_)));
        assert!(
            !dir.path().join("index.json.tmp").exists(),
            "a failed persist must not leave a partial temp file behind"
        );
    }

    #[tokio::test]
    async fn load_missing_snapshot_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(matches!(
            VectorIndex::load(&path).await.unwrap(),
            LoadOutcome::NotFound
        ));
        assert!(matches!(
            VectorIndex::load_required(&path).await,
            Err(QaError::IndexNotFound { .. })
        ));
    }
}
