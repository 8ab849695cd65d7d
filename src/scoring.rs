//! Retrieval confidence scoring.
//!
//! Converts the distance of the best (closest) hit into a confidence value
//! in [0, 1] and a relevance decision. The mapping is
//! `confidence = 1 / (1 + distance / distance_scale)`: strictly decreasing
//! in distance, 1 at distance zero, saturating towards 0 as distance grows.
//! The scale and the relevance threshold are empirical tuning values, not
//! contract; both live in [`ConfidenceScorer`] as plain configuration.

use serde::{Deserialize, Serialize};

use crate::index::SearchHit;

/// Default scale applied to distances before the confidence mapping.
pub const DEFAULT_DISTANCE_SCALE: f32 = 1.0;

/// Default confidence threshold below which retrieval is considered
/// irrelevant.
pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.3;

/// Confidence derived from retrieval distances.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    /// Normalized confidence in [0, 1].
    pub value: f32,
    /// Whether the retrieval cleared the relevance threshold.
    pub is_relevant: bool,
}

/// Maps retrieval distances to a normalized confidence.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ConfidenceScorer {
    pub distance_scale: f32,
    pub relevance_threshold: f32,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self {
            distance_scale: DEFAULT_DISTANCE_SCALE,
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
        }
    }
}

impl ConfidenceScorer {
    /// Scores a ranked hit list. Only the best hit contributes; an empty
    /// list scores zero confidence and is never relevant.
    pub fn score(&self, hits: &[SearchHit]) -> Confidence {
        let Some(best) = hits.first() else {
            return Confidence {
                value: 0.0,
                is_relevant: false,
            };
        };
        let value = self.confidence_for_distance(best.distance);
        Confidence {
            value,
            is_relevant: value >= self.relevance_threshold,
        }
    }

    /// The raw distance-to-confidence mapping.
    pub fn confidence_for_distance(&self, distance: f32) -> f32 {
        let scaled = (distance / self.distance_scale).max(0.0);
        (1.0 / (1.0 + scaled)).clamp(0.0, 1.0)
    }
}
