//! Content similarity: one query vector against every row of the current
//! feature matrix.
//!
//! Always computed against the matrix the caller just loaded, never
//! against the precomputed index, so it reflects the latest catalog.

use crate::cosine::{cosine_with_norms, norm};
use catalog::{FeatureMatrix, FeatureVector};
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, Default)]
pub struct ContentSimilarityScorer;

impl ContentSimilarityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Cosine similarity of `query` against every row of `matrix`.
    ///
    /// A zero query vector scores 0 against everything.
    pub fn score<'m>(&self, query: &FeatureVector, matrix: &'m FeatureMatrix) -> ContentScores<'m> {
        let query_norm = norm(query);
        let scores = matrix
            .features()
            .par_iter()
            .map(|row| cosine_with_norms(query, query_norm, row, norm(row)))
            .collect();

        ContentScores { matrix, scores }
    }
}

/// Per-song content scores, aligned with the matrix they were computed on
#[derive(Debug, Clone)]
pub struct ContentScores<'m> {
    matrix: &'m FeatureMatrix,
    scores: Vec<f64>,
}

impl ContentScores<'_> {
    /// Score of one song, `None` if it is not in the matrix
    pub fn get(&self, track_id: &str) -> Option<f64> {
        self.matrix.position(track_id).map(|i| self.scores[i])
    }

    /// Scores in matrix row order
    pub fn as_slice(&self) -> &[f64] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
