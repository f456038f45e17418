//! Collaborative similarity index.
//!
//! A precomputed all-pairs cosine similarity matrix over one catalog
//! snapshot. Built once, read-only afterwards, so it can be shared across
//! requests without locking.
//!
//! ## Invariants
//! - square, indexed on both axes by the snapshot's track ids
//! - symmetric: `sim(a, b) == sim(b, a)`
//! - diagonal is exactly 1.0
//! - every entry lies in [-1, 1]
//!
//! The index does not follow later catalog writes. Owners rebuild it.

use crate::cosine::{cosine_with_norms, norm};
use catalog::{FeatureMatrix, TrackId};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Default)]
pub struct CollaborativeSimilarityIndex {
    ids: Vec<TrackId>,
    positions: HashMap<TrackId, usize>,
    /// Row-major `n * n` similarities
    values: Vec<f64>,
}

impl CollaborativeSimilarityIndex {
    /// Compute pairwise cosine similarity for every pair of rows.
    ///
    /// O(n²) time and space. Rows are computed in parallel; each entry is
    /// a pure function of its two vectors, so the result is exactly
    /// symmetric.
    #[instrument(skip(matrix), fields(songs = matrix.len()))]
    pub fn build(matrix: &FeatureMatrix) -> Self {
        let rows = matrix.features();
        let n = rows.len();
        let norms: Vec<f64> = rows.iter().map(norm).collect();
        let norms = norms.as_slice();

        let values: Vec<f64> = (0..n)
            .into_par_iter()
            .flat_map_iter(move |i| {
                (0..n).map(move |j| {
                    if i == j {
                        1.0
                    } else {
                        cosine_with_norms(&rows[i], norms[i], &rows[j], norms[j])
                    }
                })
            })
            .collect();

        let ids: Vec<TrackId> = matrix.info().iter().map(|i| i.track_id.clone()).collect();
        let positions = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        debug!("Built collaborative index with {} entries", values.len());
        Self {
            ids,
            positions,
            values,
        }
    }

    /// Number of songs covered
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Track ids in index order
    pub fn track_ids(&self) -> &[TrackId] {
        &self.ids
    }

    /// Similarity of two indexed songs, `None` if either is unknown
    pub fn similarity(&self, a: &str, b: &str) -> Option<f64> {
        let i = *self.positions.get(a)?;
        let j = *self.positions.get(b)?;
        Some(self.values[i * self.len() + j])
    }

    /// The similarity row of a song, `None` if the index has never seen it.
    ///
    /// Callers treat `None` as all-zero.
    pub fn similarity_of(&self, track_id: &str) -> Option<SimilarityRow<'_>> {
        let row = *self.positions.get(track_id)?;
        Some(SimilarityRow { index: self, row })
    }
}

/// One row of the index, borrowed
#[derive(Debug, Clone, Copy)]
pub struct SimilarityRow<'a> {
    index: &'a CollaborativeSimilarityIndex,
    row: usize,
}

impl<'a> SimilarityRow<'a> {
    /// Similarity to `track_id`, 0.0 for ids outside the index
    pub fn get(&self, track_id: &str) -> f64 {
        self.index
            .positions
            .get(track_id)
            .map(|&j| self.values()[j])
            .unwrap_or(0.0)
    }

    /// Raw values in index order
    pub fn values(&self) -> &'a [f64] {
        let n = self.index.len();
        &self.index.values[self.row * n..(self.row + 1) * n]
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        self.index
            .ids
            .iter()
            .map(|id| id.as_str())
            .zip(self.values().iter().copied())
    }
}
