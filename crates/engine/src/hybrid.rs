//! # Hybrid Scorer
//!
//! Blends content and collaborative similarity into one ranking:
//! 1. Reload the catalog (fresh read every call)
//! 2. Resolve the query song: catalog first, external lookup second
//! 3. Content scores: query vector against the fresh matrix
//! 4. Collaborative scores: the query's row of the precomputed index
//! 5. `hybrid = 0.7 * content + 0.3 * collaborative` for every catalog song
//! 6. Drop the query song itself (by track id, catalog queries only)
//! 7. Stable sort descending, keep the top 5
//!
//! The collaborative index is built once and only changes through
//! `rebuild_index`. Callers that write to the catalog call it afterwards.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument};

use catalog::{CatalogReader, FeatureMatrix, FeatureStore, Song};
use similarity::{CollaborativeSimilarityIndex, ContentSimilarityScorer};

use crate::error::Result;
use crate::fallback::ExternalLookup;

/// Weight of the content signal
pub const CONTENT_WEIGHT: f64 = 0.7;

/// Weight of the collaborative signal
pub const COLLABORATIVE_WEIGHT: f64 = 0.3;

/// Most recommendations returned per request
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Final recommendation returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub name: String,
    pub artist: String,
    pub score: f64,
}

/// A ranked candidate with both signals kept for explanation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub track_id: String,
    pub name: String,
    pub artist: String,
    pub content: f64,
    pub collaborative: f64,
    pub hybrid: f64,
}

impl From<ScoredCandidate> for Recommendation {
    fn from(c: ScoredCandidate) -> Self {
        Self {
            name: c.name,
            artist: c.artist,
            score: c.hybrid,
        }
    }
}

/// Where a query song was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QueryOrigin {
    Catalog,
    External,
}

/// A resolved query song
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    pub song: Song,
    pub origin: QueryOrigin,
}

/// Weighted convex combination of the two signals
pub fn blend(content: f64, collaborative: f64) -> f64 {
    CONTENT_WEIGHT * content + COLLABORATIVE_WEIGHT * collaborative
}

/// Main entry point of the recommender
pub struct HybridScorer<R: CatalogReader> {
    store: FeatureStore<R>,
    index: CollaborativeSimilarityIndex,
    content: ContentSimilarityScorer,
    lookup: Box<dyn ExternalLookup>,
}

impl<R: CatalogReader> HybridScorer<R> {
    /// Load the catalog once and build the collaborative index from it
    pub fn new(store: FeatureStore<R>, lookup: impl ExternalLookup + 'static) -> Result<Self> {
        let start = Instant::now();
        let matrix = store.load()?;
        let index = CollaborativeSimilarityIndex::build(&matrix);
        info!(
            "Collaborative index built for {} songs in {:.2?}",
            index.len(),
            start.elapsed()
        );

        Ok(Self::with_index(store, index, lookup))
    }

    /// Assemble a scorer around an index built elsewhere
    pub fn with_index(
        store: FeatureStore<R>,
        index: CollaborativeSimilarityIndex,
        lookup: impl ExternalLookup + 'static,
    ) -> Self {
        Self {
            store,
            index,
            content: ContentSimilarityScorer::new(),
            lookup: Box::new(lookup),
        }
    }

    /// Reload the catalog and replace the collaborative index.
    ///
    /// Needs `&mut self`, so it cannot run while a `recommend` borrow is live.
    pub fn rebuild_index(&mut self) -> Result<()> {
        let matrix = self.store.load()?;
        self.index = CollaborativeSimilarityIndex::build(&matrix);
        info!("Collaborative index rebuilt for {} songs", self.index.len());
        Ok(())
    }

    pub fn index(&self) -> &CollaborativeSimilarityIndex {
        &self.index
    }

    /// Number of songs the collaborative index covers
    pub fn index_len(&self) -> usize {
        self.index.len()
    }

    pub fn store(&self) -> &FeatureStore<R> {
        &self.store
    }

    /// Up to `MAX_RECOMMENDATIONS` songs similar to `name`.
    ///
    /// An unknown song yields an empty list. Only an unreadable catalog is
    /// an error.
    pub fn recommend(&self, name: &str) -> Result<Vec<Recommendation>> {
        Ok(self
            .recommend_detailed(name)?
            .into_iter()
            .map(Recommendation::from)
            .collect())
    }

    /// Same as `recommend`, keeping the per-signal scores
    #[instrument(skip(self))]
    pub fn recommend_detailed(&self, name: &str) -> Result<Vec<ScoredCandidate>> {
        let start = Instant::now();

        let matrix = self.store.load()?;
        debug!("Loaded {} catalog songs", matrix.len());

        let Some(query) = self.resolve(&matrix, name) else {
            info!("Song {:?} not found in catalog or external provider", name);
            return Ok(Vec::new());
        };
        debug!(
            "Resolved {:?} to {} ({:?})",
            name, query.song.track_id, query.origin
        );

        let mut candidates = self.score_candidates(&matrix, &query);
        candidates.sort_by(|a, b| b.hybrid.total_cmp(&a.hybrid));
        candidates.truncate(MAX_RECOMMENDATIONS);

        info!(
            "Selected {} recommendations for {:?} in {:.2?}",
            candidates.len(),
            name,
            start.elapsed()
        );
        Ok(candidates)
    }

    /// Resolve a song name: catalog first, then the external lookup
    pub fn resolve(&self, matrix: &FeatureMatrix, name: &str) -> Option<ResolvedQuery> {
        if name.trim().is_empty() {
            return None;
        }
        if let Some(song) = matrix.find_by_name(name) {
            return Some(ResolvedQuery {
                song,
                origin: QueryOrigin::Catalog,
            });
        }

        debug!("{:?} not in catalog, trying external lookup", name);
        self.lookup.resolve(name).map(|song| ResolvedQuery {
            song,
            origin: QueryOrigin::External,
        })
    }

    /// Score every catalog song against `query`, in catalog order.
    ///
    /// The query song is left out only when it came from the catalog;
    /// an externally resolved song is not in the index, so its
    /// collaborative score is 0 for everyone and no row is its own.
    pub fn score_candidates(
        &self,
        matrix: &FeatureMatrix,
        query: &ResolvedQuery,
    ) -> Vec<ScoredCandidate> {
        let content = self
            .content
            .score(&query.song.features.to_vector(), matrix);
        let collab = match query.origin {
            QueryOrigin::Catalog => self.index.similarity_of(&query.song.track_id),
            QueryOrigin::External => None,
        };
        let exclude = match query.origin {
            QueryOrigin::Catalog => Some(query.song.track_id.as_str()),
            QueryOrigin::External => None,
        };

        matrix
            .info()
            .iter()
            .zip(content.as_slice())
            .filter(|(info, _)| exclude != Some(info.track_id.as_str()))
            .map(|(info, &content)| {
                let collaborative = collab.map(|row| row.get(&info.track_id)).unwrap_or(0.0);
                ScoredCandidate {
                    track_id: info.track_id.clone(),
                    name: info.name.clone(),
                    artist: info.artist.clone(),
                    content,
                    collaborative,
                    hybrid: blend(content, collaborative),
                }
            })
            .collect()
    }
}
