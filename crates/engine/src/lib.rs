//! Engine crate for the hybrid song recommender.
//!
//! This crate contains the scorer that turns a song name into ranked
//! recommendations, and the external lookup it falls back on.

pub mod error;
pub mod fallback;
pub mod hybrid;

pub use error::{RecommendError, Result};
pub use fallback::{ExternalLookup, ExternalLookupFallback, NoExternalLookup};
pub use hybrid::{
    COLLABORATIVE_WEIGHT, CONTENT_WEIGHT, HybridScorer, MAX_RECOMMENDATIONS, QueryOrigin,
    Recommendation, ResolvedQuery, ScoredCandidate, blend,
};
