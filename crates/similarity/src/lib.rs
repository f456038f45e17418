//! # Similarity Crate
//!
//! The two similarity signals the hybrid recommender blends.
//!
//! ### Collaborative index
//! Precomputed, symmetric all-pairs cosine similarity over one catalog
//! snapshot. Built once at startup; read-only afterwards.
//!
//! ### Content scorer
//! On-demand cosine similarity between a query vector and every row of
//! the freshly loaded feature matrix.
//!
//! Both share the same zero-norm policy: a zero vector is 0-similar to
//! everything (see `cosine`).
//!
//! ## Example Usage
//!
//! ```ignore
//! use similarity::{CollaborativeSimilarityIndex, ContentSimilarityScorer};
//!
//! let matrix = store.load()?;
//! let index = CollaborativeSimilarityIndex::build(&matrix);
//!
//! let content = ContentSimilarityScorer::new().score(&query.features.to_vector(), &matrix);
//! let collab = index.similarity_of(&query.track_id);
//! ```

pub mod collaborative;
pub mod content;
pub mod cosine;

pub use collaborative::{CollaborativeSimilarityIndex, SimilarityRow};
pub use content::{ContentScores, ContentSimilarityScorer};
pub use cosine::cosine_similarity;
