//! Errors surfaced by the recommender.
//!
//! A song that cannot be found anywhere is not an error: `recommend`
//! returns an empty list for it. Only an unreadable catalog fails a request.

use catalog::CatalogError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommendError {
    /// The catalog could not be read
    #[error("Catalog data unavailable: {0}")]
    DataUnavailable(#[from] CatalogError),
}

pub type Result<T> = std::result::Result<T, RecommendError>;
