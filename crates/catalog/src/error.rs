//! Error types for the catalog crate.
//!
//! Only catalog-level failures are errors here. Individual malformed rows
//! are never reported through this type; the cleaning step drops them.

use thiserror::Error;

/// Errors that can occur while reading or writing the song catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog could not be opened or queried
    ///
    /// Fatal to the calling request. Callers must surface it.
    #[error("Catalog unavailable: {0}")]
    DataUnavailable(#[from] rusqlite::Error),

    /// A song handed to the catalog for storage had an unusable field
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
