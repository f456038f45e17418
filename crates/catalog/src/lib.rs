//! # Catalog Crate
//!
//! Song data model and catalog access for the hybrid recommender.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Song, AudioFeatures, FeatureMatrix)
//! - **cleaning**: Raw-row coercion and the drop-on-missing policy
//! - **reader**: The `CatalogReader` trait
//! - **sqlite**: SQLite catalog (`SqliteCatalog`)
//! - **store**: `FeatureStore`, which turns catalog reads into matrices
//! - **provider**: The `FeatureProvider` trait for external lookups
//! - **error**: Error types for catalog access
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{CatalogConfig, FeatureStore, SqliteCatalog};
//!
//! let catalog = SqliteCatalog::open(&CatalogConfig::new("music_recommendations.db"))?;
//! let store = FeatureStore::new(catalog);
//!
//! let matrix = store.load()?;
//! if let Some(song) = matrix.find_by_name("Blinding Lights") {
//!     println!("{} by {}", song.name, song.artist);
//! }
//! ```

pub mod cleaning;
pub mod error;
pub mod provider;
pub mod reader;
pub mod sqlite;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use cleaning::LoadReport;
pub use error::{CatalogError, Result};
pub use provider::FeatureProvider;
pub use reader::CatalogReader;
pub use sqlite::{CatalogConfig, SqliteCatalog};
pub use store::FeatureStore;
pub use types::{
    AudioFeatures, FEATURE_COUNT, FEATURE_NAMES, FeatureMatrix, FeatureVector, RawField,
    RawSongRecord, Song, SongInfo, TrackId,
};
