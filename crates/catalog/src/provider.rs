//! The external feature provider seam.
//!
//! A provider is consulted only for songs the catalog does not know.
//! It performs one best-effort lookup: search by name, take the top
//! match, fetch its audio features.

use crate::types::Song;
use anyhow::Result;

/// A remote catalog that can resolve a song name to features.
///
/// ## Contract
/// - `Ok(Some(song))`: top match found and all four features available
/// - `Ok(None)`: no match, or the match has no features
/// - `Err(_)`: transport or protocol failure
///
/// `Send + Sync` lets one provider serve concurrent callers.
pub trait FeatureProvider: Send + Sync {
    /// Returns the name of this provider (for logging)
    fn name(&self) -> &str;

    fn search_top_match(&self, name: &str) -> Result<Option<Song>>;
}
