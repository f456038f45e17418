//! The catalog reader seam.
//!
//! `FeatureStore` only needs a way to read every song row. Anything that
//! can produce a self-consistent snapshot per call can back it.

use crate::error::Result;
use crate::types::RawSongRecord;

/// Source of raw catalog rows.
///
/// Implementations must support repeated reads; each call returns a
/// snapshot of the catalog in catalog order.
pub trait CatalogReader {
    fn read_all_songs(&self) -> Result<Vec<RawSongRecord>>;
}

impl<R: CatalogReader + ?Sized> CatalogReader for &R {
    fn read_all_songs(&self) -> Result<Vec<RawSongRecord>> {
        (**self).read_all_songs()
    }
}

impl<R: CatalogReader + ?Sized> CatalogReader for Box<R> {
    fn read_all_songs(&self) -> Result<Vec<RawSongRecord>> {
        (**self).read_all_songs()
    }
}

/// Fixed in-memory catalog, mostly useful for tests and benchmarks
impl CatalogReader for Vec<RawSongRecord> {
    fn read_all_songs(&self) -> Result<Vec<RawSongRecord>> {
        Ok(self.clone())
    }
}
