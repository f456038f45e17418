//! FeatureStore: loads the catalog and cleans it into a `FeatureMatrix`.

use crate::cleaning::{LoadReport, build_matrix};
use crate::error::Result;
use crate::reader::CatalogReader;
use crate::types::FeatureMatrix;
use tracing::{debug, instrument, warn};

/// Loads fresh feature matrices from a catalog reader.
///
/// The store keeps no copy of the data: every `load` is a new read, so
/// the result always reflects the catalog at call time.
pub struct FeatureStore<R: CatalogReader> {
    reader: R,
}

impl<R: CatalogReader> FeatureStore<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read and clean the whole catalog.
    ///
    /// Fails only when the catalog itself is unreadable. Malformed rows are
    /// dropped silently.
    pub fn load(&self) -> Result<FeatureMatrix> {
        self.load_with_report().map(|(matrix, _)| matrix)
    }

    /// Same as `load`, also returning what the cleaning step dropped
    #[instrument(skip(self))]
    pub fn load_with_report(&self) -> Result<(FeatureMatrix, LoadReport)> {
        let records = self.reader.read_all_songs()?;
        let (matrix, report) = build_matrix(records);

        debug!(
            "Loaded {} songs ({} rows read)",
            matrix.len(),
            report.rows_read
        );
        if report.dropped_malformed + report.dropped_duplicate > 0 {
            warn!(
                "Dropped {} malformed and {} duplicate catalog rows",
                report.dropped_malformed, report.dropped_duplicate
            );
        }
        Ok((matrix, report))
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::types::{RawField, RawSongRecord};

    struct BrokenCatalog;

    impl CatalogReader for BrokenCatalog {
        fn read_all_songs(&self) -> Result<Vec<RawSongRecord>> {
            Err(CatalogError::DataUnavailable(
                rusqlite::Error::InvalidQuery,
            ))
        }
    }

    fn record(id: &str, name: &str, tempo: RawField) -> RawSongRecord {
        RawSongRecord {
            track_id: Some(id.to_string()),
            name: Some(name.to_string()),
            artist: Some("Artist".to_string()),
            danceability: RawField::Number(0.5),
            energy: RawField::Number(0.5),
            tempo,
            loudness: RawField::Number(-6.0),
        }
    }

    #[test]
    fn test_load_excludes_malformed_rows() {
        let store = FeatureStore::new(vec![
            record("a", "Kept", RawField::Number(120.0)),
            record("b", "Dropped", RawField::Text("n/a".to_string())),
        ]);

        let matrix = store.load().unwrap();
        assert_eq!(matrix.len(), 1);
        assert!(matrix.find_by_name("kept").is_some());
        assert!(matrix.find_by_name("dropped").is_none());
    }

    #[test]
    fn test_load_reports_unavailable_catalog() {
        let store = FeatureStore::new(BrokenCatalog);
        let err = store.load().unwrap_err();
        assert!(matches!(err, CatalogError::DataUnavailable(_)));
    }

    #[test]
    fn test_load_is_fresh_each_call() {
        let catalog = crate::SqliteCatalog::open_in_memory().unwrap();
        let store = FeatureStore::new(&catalog);
        assert!(store.load().unwrap().is_empty());

        catalog
            .upsert_song(&crate::Song {
                track_id: "a".to_string(),
                name: "New".to_string(),
                artist: "Artist".to_string(),
                features: crate::AudioFeatures::new(0.5, 0.5, 100.0, -4.0),
            })
            .unwrap();

        assert_eq!(store.load().unwrap().len(), 1);
    }
}
