//! Cleaning policy for raw catalog rows.
//!
//! Turns `RawSongRecord`s into a `FeatureMatrix`:
//! - integers and reals become `f64`
//! - text is trimmed and parsed as a number
//! - NULL, unparsable text and non-finite numbers count as missing
//! - a row missing any of the four features (or its track id) is dropped
//! - a row repeating an earlier track id is dropped
//!
//! None of this is an error. `LoadReport` records what was dropped.

use crate::types::*;
use serde::Serialize;

/// Counts gathered while cleaning one catalog read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub rows_read: usize,
    /// Rows missing a track id or a numeric feature
    pub dropped_malformed: usize,
    pub dropped_duplicate: usize,
}

impl LoadReport {
    pub fn rows_kept(&self) -> usize {
        self.rows_read - self.dropped_malformed - self.dropped_duplicate
    }
}

/// Coerce one raw cell to a finite number
pub fn coerce_feature(field: &RawField) -> Option<f64> {
    let value = match field {
        RawField::Missing => return None,
        RawField::Number(x) => *x,
        RawField::Text(s) => s.trim().parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}

/// Clean a single row, or `None` if it is not eligible for scoring
pub fn clean_record(record: RawSongRecord) -> Option<Song> {
    let track_id = record.track_id.filter(|id| !id.is_empty())?;
    let features = AudioFeatures::new(
        coerce_feature(&record.danceability)?,
        coerce_feature(&record.energy)?,
        coerce_feature(&record.tempo)?,
        coerce_feature(&record.loudness)?,
    );

    Some(Song {
        track_id,
        name: record.name.unwrap_or_default(),
        artist: record.artist.unwrap_or_default(),
        features,
    })
}

/// Build a feature matrix from a full catalog read, preserving row order
pub fn build_matrix(records: Vec<RawSongRecord>) -> (FeatureMatrix, LoadReport) {
    let mut report = LoadReport {
        rows_read: records.len(),
        ..LoadReport::default()
    };
    let mut matrix = FeatureMatrix::new();

    for record in records {
        match clean_record(record) {
            Some(song) => {
                if !matrix.push(song) {
                    report.dropped_duplicate += 1;
                }
            }
            None => report.dropped_malformed += 1,
        }
    }

    (matrix, report)
}
