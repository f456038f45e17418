//! Core domain types for the song catalog.
//!
//! This module defines the data model shared by every other crate:
//! - `Song`: a fully cleaned, scoreable catalog entry
//! - `RawSongRecord`: a catalog row as stored, before any cleaning
//! - `FeatureMatrix`: the per-load working set, a fixed-width numeric
//!   table with a parallel identity/metadata table

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases and Constants
// =============================================================================

/// Unique identifier for a song (the provider's track id)
pub type TrackId = String;

/// Number of audio features per song
pub const FEATURE_COUNT: usize = 4;

/// Column names of the audio features, in vector order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["danceability", "energy", "tempo", "loudness"];

/// A song's audio features laid out as a dense vector
pub type FeatureVector = [f64; FEATURE_COUNT];

// =============================================================================
// Song Types
// =============================================================================

/// The four numeric audio attributes used for similarity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub danceability: f64,
    pub energy: f64,
    /// Beats per minute
    pub tempo: f64,
    /// Decibels, usually negative
    pub loudness: f64,
}

impl AudioFeatures {
    pub fn new(danceability: f64, energy: f64, tempo: f64, loudness: f64) -> Self {
        Self {
            danceability,
            energy,
            tempo,
            loudness,
        }
    }

    /// Features in `FEATURE_NAMES` order
    pub fn to_vector(&self) -> FeatureVector {
        [self.danceability, self.energy, self.tempo, self.loudness]
    }

    pub fn from_vector(v: FeatureVector) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }

    /// True when every feature is a finite number
    pub fn is_finite(&self) -> bool {
        self.to_vector().iter().all(|x| x.is_finite())
    }
}

/// A song eligible for similarity computation.
///
/// Only constructed once all four features are known to be numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub track_id: TrackId,
    pub name: String,
    /// Primary artist
    pub artist: String,
    pub features: AudioFeatures,
}

/// Identity and display metadata for one matrix row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongInfo {
    pub track_id: TrackId,
    pub name: String,
    pub artist: String,
}

// =============================================================================
// Raw Catalog Rows
// =============================================================================

/// An untyped, nullable catalog cell
#[derive(Debug, Clone, PartialEq)]
pub enum RawField {
    /// NULL, or a value of a type that can never be numeric
    Missing,
    Number(f64),
    Text(String),
}

/// A catalog row exactly as the reader returned it
#[derive(Debug, Clone, PartialEq)]
pub struct RawSongRecord {
    pub track_id: Option<String>,
    pub name: Option<String>,
    pub artist: Option<String>,
    pub danceability: RawField,
    pub energy: RawField,
    pub tempo: RawField,
    pub loudness: RawField,
}

impl From<&Song> for RawSongRecord {
    fn from(song: &Song) -> Self {
        Self {
            track_id: Some(song.track_id.clone()),
            name: Some(song.name.clone()),
            artist: Some(song.artist.clone()),
            danceability: RawField::Number(song.features.danceability),
            energy: RawField::Number(song.features.energy),
            tempo: RawField::Number(song.features.tempo),
            loudness: RawField::Number(song.features.loudness),
        }
    }
}

// =============================================================================
// FeatureMatrix
// =============================================================================

/// The working set of one catalog load.
///
/// `rows[i]` and `info[i]` always describe the same song. Rows are unique
/// by track id and kept in catalog order.
#[derive(Debug, Clone, Default)]
pub struct FeatureMatrix {
    rows: Vec<FeatureVector>,
    info: Vec<SongInfo>,
    positions: HashMap<TrackId, usize>,
}

impl FeatureMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a song, returning false (and changing nothing) when its
    /// track id is already present
    pub fn push(&mut self, song: Song) -> bool {
        if self.positions.contains_key(&song.track_id) {
            return false;
        }
        self.positions.insert(song.track_id.clone(), self.rows.len());
        self.rows.push(song.features.to_vector());
        self.info.push(SongInfo {
            track_id: song.track_id,
            name: song.name,
            artist: song.artist,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The numeric table, one row per song
    pub fn features(&self) -> &[FeatureVector] {
        &self.rows
    }

    /// The metadata table, parallel to `features()`
    pub fn info(&self) -> &[SongInfo] {
        &self.info
    }

    /// Row position of a track id
    pub fn position(&self, track_id: &str) -> Option<usize> {
        self.positions.get(track_id).copied()
    }

    /// Reassemble the song stored at row `i`
    pub fn song(&self, i: usize) -> Option<Song> {
        let info = self.info.get(i)?;
        let row = self.rows.get(i)?;
        Some(Song {
            track_id: info.track_id.clone(),
            name: info.name.clone(),
            artist: info.artist.clone(),
            features: AudioFeatures::from_vector(*row),
        })
    }

    /// Case-insensitive exact match on display name.
    ///
    /// Returns the first match in catalog order when names repeat.
    pub fn find_by_name(&self, name: &str) -> Option<Song> {
        let wanted = name.to_lowercase();
        let i = self
            .info
            .iter()
            .position(|info| info.name.to_lowercase() == wanted)?;
        self.song(i)
    }

    /// Case-insensitive substring search on display name, catalog order
    pub fn search(&self, fragment: &str) -> Vec<Song> {
        let wanted = fragment.to_lowercase();
        self.info
            .iter()
            .enumerate()
            .filter(|(_, info)| info.name.to_lowercase().contains(&wanted))
            .filter_map(|(i, _)| self.song(i))
            .collect()
    }
}
