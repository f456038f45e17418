//! Wire types for the handful of Spotify Web API responses we read.
//!
//! Every field the API may omit or null is an `Option`.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackPage {
    #[serde(default)]
    pub items: Vec<TrackItem>,
}

/// A track as returned by search
#[derive(Debug, Clone, Deserialize)]
pub struct TrackItem {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistItem {
    pub name: String,
}

/// The audio-features object for one track
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioFeaturesResponse {
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub tempo: Option<f64>,
    pub loudness: Option<f64>,
}

impl TrackItem {
    /// First listed artist, empty when the track lists none
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map(|a| a.name.as_str()).unwrap_or("")
    }
}

impl AudioFeaturesResponse {
    /// All four features, or `None` if any is missing or non-finite
    pub fn complete(&self) -> Option<catalog::AudioFeatures> {
        let features = catalog::AudioFeatures::new(
            self.danceability?,
            self.energy?,
            self.tempo?,
            self.loudness?,
        );
        features.is_finite().then_some(features)
    }
}
