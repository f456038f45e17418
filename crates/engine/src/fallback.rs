//! External lookup for songs the catalog does not know.
//!
//! Wraps a `FeatureProvider` and folds every failure into absence: the
//! provider is a single blocking call with a binary outcome.

use catalog::{FeatureProvider, Song};
use tracing::{debug, warn};

/// Resolves a song name outside the local catalog.
///
/// Songs returned here are synthetic. They are never written to the
/// catalog and never enter the collaborative index.
pub trait ExternalLookup: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Song>;
}

impl<L: ExternalLookup + ?Sized> ExternalLookup for Box<L> {
    fn resolve(&self, name: &str) -> Option<Song> {
        (**self).resolve(name)
    }
}

/// Lookup that never finds anything; used when no provider is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternalLookup;

impl ExternalLookup for NoExternalLookup {
    fn resolve(&self, _name: &str) -> Option<Song> {
        None
    }
}

/// Falls back to a remote provider, treating any failure as "not found"
pub struct ExternalLookupFallback<P: FeatureProvider> {
    provider: P,
}

impl<P: FeatureProvider> ExternalLookupFallback<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: FeatureProvider> ExternalLookup for ExternalLookupFallback<P> {
    fn resolve(&self, name: &str) -> Option<Song> {
        debug!("Resolving {:?} via {}", name, self.provider.name());
        match self.provider.search_top_match(name) {
            Ok(Some(song)) if song.features.is_finite() => Some(song),
            Ok(Some(song)) => {
                warn!(
                    "{} returned non-numeric features for {}",
                    self.provider.name(),
                    song.track_id
                );
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("{} lookup for {:?} failed: {:#}", self.provider.name(), name, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use catalog::AudioFeatures;

    struct FixedProvider(Option<Song>);

    impl FeatureProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn search_top_match(&self, _name: &str) -> Result<Option<Song>> {
            Ok(self.0.clone())
        }
    }

    struct FailingProvider;

    impl FeatureProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn search_top_match(&self, _name: &str) -> Result<Option<Song>> {
            Err(anyhow!("connection reset"))
        }
    }

    fn song(tempo: f64) -> Song {
        Song {
            track_id: "ext".to_string(),
            name: "Remote".to_string(),
            artist: "Someone".to_string(),
            features: AudioFeatures::new(0.5, 0.5, tempo, -6.0),
        }
    }

    #[test]
    fn test_found() {
        let lookup = ExternalLookupFallback::new(FixedProvider(Some(song(100.0))));
        assert_eq!(lookup.resolve("Remote").unwrap().track_id, "ext");
    }

    #[test]
    fn test_not_found() {
        let lookup = ExternalLookupFallback::new(FixedProvider(None));
        assert!(lookup.resolve("Remote").is_none());
    }

    #[test]
    fn test_failure_is_absence() {
        let lookup = ExternalLookupFallback::new(FailingProvider);
        assert!(lookup.resolve("Remote").is_none());
    }

    #[test]
    fn test_non_finite_features_are_absence() {
        let lookup = ExternalLookupFallback::new(FixedProvider(Some(song(f64::NAN))));
        assert!(lookup.resolve("Remote").is_none());
    }

    #[test]
    fn test_no_lookup() {
        assert!(NoExternalLookup.resolve("anything").is_none());
        let boxed: Box<dyn ExternalLookup> = Box::new(NoExternalLookup);
        assert!(boxed.resolve("anything").is_none());
    }
}
