//! Spotify Web API client used as the external feature provider.
//!
//! This crate provides a small blocking client that:
//! - Authenticates with the client-credentials flow and caches the token
//! - Searches tracks by name and keeps the top match
//! - Fetches that track's audio features
//!
//! It implements `catalog::FeatureProvider`, so the recommender can fall
//! back to it for songs missing from the local catalog.

pub mod models;

use catalog::{FeatureProvider, Song};
use models::{AudioFeaturesResponse, SearchResponse, TokenResponse, TrackItem};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
const SPOTIFY_API_URL: &str = "https://api.spotify.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Refresh tokens this long before Spotify says they expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Errors that can occur when talking to Spotify
#[derive(Error, Debug)]
pub enum SpotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, SpotifyError>;

/// Connection settings for the Spotify client.
///
/// Passed explicitly to `SpotifyClient::new`; nothing is read from the
/// environment here.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub accounts_url: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl SpotifyConfig {
    /// Config pointing at the public Spotify endpoints
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            accounts_url: SPOTIFY_ACCOUNTS_URL.to_string(),
            api_url: SPOTIFY_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_base_urls(mut self, accounts_url: &str, api_url: &str) -> Self {
        self.accounts_url = accounts_url.trim_end_matches('/').to_string();
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct SpotifyClient {
    client: Client,
    config: SpotifyConfig,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        info!("Spotify client configured for {}", config.api_url);

        Ok(Self {
            client,
            config,
            token: Mutex::new(None),
        })
    }

    /// Return a valid bearer token, requesting a new one when needed
    fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting Spotify access token");
        let response = self
            .client
            .post(format!("{}/api/token", self.config.accounts_url))
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()?;

        if !response.status().is_success() {
            return Err(SpotifyError::Auth(format!(
                "token request returned {}",
                response.status()
            )));
        }

        let body: TokenResponse = response.json()?;
        let lifetime = Duration::from_secs(body.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *cached = Some(CachedToken {
            value: body.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(body.access_token)
    }

    /// Search tracks by name and return the top match
    pub fn search_top_track(&self, name: &str) -> Result<Option<TrackItem>> {
        let token = self.access_token()?;
        let response = self
            .client
            .get(format!("{}/v1/search", self.config.api_url))
            .bearer_auth(token)
            .query(&[("q", name), ("type", "track"), ("limit", "1")])
            .send()?;

        let response = check_status(response)?;
        let body: SearchResponse = response.json()?;

        Ok(body
            .tracks
            .and_then(|page| page.items.into_iter().next()))
    }

    /// Audio features of one track, `None` when Spotify has none
    pub fn audio_features(&self, track_id: &str) -> Result<Option<AudioFeaturesResponse>> {
        let token = self.access_token()?;
        let response = self
            .client
            .get(format!("{}/v1/audio-features/{}", self.config.api_url, track_id))
            .bearer_auth(token)
            .send()?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response)?;
        Ok(response.json()?)
    }
}

fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(SpotifyError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Combine a search hit and its features into a `Song`
fn track_to_song(track: TrackItem, features: &AudioFeaturesResponse) -> Option<Song> {
    let features = features.complete()?;
    let artist = track.primary_artist().to_string();
    Some(Song {
        track_id: track.id?,
        name: track.name,
        artist,
        features,
    })
}

impl FeatureProvider for SpotifyClient {
    fn name(&self) -> &str {
        "spotify"
    }

    fn search_top_match(&self, name: &str) -> anyhow::Result<Option<Song>> {
        let Some(track) = self.search_top_track(name)? else {
            debug!("No Spotify match for {:?}", name);
            return Ok(None);
        };
        let Some(track_id) = track.id.clone() else {
            return Ok(None);
        };
        let Some(features) = self.audio_features(&track_id)? else {
            debug!("No audio features for Spotify track {}", track_id);
            return Ok(None);
        };

        Ok(track_to_song(track, &features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::ArtistItem;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn track(id: Option<&str>) -> TrackItem {
        TrackItem {
            id: id.map(str::to_string),
            name: "Blinding Lights".to_string(),
            artists: vec![
                ArtistItem {
                    name: "The Weeknd".to_string(),
                },
                ArtistItem {
                    name: "Guest".to_string(),
                },
            ],
        }
    }

    fn features() -> AudioFeaturesResponse {
        AudioFeaturesResponse {
            danceability: Some(0.514),
            energy: Some(0.73),
            tempo: Some(171.005),
            loudness: Some(-5.934),
        }
    }

    #[test]
    fn test_track_to_song() {
        let song = track_to_song(track(Some("abc")), &features()).unwrap();
        assert_eq!(song.track_id, "abc");
        assert_eq!(song.artist, "The Weeknd");
        assert_eq!(song.features.loudness, -5.934);
    }

    #[test]
    fn test_track_to_song_needs_id_and_features() {
        assert!(track_to_song(track(None), &features()).is_none());

        let mut partial = features();
        partial.tempo = None;
        assert!(track_to_song(track(Some("abc")), &partial).is_none());
    }

    #[test]
    fn test_config_builders() {
        let config = SpotifyConfig::new("id", "secret")
            .with_timeout(Duration::from_secs(3))
            .with_base_urls("http://localhost:8080/", "http://localhost:8081/");

        assert_eq!(config.accounts_url, "http://localhost:8080");
        assert_eq!(config.api_url, "http://localhost:8081");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(SpotifyConfig::new("a", "b").api_url, SPOTIFY_API_URL);
    }

    /// Local HTTP server answering each request from a fixed route table
    struct StubServer {
        base: String,
        token_requests: Arc<AtomicUsize>,
    }

    impl StubServer {
        fn start(route: fn(&str, &str) -> (u16, &'static str)) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            let token_requests = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&token_requests);

            thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(mut stream) = stream else { continue };
                    let Some((method, path)) = read_request(&stream) else {
                        continue;
                    };
                    if path == "/api/token" {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                    let (status, body) = route(&method, &path);
                    let response = format!(
                        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes());
                }
            });

            Self {
                base,
                token_requests,
            }
        }

        fn client(&self) -> SpotifyClient {
            let config = SpotifyConfig::new("id", "secret")
                .with_timeout(Duration::from_secs(5))
                .with_base_urls(&self.base, &self.base);
            SpotifyClient::new(config).unwrap()
        }

        fn token_requests(&self) -> usize {
            self.token_requests.load(Ordering::SeqCst)
        }
    }

    /// Read one request, body included; returns method and path
    fn read_request(stream: &TcpStream) -> Option<(String, String)> {
        let mut reader = BufReader::new(stream.try_clone().ok()?);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).ok()?;
        let mut parts = request_line.split_whitespace();
        let method = parts.next()?.to_string();
        let path = parts.next()?.to_string();

        let mut content_length = 0;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).ok()? == 0 {
                break;
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((key, value)) = line.split_once(':') {
                if key.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
        }
        let mut body = vec![0; content_length];
        reader.read_exact(&mut body).ok()?;
        Some((method, path))
    }

    const TOKEN: &str = r#"{"access_token":"tok","token_type":"Bearer","expires_in":3600}"#;
    const SHORT_TOKEN: &str = r#"{"access_token":"tok","token_type":"Bearer","expires_in":20}"#;
    const SEARCH: &str =
        r#"{"tracks":{"items":[{"id":"t1","name":"Remote Song","artists":[{"name":"Remote Artist"}]}]}}"#;
    const FEATURES: &str =
        r#"{"danceability":0.5,"energy":0.6,"tempo":120.0,"loudness":-5.0,"id":"t1"}"#;

    fn healthy_route(method: &str, path: &str) -> (u16, &'static str) {
        match (method, path) {
            ("POST", "/api/token") => (200, TOKEN),
            ("GET", p) if p.starts_with("/v1/search") => (200, SEARCH),
            ("GET", "/v1/audio-features/t1") => (200, FEATURES),
            _ => (404, "{}"),
        }
    }

    #[test]
    fn test_token_is_reused_until_expiry() {
        let server = StubServer::start(healthy_route);
        let client = server.client();

        let first = client.search_top_match("Remote Song").unwrap().unwrap();
        let second = client.search_top_match("Remote Song").unwrap().unwrap();

        assert_eq!(first.track_id, "t1");
        assert_eq!(first.artist, "Remote Artist");
        assert_eq!(first.features.tempo, 120.0);
        assert_eq!(second, first);
        assert_eq!(server.token_requests(), 1);
    }

    #[test]
    fn test_token_near_expiry_is_refreshed() {
        let server = StubServer::start(|method, path| match (method, path) {
            ("POST", "/api/token") => (200, SHORT_TOKEN),
            _ => healthy_route(method, path),
        });
        let client = server.client();

        client.search_top_match("Remote Song").unwrap();
        client.search_top_match("Remote Song").unwrap();

        // Lifetime under the expiry margin: one token per API call
        assert_eq!(server.token_requests(), 4);
    }

    #[test]
    fn test_missing_audio_features_is_none() {
        let server = StubServer::start(|method, path| match (method, path) {
            ("GET", "/v1/audio-features/t1") => (404, r#"{"error":{"status":404}}"#),
            _ => healthy_route(method, path),
        });
        let client = server.client();

        assert!(client.audio_features("t1").unwrap().is_none());
        assert!(client.search_top_match("Remote Song").unwrap().is_none());
    }

    #[test]
    fn test_empty_search_is_none() {
        let server = StubServer::start(|method, path| match (method, path) {
            ("GET", p) if p.starts_with("/v1/search") => (200, r#"{"tracks":{"items":[]}}"#),
            _ => healthy_route(method, path),
        });

        assert!(server.client().search_top_match("Nothing").unwrap().is_none());
    }

    #[test]
    fn test_search_server_error_is_api_error() {
        let server = StubServer::start(|method, path| match (method, path) {
            ("GET", p) if p.starts_with("/v1/search") => (500, r#"{"error":"boom"}"#),
            _ => healthy_route(method, path),
        });
        let client = server.client();

        match client.search_top_track("Remote Song") {
            Err(SpotifyError::Api { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("expected API error, got {:?}", other),
        }
        assert!(client.search_top_match("Remote Song").is_err());
    }

    #[test]
    fn test_rejected_credentials_are_auth_error() {
        let server = StubServer::start(|method, path| match (method, path) {
            ("POST", "/api/token") => (401, r#"{"error":"invalid_client"}"#),
            _ => healthy_route(method, path),
        });

        assert!(matches!(
            server.client().search_top_track("Remote Song"),
            Err(SpotifyError::Auth(_))
        ));
    }

    #[test]
    fn test_unreachable_provider_is_an_error() {
        let config = SpotifyConfig::new("id", "secret")
            .with_timeout(Duration::from_secs(2))
            .with_base_urls("http://127.0.0.1:9", "http://127.0.0.1:9");
        let client = SpotifyClient::new(config).unwrap();

        assert!(client.search_top_match("anything").is_err());
    }
}
