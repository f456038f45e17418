//! SQLite-backed song catalog.
//!
//! Schema:
//! songs(track_id TEXT PRIMARY KEY, name TEXT, artist TEXT,
//!       danceability REAL, energy REAL, tempo REAL, loudness REAL)
//!
//! SQLite columns are loosely typed, so feature cells are read back as
//! `RawField`s and left for the cleaning step to judge.

use crate::error::{CatalogError, Result};
use crate::reader::CatalogReader;
use crate::types::{FEATURE_NAMES, RawField, RawSongRecord, Song};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, params};
use std::path::PathBuf;
use tracing::{debug, info};

/// Where the catalog lives
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub db_path: PathBuf,
}

impl CatalogConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::new("music_recommendations.db")
    }
}

pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    /// Open (creating if needed) the catalog described by `config`
    pub fn open(config: &CatalogConfig) -> Result<Self> {
        info!("Opening song catalog at {:?}", config.db_path);
        let conn = Connection::open(&config.db_path)?;
        let catalog = Self { conn };
        catalog.init()?;
        Ok(catalog)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let catalog = Self { conn };
        catalog.init()?;
        Ok(catalog)
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS songs (
                track_id     TEXT PRIMARY KEY,
                name         TEXT,
                artist       TEXT,
                danceability REAL,
                energy       REAL,
                tempo        REAL,
                loudness     REAL
            );
            ",
        )?;
        Ok(())
    }

    /// Insert a song, replacing any existing row with the same track id.
    ///
    /// Callers holding a precomputed similarity index must rebuild it
    /// afterwards; nothing here notifies them.
    pub fn upsert_song(&self, song: &Song) -> Result<()> {
        if song.track_id.is_empty() {
            return Err(CatalogError::InvalidValue {
                field: "track_id".to_string(),
                value: String::new(),
            });
        }
        for (field, value) in FEATURE_NAMES.iter().zip(song.features.to_vector()) {
            if !value.is_finite() {
                return Err(CatalogError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }

        self.conn.execute(
            "INSERT OR REPLACE INTO songs
                (track_id, name, artist, danceability, energy, tempo, loudness)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                song.track_id,
                song.name,
                song.artist,
                song.features.danceability,
                song.features.energy,
                song.features.tempo,
                song.features.loudness,
            ],
        )?;
        debug!("Upserted song {}", song.track_id);
        Ok(())
    }

    /// Number of rows in the songs table, cleaned or not
    pub fn row_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM songs", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl CatalogReader for SqliteCatalog {
    fn read_all_songs(&self) -> Result<Vec<RawSongRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT track_id, name, artist, danceability, energy, tempo, loudness
             FROM songs
             ORDER BY rowid",
        )?;

        let records = stmt
            .query_map([], |row| {
                Ok(RawSongRecord {
                    track_id: text_cell(row.get_ref(0)?),
                    name: text_cell(row.get_ref(1)?),
                    artist: text_cell(row.get_ref(2)?),
                    danceability: raw_cell(row.get_ref(3)?),
                    energy: raw_cell(row.get_ref(4)?),
                    tempo: raw_cell(row.get_ref(5)?),
                    loudness: raw_cell(row.get_ref(6)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

fn raw_cell(value: ValueRef<'_>) -> RawField {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => RawField::Missing,
        ValueRef::Integer(i) => RawField::Number(i as f64),
        ValueRef::Real(x) => RawField::Number(x),
        ValueRef::Text(t) => RawField::Text(String::from_utf8_lossy(t).into_owned()),
    }
}

fn text_cell(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(x) => Some(x.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}
