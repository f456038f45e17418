use anyhow::{Context, Result};
use catalog::{AudioFeatures, CatalogConfig, FeatureStore, Song, SqliteCatalog};
use clap::{Parser, Subcommand};
use colored::Colorize;
use engine::{
    ExternalLookup, ExternalLookupFallback, HybridScorer, NoExternalLookup, ScoredCandidate,
    COLLABORATIVE_WEIGHT, CONTENT_WEIGHT,
};
use spotify_client::{SpotifyClient, SpotifyConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// SongRecs - Hybrid Song Recommender
#[derive(Parser)]
#[command(name = "song-recs")]
#[command(about = "Song recommendations blending content and collaborative similarity", long_about = None)]
struct Cli {
    /// Path to the SQLite song catalog
    #[arg(long, env = "MUSIC_DB_PATH", default_value = "music_recommendations.db")]
    db_path: PathBuf,

    /// Spotify client id, enables lookups for songs missing from the catalog
    #[arg(long, env = "SPOTIPY_CLIENT_ID")]
    spotify_client_id: Option<String>,

    /// Spotify client secret
    #[arg(long, env = "SPOTIPY_CLIENT_SECRET", hide_env_values = true)]
    spotify_client_secret: Option<String>,

    /// Timeout for Spotify requests, in seconds
    #[arg(long, default_value = "10")]
    spotify_timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend songs similar to a title
    Recommend {
        /// Song title (case-insensitive exact match)
        #[arg(long)]
        song: String,

        /// Show content and collaborative scores for each recommendation
        #[arg(long)]
        explain: bool,

        /// Print recommendations as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search the catalog by title
    Search {
        /// Title fragment (case-insensitive substring match)
        #[arg(long)]
        name: String,
    },

    /// Show catalog statistics
    Stats,

    /// Add or replace a song in the catalog, then rebuild the index
    Add {
        #[arg(long)]
        track_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        artist: String,
        #[arg(long)]
        danceability: f64,
        #[arg(long)]
        energy: f64,
        #[arg(long)]
        tempo: f64,
        #[arg(long, allow_negative_numbers = true)]
        loudness: f64,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,
    },
}

fn main() -> Result<()> {
    // Initialize tracing; logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let catalog_config = CatalogConfig::new(&cli.db_path);
    let catalog = SqliteCatalog::open(&catalog_config)
        .with_context(|| format!("Failed to open catalog at {}", cli.db_path.display()))?;
    let store = FeatureStore::new(catalog);

    match cli.command {
        Commands::Recommend {
            ref song,
            explain,
            json,
        } => {
            let lookup = build_lookup(&cli)?;
            let mut out = io::stdout().lock();
            handle_recommend(store, lookup, song, explain, json, &mut out)?
        }
        Commands::Search { ref name } => handle_search(&store, name)?,
        Commands::Stats => handle_stats(&store)?,
        Commands::Add {
            ref track_id,
            ref name,
            ref artist,
            danceability,
            energy,
            tempo,
            loudness,
        } => {
            let song = Song {
                track_id: track_id.clone(),
                name: name.clone(),
                artist: artist.clone(),
                features: AudioFeatures::new(danceability, energy, tempo, loudness),
            };
            handle_add(store, song)?
        }
        Commands::Benchmark { requests } => handle_benchmark(store, requests)?,
    }

    Ok(())
}

/// Pick the external lookup from the configured credentials
fn build_lookup(cli: &Cli) -> Result<Box<dyn ExternalLookup>> {
    match (&cli.spotify_client_id, &cli.spotify_client_secret) {
        (Some(id), Some(secret)) => {
            let config = SpotifyConfig::new(id, secret)
                .with_timeout(Duration::from_secs(cli.spotify_timeout));
            let client = SpotifyClient::new(config).context("Failed to build Spotify client")?;
            Ok(Box::new(ExternalLookupFallback::new(client)))
        }
        _ => {
            info!("No Spotify credentials configured; catalog-only lookups");
            Ok(Box::new(NoExternalLookup))
        }
    }
}

/// Handle the 'recommend' command
fn handle_recommend(
    store: FeatureStore<SqliteCatalog>,
    lookup: Box<dyn ExternalLookup>,
    song: &str,
    explain: bool,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let start = Instant::now();
    let scorer = HybridScorer::new(store, lookup).context("Failed to build recommender")?;
    info!(
        "Indexed {} songs in {:?}",
        scorer.index_len(),
        start.elapsed()
    );

    let recommendations = scorer
        .recommend_detailed(song)
        .context("Failed to compute recommendations")?;

    if json {
        let plain: Vec<engine::Recommendation> =
            recommendations.into_iter().map(Into::into).collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&plain)?)?;
        return Ok(());
    }

    if recommendations.is_empty() {
        writeln!(
            out,
            "{}",
            format!("No recommendations found for '{}'", song).yellow()
        )?;
        return Ok(());
    }

    print_recommendations(out, song, &recommendations, explain)?;
    Ok(())
}

/// Handle the 'search' command
fn handle_search(store: &FeatureStore<SqliteCatalog>, name: &str) -> Result<()> {
    let matrix = store.load().context("Failed to load catalog")?;
    let matches = matrix.search(name);

    println!("{}", format!("Search results for '{}':", name).bold().blue());
    if matches.is_empty() {
        println!("  (none)");
    }
    for song in matches.iter().take(20) {
        println!(
            "{}: {} - {} [dance {:.2}, energy {:.2}, {:.0} bpm, {:.1} dB]",
            song.track_id,
            song.name,
            song.artist,
            song.features.danceability,
            song.features.energy,
            song.features.tempo,
            song.features.loudness
        );
    }
    if matches.len() > 20 {
        println!("  ... and {} more", matches.len() - 20);
    }
    Ok(())
}

/// Handle the 'stats' command
fn handle_stats(store: &FeatureStore<SqliteCatalog>) -> Result<()> {
    let (matrix, report) = store.load_with_report().context("Failed to load catalog")?;

    println!("{}", "Catalog statistics:".bold().blue());
    println!("{}Rows in catalog: {}", "• ".green(), report.rows_read);
    println!("{}Scoreable songs: {}", "• ".green(), matrix.len());
    println!(
        "{}Dropped (missing/non-numeric features): {}",
        "• ".cyan(),
        report.dropped_malformed
    );
    println!("{}Dropped (duplicate id): {}", "• ".cyan(), report.dropped_duplicate);

    if !matrix.is_empty() {
        let n = matrix.len() as f64;
        let mut sums = [0.0; catalog::FEATURE_COUNT];
        for row in matrix.features() {
            for (sum, value) in sums.iter_mut().zip(row) {
                *sum += value;
            }
        }
        println!("Feature means:");
        for (name, sum) in catalog::FEATURE_NAMES.iter().zip(sums) {
            println!("  - {}: {:.3}", name, sum / n);
        }
    }
    Ok(())
}

/// Handle the 'add' command
fn handle_add(store: FeatureStore<SqliteCatalog>, song: Song) -> Result<()> {
    store
        .reader()
        .upsert_song(&song)
        .with_context(|| format!("Failed to store song {}", song.track_id))?;

    // Build the index once, over the updated catalog
    let scorer =
        HybridScorer::new(store, NoExternalLookup).context("Failed to rebuild index")?;

    println!(
        "{} Stored '{}' by {} ({}); index covers {} songs",
        "✓".green(),
        song.name,
        song.artist,
        song.track_id,
        scorer.index_len()
    );
    Ok(())
}

/// Handle the 'benchmark' command
fn handle_benchmark(store: FeatureStore<SqliteCatalog>, requests: usize) -> Result<()> {
    let scorer =
        HybridScorer::new(store, NoExternalLookup).context("Failed to build recommender")?;
    let matrix = scorer.store().load().context("Failed to load catalog")?;
    if matrix.is_empty() || requests == 0 {
        println!("Nothing to benchmark: catalog is empty or no requests asked");
        return Ok(());
    }

    // Random song titles from the catalog
    let names: Vec<String> = (0..requests)
        .map(|_| {
            let i = rand::random::<u32>() as usize % matrix.len();
            matrix.info()[i].name.clone()
        })
        .collect();

    let mut timings = Vec::with_capacity(requests);
    for name in &names {
        let start = Instant::now();
        scorer.recommend(name)?;
        timings.push(start.elapsed());
    }

    let total_time: Duration = timings.iter().sum();
    let avg_latency = total_time / (timings.len() as u32);
    timings.sort();
    let p50 = timings[timings.len() / 2];
    let p95 = timings[((timings.len() as f32 * 0.95) as usize).min(timings.len() - 1)];
    let p99 = timings[((timings.len() as f32 * 0.99) as usize).min(timings.len() - 1)];
    let throughput = requests as f32 / total_time.as_secs_f32();

    println!("Benchmark results ({} songs in catalog):", matrix.len());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", p50);
    println!("P95 latency: {:?}", p95);
    println!("P99 latency: {:?}", p99);
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(
    out: &mut impl Write,
    song: &str,
    recommendations: &[ScoredCandidate],
    explain: bool,
) -> io::Result<()> {
    writeln!(out, "{}", format!("Songs like '{}':", song).bold().blue())?;
    for (i, rec) in recommendations.iter().enumerate() {
        writeln!(
            out,
            "{}. {} - {} (Score: {:.3})",
            (i + 1).to_string().green(),
            rec.name,
            rec.artist,
            rec.hybrid
        )?;
        if explain {
            writeln!(
                out,
                "   content {:.3} x {} + collaborative {:.3} x {}",
                rec.content, CONTENT_WEIGHT, rec.collaborative, COLLABORATIVE_WEIGHT
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_store(songs: &[(&str, &str, [f64; 4])]) -> FeatureStore<SqliteCatalog> {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        for (id, name, v) in songs {
            catalog
                .upsert_song(&Song {
                    track_id: id.to_string(),
                    name: name.to_string(),
                    artist: format!("{} artist", name),
                    features: AudioFeatures::new(v[0], v[1], v[2], v[3]),
                })
                .unwrap();
        }
        FeatureStore::new(catalog)
    }

    fn recommend_output(json: bool, explain: bool) -> String {
        let store = catalog_store(&[
            ("s1", "S1", [0.8, 0.6, 120.0, -5.0]),
            ("s2", "S2", [0.75, 0.65, 118.0, -6.0]),
            ("s3", "S3", [0.2, 0.9, 170.0, -3.0]),
        ]);
        let mut out = Vec::new();
        handle_recommend(store, Box::new(NoExternalLookup), "S1", explain, json, &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_recommend_json_output_is_pure_json() {
        let output = recommend_output(true, false);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        let items = parsed.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["name"], "S2");
        assert_eq!(items[1]["name"], "S3");
        assert!(items[0]["score"].as_f64().unwrap() > items[1]["score"].as_f64().unwrap());
    }

    #[test]
    fn test_recommend_text_output() {
        let output = recommend_output(false, true);

        assert!(output.contains("S2 - S2 artist"));
        assert!(output.contains("collaborative"));
        assert!(!output.contains("S1 - S1 artist"));
    }

    #[test]
    fn test_recommend_unknown_song_json_is_empty_array() {
        let store = catalog_store(&[("s1", "S1", [0.8, 0.6, 120.0, -5.0])]);
        let mut out = Vec::new();
        handle_recommend(store, Box::new(NoExternalLookup), "Nope", false, true, &mut out)
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, serde_json::json!([]));
    }
}
