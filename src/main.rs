//! Module H — CLI surface.
//!
//! A thin driver over the core library: `build` ingests a directory of
//! decodable reference tracks, `identify` matches a snippet file,
//! `listen` matches a live microphone capture, and `init-schema`
//! (re)creates the Postgres schema. Exit code 0 on success, 1 on
//! no-match/unknown-command/fatal error (spec.md §6).

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use audioid::catalog::builder::{build, TrackSource};
use audioid::catalog::matcher::{match_query, MatchThresholds};
use audioid::config::Config;
use audioid::decode::{DecodedAudio, Decoder};
use audioid::error::FingerprintError;
use audioid::fingerprint::fingerprint_signal;
use audioid::store::postgres::PgCatalogStore;
use audioid::store::CatalogStore;

#[derive(Parser)]
#[command(name = "audioid", about = "Identify an audio snippet against an ingested catalog")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drop and recreate the Postgres schema. Destructive.
    InitSchema,
    /// Ingest every decodable file under a directory into the catalog.
    Build {
        #[arg(long, default_value = "./music")]
        input_dir: PathBuf,
    },
    /// Identify a snippet file against the catalog.
    Identify { snippet: PathBuf },
    /// Record from the default microphone and identify the capture.
    Listen {
        #[arg(long, default_value_t = 10)]
        seconds: u64,
        /// Also dump the raw capture to this WAV path, for debugging.
        #[arg(long)]
        save_wav: Option<PathBuf>,
    },
}

struct FileTrack {
    decoded: DecodedAudio,
}

impl TrackSource for FileTrack {
    fn title(&self) -> &str {
        &self.decoded.title
    }

    fn load(&self) -> Result<DecodedAudio, FingerprintError> {
        Ok(self.decoded.clone())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("loading configuration")?;
    let mut store = PgCatalogStore::connect(&config.database_url).context("connecting to store")?;

    let exit_ok = match cli.command {
        Command::InitSchema => {
            store.init_schema()?;
            info!("schema initialized");
            true
        }
        Command::Build { input_dir } => run_build(&input_dir, &mut store)?,
        Command::Identify { snippet } => run_identify(&snippet, &mut store, config.thresholds)?,
        Command::Listen { seconds, save_wav } => {
            run_listen(seconds, save_wav, &mut store, config.thresholds)?
        }
    };

    if exit_ok {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn run_build(input_dir: &PathBuf, store: &mut dyn CatalogStore) -> anyhow::Result<bool> {
    let decoder = Decoder::new();
    let mut sources = Vec::new();

    for entry in std::fs::read_dir(input_dir).context("reading input directory")? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        match decoder.decode(&path) {
            Ok(decoded) => sources.push(FileTrack { decoded }),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping undecodable file"),
        }
    }

    let cancellation = AtomicBool::new(false);
    let report = build(&sources, store, &cancellation)?;
    info!(
        ingested = report.ingested,
        skipped_already_done = report.skipped_already_done,
        skipped_errors = report.skipped_errors,
        "build finished"
    );
    Ok(true)
}

fn run_identify(
    snippet: &PathBuf,
    store: &mut dyn CatalogStore,
    thresholds: MatchThresholds,
) -> anyhow::Result<bool> {
    let decoder = Decoder::new();
    let decoded = decoder.decode(snippet).context("decoding snippet")?;
    identify_and_print(&decoded, store, thresholds)
}

fn run_listen(
    seconds: u64,
    save_wav: Option<PathBuf>,
    store: &mut dyn CatalogStore,
    thresholds: MatchThresholds,
) -> anyhow::Result<bool> {
    let dump_path = save_wav.as_ref().map(|p| p.to_string_lossy().to_string());
    let pcm = audioid::capture::record(seconds, dump_path.as_deref())
        .context("recording from microphone")?;
    let decoded = DecodedAudio {
        title: "<live capture>".to_string(),
        pcm,
    };
    identify_and_print(&decoded, store, thresholds)
}

fn identify_and_print(
    decoded: &DecodedAudio,
    store: &mut dyn CatalogStore,
    thresholds: MatchThresholds,
) -> anyhow::Result<bool> {
    let hashes = match fingerprint_signal(&decoded.pcm) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "unable to process snippet");
            println!("[RESULT] No matches found.");
            return Ok(false);
        }
    };

    let results = match match_query(&hashes, store, thresholds, &AtomicBool::new(false)) {
        Ok(r) => r,
        Err(FingerprintError::NoQueryHashes) => {
            warn!("snippet produced no hashes");
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };

    if results.is_empty() {
        println!("[RESULT] No matches found.");
        return Ok(false);
    }

    for result in &results {
        println!(
            "[RESULT] Match found: {} (score={:.5}, votes={})",
            result.title, result.score, result.votes
        );
    }
    Ok(true)
}
