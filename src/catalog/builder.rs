//! Module D — catalog builder.
//!
//! Drives the spectrogram -> peak -> hash pipeline over every reference
//! track and persists the result via a `CatalogStore`. Ingest is
//! per-track all-or-nothing: a track is only marked `fingerprinted` after
//! its hashes have been durably written, and tracks already marked are
//! skipped so an interrupted build can resume.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::decode::DecodedAudio;
use crate::error::FingerprintError;
use crate::fingerprint::fingerprint_signal;
use crate::store::CatalogStore;
use crate::types::PcmSignal;

/// A source of reference tracks to ingest; implemented over a directory of
/// decodable files by the CLI, and over arbitrary in-memory buffers by tests.
pub trait TrackSource {
    fn title(&self) -> &str;
    fn load(&self) -> Result<DecodedAudio, FingerprintError>;
}

pub struct InMemoryTrack {
    pub title: String,
    pub pcm: PcmSignal,
}

impl TrackSource for InMemoryTrack {
    fn title(&self) -> &str {
        &self.title
    }

    fn load(&self) -> Result<DecodedAudio, FingerprintError> {
        Ok(DecodedAudio {
            title: self.title.clone(),
            pcm: self.pcm.clone(),
        })
    }
}

/// Ingests every source into `store`. Per-track decode/spectrogram failures
/// are logged and skipped; they do not abort the whole build. A
/// `cancellation` flag is checked between tracks.
pub fn build<S: TrackSource>(
    sources: &[S],
    store: &mut dyn CatalogStore,
    cancellation: &AtomicBool,
) -> Result<BuildReport, FingerprintError> {
    let mut report = BuildReport::default();

    for source in sources {
        if cancellation.load(Ordering::Relaxed) {
            info!("build cancelled, stopping before next track");
            break;
        }

        match ingest_one(source, store) {
            Ok(Outcome::Ingested) => report.ingested += 1,
            Ok(Outcome::AlreadyFingerprinted) => report.skipped_already_done += 1,
            Err(e) => {
                warn!(title = source.title(), error = %e, "skipping track");
                report.skipped_errors += 1;
            }
        }
    }

    Ok(report)
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub ingested: u32,
    pub skipped_already_done: u32,
    pub skipped_errors: u32,
}

enum Outcome {
    Ingested,
    AlreadyFingerprinted,
}

fn ingest_one<S: TrackSource>(
    source: &S,
    store: &mut dyn CatalogStore,
) -> Result<Outcome, FingerprintError> {
    let track_id = match store.lookup_track_by_title(source.title()) {
        Ok(id) => id,
        Err(FingerprintError::NotFound(_)) => store.insert_track(source.title())?,
        Err(e) => return Err(e),
    };

    if store.is_fingerprinted(track_id)? {
        return Ok(Outcome::AlreadyFingerprinted);
    }

    let audio = source.load()?;
    let entries = fingerprint_signal(&audio.pcm)?;

    store.put_hashes(track_id, &entries)?;
    store.mark_fingerprinted(track_id)?;

    info!(title = source.title(), hashes = entries.len(), "track ingested");
    Ok(Outcome::Ingested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryCatalogStore;
    use std::f32::consts::PI;

    fn sine_track(title: &str, freq: f32, duration_secs: f32, sample_rate: u32) -> InMemoryTrack {
        let n = (sample_rate as f32 * duration_secs) as usize;
        let samples = (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect();
        InMemoryTrack {
            title: title.to_string(),
            pcm: PcmSignal::new(samples, sample_rate),
        }
    }

    #[test]
    fn build_ingests_and_marks_fingerprinted() {
        let mut store = InMemoryCatalogStore::new();
        let sources = vec![sine_track("alpha", 440.0, 10.0, 44100)];
        let cancel = AtomicBool::new(false);

        let report = build(&sources, &mut store, &cancel).unwrap();
        assert_eq!(report.ingested, 1);

        let id = store.lookup_track_by_title("alpha").unwrap();
        assert!(store.is_fingerprinted(id).unwrap());
        assert!(!store.get_hashes(id).unwrap().is_empty());
    }

    #[test]
    fn build_is_resumable_and_skips_completed_tracks() {
        let mut store = InMemoryCatalogStore::new();
        let sources = vec![sine_track("beta", 220.0, 10.0, 44100)];
        let cancel = AtomicBool::new(false);

        build(&sources, &mut store, &cancel).unwrap();
        let second = build(&sources, &mut store, &cancel).unwrap();

        assert_eq!(second.ingested, 0);
        assert_eq!(second.skipped_already_done, 1);
    }

    #[test]
    fn build_isolates_per_track_errors() {
        let mut store = InMemoryCatalogStore::new();
        let silent = InMemoryTrack {
            title: "silent".to_string(),
            pcm: PcmSignal::new(vec![0.0; 22050], 44100),
        };
        let sources = vec![silent];
        let cancel = AtomicBool::new(false);

        let report = build(&sources, &mut store, &cancel).unwrap();
        assert_eq!(report.skipped_errors, 1);

        let id = store.lookup_track_by_title("silent").unwrap();
        assert!(!store.is_fingerprinted(id).unwrap());
    }

    #[test]
    fn build_respects_cancellation_between_tracks() {
        let mut store = InMemoryCatalogStore::new();
        let sources = vec![
            sine_track("one", 440.0, 10.0, 44100),
            sine_track("two", 660.0, 10.0, 44100),
        ];
        let cancel = AtomicBool::new(true);

        let report = build(&sources, &mut store, &cancel).unwrap();
        assert_eq!(report.ingested, 0);
    }
}
