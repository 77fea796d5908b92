//! Module E — matcher.
//!
//! Joins query hashes against a catalog's stored hashes, builds a per-track
//! time-offset histogram, and ranks candidates that clear the confidence
//! gate. A correct match concentrates votes at a single offset -- the
//! snippet's position within the reference -- while noise scatters votes
//! across many offsets.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::error::FingerprintError;
use crate::store::CatalogStore;
use crate::types::{HashEntry, MatchResult};

/// Confidence-gate thresholds (spec.md §4.E). Exposed as configuration per
/// spec.md's "thresholds are policy, not truth".
#[derive(Debug, Clone, Copy)]
pub struct MatchThresholds {
    pub min_votes: u32,
    pub min_snippet_ratio: f64,
    pub min_store_ratio: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            min_votes: 5,
            min_snippet_ratio: 0.006,
            min_store_ratio: 0.004,
        }
    }
}

/// Matches `query_hashes` against every track in `store`, returning all
/// co-winning titles ranked by `(score, votes)` descending.
///
/// Fails with `NoQueryHashes` if the snippet produced no hashes at all;
/// an unmet confidence gate is not an error, it yields an empty `Vec`.
/// A scan over a large catalog can be long-running; `cancellation` is
/// checked between candidate tracks so callers can abort it cleanly
/// (spec.md §5: "the matcher checks between candidate scans").
pub fn match_query(
    query_hashes: &[HashEntry],
    store: &mut dyn CatalogStore,
    thresholds: MatchThresholds,
    cancellation: &AtomicBool,
) -> Result<Vec<MatchResult>, FingerprintError> {
    if query_hashes.is_empty() {
        return Err(FingerprintError::NoQueryHashes);
    }

    let mut query_index: HashMap<u64, Vec<u32>> = HashMap::new();
    for entry in query_hashes {
        query_index
            .entry(entry.hash.pack())
            .or_default()
            .push(entry.t_anchor);
    }

    let num_query_entries = query_hashes.len() as f64;
    let track_ids = store.list_track_ids()?;

    let mut candidates: Vec<MatchResult> = Vec::new();

    for track_id in track_ids {
        if cancellation.load(Ordering::Relaxed) {
            info!("match cancelled, stopping before next candidate");
            break;
        }

        let stored = store.get_hashes(track_id)?;
        let num_stored = stored.len();
        if num_stored == 0 {
            continue;
        }

        let mut offset_histogram: HashMap<i64, u32> = HashMap::new();
        for entry in &stored {
            let Some(snippet_times) = query_index.get(&entry.hash.pack()) else {
                continue;
            };
            for &t_snip in snippet_times {
                let offset = entry.t_anchor as i64 - t_snip as i64;
                *offset_histogram.entry(offset).or_default() += 1;
            }
        }

        let v_star = offset_histogram.values().copied().max().unwrap_or(0);
        if v_star == 0 {
            continue;
        }

        let r_snip = v_star as f64 / num_query_entries;
        let r_store = v_star as f64 / num_stored as f64;

        if v_star < thresholds.min_votes
            || r_snip < thresholds.min_snippet_ratio
            || r_store < thresholds.min_store_ratio
        {
            continue;
        }

        let score = r_snip * r_store;
        let title = store.get_title(track_id)?;

        candidates.push(MatchResult {
            title,
            score,
            votes: v_star,
        });
    }

    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    // Rank by (score desc, votes desc); keep every co-winner of the top pair.
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap()
            .then(b.votes.cmp(&a.votes))
    });

    let top = candidates[0].clone();
    let winners: Vec<MatchResult> = candidates
        .into_iter()
        .take_while(|c| c.score == top.score && c.votes == top.votes)
        .collect();

    Ok(winners)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builder::{build, InMemoryTrack};
    use crate::fingerprint::fingerprint_signal;
    use crate::store::memory::InMemoryCatalogStore;
    use crate::types::PcmSignal;
    use std::f32::consts::PI;

    fn sine(freq: f32, duration_secs: f32, sample_rate: u32) -> PcmSignal {
        let n = (sample_rate as f32 * duration_secs) as usize;
        let samples = (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect();
        PcmSignal::new(samples, sample_rate)
    }

    fn white_noise(duration_secs: f32, sample_rate: u32) -> PcmSignal {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let n = (sample_rate as f32 * duration_secs) as usize;
        let samples = (0..n)
            .map(|i| {
                let mut h = DefaultHasher::new();
                i.hash(&mut h);
                (h.finish() as f32 / u64::MAX as f32) * 2.0 - 1.0
            })
            .collect();
        PcmSignal::new(samples, sample_rate)
    }

    #[test]
    fn empty_query_fails_with_no_query_hashes() {
        let mut store = InMemoryCatalogStore::new();
        let err = match_query(&[], &mut store, MatchThresholds::default(), &AtomicBool::new(false)).unwrap_err();
        assert!(matches!(err, FingerprintError::NoQueryHashes));
    }

    #[test]
    fn self_match_returns_the_reference_with_high_votes() {
        let mut store = InMemoryCatalogStore::new();
        let pcm = sine(440.0, 10.0, 44100);
        let sources = vec![InMemoryTrack {
            title: "alpha".to_string(),
            pcm: pcm.clone(),
        }];
        build(&sources, &mut store, &AtomicBool::new(false)).unwrap();

        let id = store.lookup_track_by_title("alpha").unwrap();
        let stored_count = store.get_hashes(id).unwrap().len();

        let query_hashes = fingerprint_signal(&pcm).unwrap();
        let results = match_query(&query_hashes, &mut store, MatchThresholds::default(), &AtomicBool::new(false)).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "alpha");
        assert!(results[0].votes as f64 >= 0.5 * stored_count as f64);
    }

    #[test]
    fn snippet_segment_matches_reference_at_expected_offset() {
        let mut store = InMemoryCatalogStore::new();
        let reference = sine(440.0, 10.0, 44100);
        let sources = vec![InMemoryTrack {
            title: "alpha".to_string(),
            pcm: reference.clone(),
        }];
        build(&sources, &mut store, &AtomicBool::new(false)).unwrap();

        // Segment starting at t = 2s, 3s long.
        let start_sample = 2 * 44100;
        let end_sample = start_sample + 3 * 44100;
        let snippet = PcmSignal::new(reference.samples[start_sample..end_sample].to_vec(), 44100);

        let query_hashes = fingerprint_signal(&snippet).unwrap();
        let results = match_query(&query_hashes, &mut store, MatchThresholds::default(), &AtomicBool::new(false)).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "alpha");
    }

    #[test]
    fn noise_below_confidence_floor_returns_empty() {
        let mut store = InMemoryCatalogStore::new();
        let reference = sine(440.0, 10.0, 44100);
        let sources = vec![InMemoryTrack {
            title: "alpha".to_string(),
            pcm: reference,
        }];
        build(&sources, &mut store, &AtomicBool::new(false)).unwrap();

        let noise = white_noise(5.0, 44100);
        let query_hashes = fingerprint_signal(&noise).unwrap();
        let results = match_query(&query_hashes, &mut store, MatchThresholds::default(), &AtomicBool::new(false)).unwrap();

        assert!(results.is_empty());
    }

    #[test]
    fn identical_references_under_different_titles_tie() {
        let mut store = InMemoryCatalogStore::new();
        let reference = sine(440.0, 10.0, 44100);
        let sources = vec![
            InMemoryTrack {
                title: "alpha".to_string(),
                pcm: reference.clone(),
            },
            InMemoryTrack {
                title: "beta".to_string(),
                pcm: reference.clone(),
            },
        ];
        build(&sources, &mut store, &AtomicBool::new(false)).unwrap();

        let start_sample = 2 * 44100;
        let end_sample = start_sample + 3 * 44100;
        let snippet = PcmSignal::new(reference.samples[start_sample..end_sample].to_vec(), 44100);

        let query_hashes = fingerprint_signal(&snippet).unwrap();
        let mut results = match_query(&query_hashes, &mut store, MatchThresholds::default(), &AtomicBool::new(false)).unwrap();
        results.sort_by(|a, b| a.title.cmp(&b.title));

        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["alpha", "beta"]);
    }
}
