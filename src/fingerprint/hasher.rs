//! Module C — constellation hasher.
//!
//! Pairs each anchor peak with up to `FAN_OUT` forward peaks, emitting a
//! `(hash_triple, anchor_time)` entry per pair whose time delta falls in
//! `(0, MAX_DELTA_T]`. A correct recording reproduces the same triples under
//! noise; incoherent background perturbs them.

use crate::types::{HashEntry, HashTriple, Peak};
use std::collections::HashSet;

pub const FAN_OUT: usize = 6;
pub const MAX_DELTA_T: usize = 20;

/// Hashes a time-sorted peak list, deduplicating by `(hash, t_anchor)` while
/// preserving first-occurrence order.
pub fn hash_peaks(peaks: &[Peak]) -> Vec<HashEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for (anchor_idx, anchor) in peaks.iter().enumerate() {
        for offset in 1..=FAN_OUT {
            let target_idx = anchor_idx + offset;
            let Some(target) = peaks.get(target_idx) else {
                break;
            };

            if target.time_frame <= anchor.time_frame {
                continue;
            }
            let delta_t = target.time_frame - anchor.time_frame;
            if delta_t == 0 || delta_t > MAX_DELTA_T {
                continue;
            }

            let hash = HashTriple {
                anchor_freq_bin: anchor.freq_bin,
                target_freq_bin: target.freq_bin,
                delta_t: delta_t as u8,
            };
            let entry = HashEntry {
                hash,
                t_anchor: anchor.time_frame as u32,
            };

            if seen.insert((hash, entry.t_anchor)) {
                entries.push(entry);
            }
        }
    }

    entries
}
