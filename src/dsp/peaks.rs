//! Module B — peak extractor.
//!
//! Selects the dominant frequency bins in each power-grid column under
//! magnitude-ratio gating: a bin qualifies only if its magnitude is at least
//! `PEAK_RATIO` of the column's maximum. This keeps peak density comparable
//! across quiet and loud sections of a track, and bounds the search space
//! for the constellation hasher.

use crate::types::{Peak, PowerGrid};
use ordered_float::OrderedFloat;

pub const MAX_PEAKS_PER_COLUMN: usize = 5;
pub const PEAK_RATIO: f32 = 0.25;

/// Extracts peaks from every column of `grid`, in ascending `time_frame` order.
///
/// Within a column, ties on the selection boundary break toward the lower
/// `freq_bin`, making the result deterministic.
pub fn extract_peaks(grid: &PowerGrid) -> Vec<Peak> {
    let mut peaks = Vec::new();

    for (time_frame, column) in grid.columns.iter().enumerate() {
        let max = column.iter().cloned().fold(0.0f32, f32::max);
        if max <= 0.0 {
            continue;
        }

        let threshold = PEAK_RATIO * max;

        // Rank bin indices by (magnitude desc, freq_bin asc) so ties resolve
        // toward the lower bin deterministically, then take the top K.
        let mut ranked: Vec<usize> = (0..column.len()).collect();
        ranked.sort_by(|&a, &b| {
            column[b]
                .partial_cmp(&column[a])
                .unwrap()
                .then(a.cmp(&b))
        });

        let k = MAX_PEAKS_PER_COLUMN.min(ranked.len());
        for &freq_bin in ranked.iter().take(k) {
            let magnitude = column[freq_bin];
            if magnitude >= threshold {
                peaks.push(Peak {
                    time_frame,
                    freq_bin: freq_bin as u16,
                    magnitude: OrderedFloat(magnitude),
                });
            }
        }
    }

    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from_columns(columns: Vec<Vec<f32>>) -> PowerGrid {
        let num_bins = columns.first().map(|c| c.len()).unwrap_or(0);
        PowerGrid {
            freq_axis: (0..num_bins).map(|i| i as f32).collect(),
            time_axis: (0..columns.len()).map(|i| i as f32).collect(),
            columns,
        }
    }

    #[test]
    fn peaks_respect_ratio_gate() {
        let grid = grid_from_columns(vec![vec![1.0, 0.9, 0.1, 0.05, 0.5, 0.3]]);
        let peaks = extract_peaks(&grid);
        for peak in &peaks {
            assert!(peak.magnitude.into_inner() >= 0.25 * 1.0);
        }
    }

    #[test]
    fn at_most_five_peaks_per_column() {
        let grid = grid_from_columns(vec![vec![1.0; 20]]);
        let peaks = extract_peaks(&grid);
        assert!(peaks.len() <= MAX_PEAKS_PER_COLUMN);
    }

    #[test]
    fn all_zero_column_yields_no_peaks() {
        let grid = grid_from_columns(vec![vec![0.0; 10]]);
        assert!(extract_peaks(&grid).is_empty());
    }

    #[test]
    fn ties_break_toward_lower_freq_bin() {
        let grid = grid_from_columns(vec![vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]]);
        let peaks = extract_peaks(&grid);
        let bins: Vec<u16> = peaks.iter().map(|p| p.freq_bin).collect();
        assert_eq!(bins, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn peaks_are_ascending_in_time_frame() {
        let grid = grid_from_columns(vec![vec![1.0, 0.5], vec![0.9, 0.2], vec![0.8, 0.1]]);
        let peaks = extract_peaks(&grid);
        let frames: Vec<usize> = peaks.iter().map(|p| p.time_frame).collect();
        let mut sorted = frames.clone();
        sorted.sort();
        assert_eq!(frames, sorted);
    }
}
