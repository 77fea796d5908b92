//! Module A — spectrogram engine.
//!
//! Computes a log-magnitude time-frequency grid from a mono PCM signal via
//! overlapped, Hamming-windowed DFT. Window size and hop are fixed (4096 and
//! 2048) so that `Δt` values downstream stay stable under small alignment
//! shifts (see `fingerprint::hasher`).

use crate::dsp::fft;
use crate::error::FingerprintError;
use crate::types::{PcmSignal, PowerGrid};

pub const WINDOW_SIZE: usize = 4096;
pub const HOP_SIZE: usize = WINDOW_SIZE / 2;

/// Precomputes a Hamming window of length `WINDOW_SIZE`.
fn hamming_window() -> Vec<f32> {
    (0..WINDOW_SIZE)
        .map(|n| {
            0.54 - 0.46 * (2.0 * std::f32::consts::PI * n as f32 / (WINDOW_SIZE as f32 - 1.0)).cos()
        })
        .collect()
}

/// Computes the power grid for `signal`.
///
/// Fails with `EmptySignal` if the signal's peak absolute amplitude is zero,
/// and `SignalTooShort` if fewer than one full analysis frame fits.
pub fn spectrogram(signal: &PcmSignal) -> Result<PowerGrid, FingerprintError> {
    let max_abs = signal
        .samples
        .iter()
        .fold(0.0f32, |acc, &s| acc.max(s.abs()));

    if max_abs == 0.0 {
        return Err(FingerprintError::EmptySignal);
    }

    let len = signal.samples.len();
    if len < WINDOW_SIZE {
        return Err(FingerprintError::SignalTooShort {
            window: WINDOW_SIZE,
            len,
        });
    }

    let num_frames = (len - WINDOW_SIZE) / HOP_SIZE;
    if num_frames < 1 {
        return Err(FingerprintError::SignalTooShort {
            window: WINDOW_SIZE,
            len,
        });
    }

    let window = hamming_window();
    let num_bins = WINDOW_SIZE / 2;
    let mut columns = Vec::with_capacity(num_frames);

    for frame_idx in 0..num_frames {
        let start = frame_idx * HOP_SIZE;
        let windowed: Vec<f32> = signal.samples[start..start + WINDOW_SIZE]
            .iter()
            .zip(window.iter())
            .map(|(&sample, &w)| (sample / max_abs) * w)
            .collect();

        let mut buf = fft::real_to_complex(&windowed);
        fft::forward(&mut buf);

        let column: Vec<f32> = buf[..num_bins]
            .iter()
            .map(|c| {
                let magnitude = c.norm_sqr().sqrt();
                let power = (1.0 + magnitude).ln();
                if power.is_finite() { power.max(0.0) } else { 0.0 }
            })
            .collect();

        columns.push(column);
    }

    let freq_axis: Vec<f32> = (0..num_bins)
        .map(|k| k as f32 * signal.sample_rate as f32 / WINDOW_SIZE as f32)
        .collect();
    let time_axis: Vec<f32> = (0..num_frames)
        .map(|i| i as f32 * HOP_SIZE as f32 / signal.sample_rate as f32)
        .collect();

    Ok(PowerGrid {
        columns,
        freq_axis,
        time_axis,
    })
}
