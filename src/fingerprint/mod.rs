pub mod hasher;

use crate::error::FingerprintError;
use crate::types::{HashEntry, PcmSignal};
use crate::dsp::{peaks, spectrogram};

/// Runs the full A->B->C pipeline over a decoded signal, producing the
/// deduplicated hash stream used for both ingest and querying.
pub fn fingerprint_signal(signal: &PcmSignal) -> Result<Vec<HashEntry>, FingerprintError> {
    let grid = spectrogram::spectrogram(signal)?;
    let detected_peaks = peaks::extract_peaks(&grid);
    Ok(hasher::hash_peaks(&detected_peaks))
}
