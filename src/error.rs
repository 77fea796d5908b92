//! Error taxonomy shared by the spectrogram engine, builder, and matcher.
//!
//! `BelowConfidence` is intentionally absent: per spec, an unmet confidence
//! gate is not an error, it is an empty match list.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("signal is empty or silent (max absolute sample is zero)")]
    EmptySignal,

    #[error("signal too short for the analysis window (need at least {window} samples, got {len})")]
    SignalTooShort { window: usize, len: usize },

    #[error("failed to decode audio: {0}")]
    Decode(String),

    #[error("catalog store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("query snippet produced no hashes")]
    NoQueryHashes,
}

pub type Result<T> = std::result::Result<T, FingerprintError>;
