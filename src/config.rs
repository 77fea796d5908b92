//! Module K — environment-driven configuration.
//!
//! Matcher thresholds are "policy, not truth" (spec.md §4.E) and are exposed
//! here as overridable defaults, mirroring the teacher's `dotenvy`-based
//! `DB::new` bootstrap in spirit.

use crate::catalog::matcher::MatchThresholds;
use crate::error::FingerprintError;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub thresholds: MatchThresholds,
}

impl Config {
    /// Loads configuration from `.env` (if present) and the process
    /// environment. `DATABASE_URL` is required; threshold overrides are
    /// optional and fall back to the spec defaults.
    pub fn from_env() -> Result<Self, FingerprintError> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| FingerprintError::StoreUnavailable("DATABASE_URL must be set".to_string()))?;

        let mut thresholds = MatchThresholds::default();
        if let Some(v) = env_f64("MATCH_MIN_SNIPPET_RATIO") {
            thresholds.min_snippet_ratio = v;
        }
        if let Some(v) = env_f64("MATCH_MIN_STORE_RATIO") {
            thresholds.min_store_ratio = v;
        }
        if let Some(v) = env_u32("MATCH_MIN_VOTES") {
            thresholds.min_votes = v;
        }

        Ok(Self {
            database_url,
            thresholds,
        })
    }
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
