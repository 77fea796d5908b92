//! Module G — the `CatalogStore` boundary consumed by the builder and matcher.

pub mod memory;
pub mod postgres;

use crate::error::FingerprintError;
use crate::types::HashEntry;

/// Persistence interface for reference-track hashes.
///
/// Implementations must serialize writes while allowing concurrent reads
/// (the builder may ingest tracks in parallel; the matcher may scan
/// candidates in parallel).
pub trait CatalogStore {
    /// Drops and recreates the backing schema. Destructive.
    fn init_schema(&mut self) -> Result<(), FingerprintError>;

    /// Assigns a fresh monotonic track id for `title`.
    fn insert_track(&mut self, title: &str) -> Result<i32, FingerprintError>;

    /// Exact-match lookup; fails with `NotFound` if no track has this title.
    fn lookup_track_by_title(&mut self, title: &str) -> Result<i32, FingerprintError>;

    /// Persists `entries` for `track_id`, deduplicating `(hash, t_anchor)`
    /// pairs both within the batch and against anything already stored.
    fn put_hashes(&mut self, track_id: i32, entries: &[HashEntry]) -> Result<(), FingerprintError>;

    /// Marks `track_id` as fully fingerprinted.
    fn mark_fingerprinted(&mut self, track_id: i32) -> Result<(), FingerprintError>;

    fn get_title(&mut self, track_id: i32) -> Result<String, FingerprintError>;

    /// Lists every known track id, ascending.
    fn list_track_ids(&mut self) -> Result<Vec<i32>, FingerprintError>;

    fn get_hashes(&mut self, track_id: i32) -> Result<Vec<HashEntry>, FingerprintError>;

    fn is_fingerprinted(&mut self, track_id: i32) -> Result<bool, FingerprintError>;
}
