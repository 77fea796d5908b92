//! An in-memory `CatalogStore`, used by the test suite so it can exercise
//! the builder and matcher without a live Postgres instance.

use std::collections::{HashMap, HashSet};

use super::CatalogStore;
use crate::error::FingerprintError;
use crate::types::{HashEntry, TrackRecord};

#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    tracks: Vec<TrackRecord>,
    hashes: HashMap<i32, Vec<HashEntry>>,
    seen: HashMap<i32, HashSet<(u64, u32)>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_index(&self, track_id: i32) -> Option<usize> {
        self.tracks.iter().position(|t| t.track_id == track_id)
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn init_schema(&mut self) -> Result<(), FingerprintError> {
        self.tracks.clear();
        self.hashes.clear();
        self.seen.clear();
        Ok(())
    }

    fn insert_track(&mut self, title: &str) -> Result<i32, FingerprintError> {
        let track_id = self.tracks.len() as i32 + 1;
        self.tracks.push(TrackRecord {
            track_id,
            title: title.to_string(),
            fingerprinted: false,
        });
        self.hashes.insert(track_id, Vec::new());
        self.seen.insert(track_id, HashSet::new());
        Ok(track_id)
    }

    fn lookup_track_by_title(&mut self, title: &str) -> Result<i32, FingerprintError> {
        self.tracks
            .iter()
            .find(|t| t.title == title)
            .map(|t| t.track_id)
            .ok_or_else(|| FingerprintError::NotFound(title.to_string()))
    }

    fn put_hashes(&mut self, track_id: i32, entries: &[HashEntry]) -> Result<(), FingerprintError> {
        if self.find_index(track_id).is_none() {
            return Err(FingerprintError::NotFound(format!("track_id {track_id}")));
        }

        let seen = self.seen.entry(track_id).or_default();
        let bucket = self.hashes.entry(track_id).or_default();

        for entry in entries {
            let key = (entry.hash.pack(), entry.t_anchor);
            if seen.insert(key) {
                bucket.push(*entry);
            }
        }
        Ok(())
    }

    fn mark_fingerprinted(&mut self, track_id: i32) -> Result<(), FingerprintError> {
        let idx = self
            .find_index(track_id)
            .ok_or_else(|| FingerprintError::NotFound(format!("track_id {track_id}")))?;
        self.tracks[idx].fingerprinted = true;
        Ok(())
    }

    fn get_title(&mut self, track_id: i32) -> Result<String, FingerprintError> {
        self.find_index(track_id)
            .map(|idx| self.tracks[idx].title.clone())
            .ok_or_else(|| FingerprintError::NotFound(format!("track_id {track_id}")))
    }

    fn list_track_ids(&mut self) -> Result<Vec<i32>, FingerprintError> {
        let mut ids: Vec<i32> = self.tracks.iter().map(|t| t.track_id).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn get_hashes(&mut self, track_id: i32) -> Result<Vec<HashEntry>, FingerprintError> {
        Ok(self.hashes.get(&track_id).cloned().unwrap_or_default())
    }

    fn is_fingerprinted(&mut self, track_id: i32) -> Result<bool, FingerprintError> {
        self.find_index(track_id)
            .map(|idx| self.tracks[idx].fingerprinted)
            .ok_or_else(|| FingerprintError::NotFound(format!("track_id {track_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_title_round_trips() {
        let mut store = InMemoryCatalogStore::new();
        let id = store.insert_track("alpha").unwrap();
        assert_eq!(store.get_title(id).unwrap(), "alpha");
    }

    #[test]
    fn put_hashes_dedups_across_calls() {
        let mut store = InMemoryCatalogStore::new();
        let id = store.insert_track("alpha").unwrap();
        let entry = HashEntry {
            hash: crate::types::HashTriple {
                anchor_freq_bin: 1,
                target_freq_bin: 2,
                delta_t: 3,
            },
            t_anchor: 10,
        };
        store.put_hashes(id, &[entry]).unwrap();
        store.put_hashes(id, &[entry]).unwrap();
        assert_eq!(store.get_hashes(id).unwrap().len(), 1);
    }

    #[test]
    fn lookup_missing_title_fails() {
        let mut store = InMemoryCatalogStore::new();
        assert!(store.lookup_track_by_title("nope").is_err());
    }
}
