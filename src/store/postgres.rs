//! Diesel/Postgres-backed `CatalogStore`.
//!
//! Mirrors the reference schema from spec.md §6: a `track` relation and a
//! `fingerprint` relation cascade-deleted with its owning track. A
//! `UNIQUE (track_id, t_anchor, hash_triple)` constraint (declared in the
//! migration, not visible to diesel's schema DSL) resolves spec.md §9's
//! open question on cross-batch dedup via `ON CONFLICT DO NOTHING`.

use diesel::dsl::insert_into;
use diesel::prelude::*;
use diesel::upsert::on_constraint;

use super::CatalogStore;
use crate::error::FingerprintError;
use crate::schema::{fingerprint, track};
use crate::types::{HashEntry, HashTriple};

const BATCH_SIZE: usize = 15_000;

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::track)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct TrackRow {
    track_id: i32,
    title: String,
    fingerprinted: bool,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::track)]
struct NewTrack<'a> {
    title: &'a str,
}

#[derive(Queryable, Selectable, Insertable, Clone, Copy, Debug)]
#[diesel(table_name = crate::schema::fingerprint)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct FingerprintRow {
    track_id: i32,
    t_anchor: i32,
    hash_triple: i64,
}

pub struct PgCatalogStore {
    conn: PgConnection,
}

impl PgCatalogStore {
    pub fn connect(database_url: &str) -> Result<Self, FingerprintError> {
        let conn = PgConnection::establish(database_url)
            .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))?;
        Ok(Self { conn })
    }
}

impl CatalogStore for PgCatalogStore {
    fn init_schema(&mut self) -> Result<(), FingerprintError> {
        diesel::sql_query("DROP TABLE IF EXISTS fingerprint")
            .execute(&mut self.conn)
            .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))?;
        diesel::sql_query("DROP TABLE IF EXISTS track")
            .execute(&mut self.conn)
            .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))?;

        diesel::sql_query(
            "CREATE TABLE track (
                track_id SERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                fingerprinted BOOLEAN NOT NULL DEFAULT false
            )",
        )
        .execute(&mut self.conn)
        .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))?;

        diesel::sql_query(
            "CREATE TABLE fingerprint (
                entry_id BIGSERIAL PRIMARY KEY,
                track_id INT NOT NULL REFERENCES track (track_id) ON DELETE CASCADE,
                t_anchor INT NOT NULL,
                hash_triple BIGINT NOT NULL,
                CONSTRAINT fingerprint_unique_entry UNIQUE (track_id, t_anchor, hash_triple)
            )",
        )
        .execute(&mut self.conn)
        .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))?;

        Ok(())
    }

    fn insert_track(&mut self, title: &str) -> Result<i32, FingerprintError> {
        let row: TrackRow = insert_into(track::table)
            .values(&NewTrack { title })
            .returning(TrackRow::as_returning())
            .get_result(&mut self.conn)
            .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))?;
        Ok(row.track_id)
    }

    fn lookup_track_by_title(&mut self, title: &str) -> Result<i32, FingerprintError> {
        track::table
            .filter(track::title.eq(title))
            .select(track::track_id)
            .first(&mut self.conn)
            .optional()
            .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))?
            .ok_or_else(|| FingerprintError::NotFound(title.to_string()))
    }

    fn put_hashes(&mut self, track_id: i32, entries: &[HashEntry]) -> Result<(), FingerprintError> {
        let rows: Vec<FingerprintRow> = entries
            .iter()
            .map(|e| FingerprintRow {
                track_id,
                t_anchor: e.t_anchor as i32,
                hash_triple: e.hash.pack() as i64,
            })
            .collect();

        if rows.is_empty() {
            return Ok(());
        }

        self.conn
            .transaction(|conn| {
                for batch in rows.chunks(BATCH_SIZE) {
                    insert_into(fingerprint::table)
                        .values(batch)
                        .on_conflict(on_constraint("fingerprint_unique_entry"))
                        .do_nothing()
                        .execute(conn)?;
                }
                Ok::<_, diesel::result::Error>(())
            })
            .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))
    }

    fn mark_fingerprinted(&mut self, track_id: i32) -> Result<(), FingerprintError> {
        diesel::update(track::table.filter(track::track_id.eq(track_id)))
            .set(track::fingerprinted.eq(true))
            .execute(&mut self.conn)
            .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    fn get_title(&mut self, track_id: i32) -> Result<String, FingerprintError> {
        track::table
            .filter(track::track_id.eq(track_id))
            .select(track::title)
            .first(&mut self.conn)
            .optional()
            .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))?
            .ok_or_else(|| FingerprintError::NotFound(format!("track_id {track_id}")))
    }

    fn list_track_ids(&mut self) -> Result<Vec<i32>, FingerprintError> {
        track::table
            .select(track::track_id)
            .order(track::track_id.asc())
            .load(&mut self.conn)
            .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))
    }

    fn get_hashes(&mut self, track_id: i32) -> Result<Vec<HashEntry>, FingerprintError> {
        let rows: Vec<(i32, i64)> = fingerprint::table
            .filter(fingerprint::track_id.eq(track_id))
            .select((fingerprint::t_anchor, fingerprint::hash_triple))
            .load(&mut self.conn)
            .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(t_anchor, hash_triple)| HashEntry {
                hash: HashTriple::unpack(hash_triple as u64),
                t_anchor: t_anchor as u32,
            })
            .collect())
    }

    fn is_fingerprinted(&mut self, track_id: i32) -> Result<bool, FingerprintError> {
        track::table
            .filter(track::track_id.eq(track_id))
            .select(track::fingerprinted)
            .first(&mut self.conn)
            .optional()
            .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))?
            .ok_or_else(|| FingerprintError::NotFound(format!("track_id {track_id}")))
    }
}

