//! Speaker profile persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::storage::Database;

/// A named, persisted voice-cloning artifact.
///
/// The payload is produced by the model backend and stored opaquely; this
/// crate never interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerProfile {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub data: Vec<u8>,
}

/// Repository for speaker profiles.
#[derive(Clone)]
pub struct SpeakerStore {
    db: Arc<Database>,
}

impl SpeakerStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Persists a new profile and returns the stored record.
    pub fn create(&self, name: &str, data: Vec<u8>) -> Result<SpeakerProfile> {
        let profile = SpeakerProfile {
            id: Uuid::now_v7(),
            name: name.to_string(),
            created_at: Utc::now(),
            data,
        };

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO speaker_profile (id, name, created_at, data) VALUES (?1, ?2, ?3, ?4)",
                params![
                    profile.id.to_string(),
                    profile.name,
                    profile.created_at,
                    profile.data,
                ],
            )
        })?;

        Ok(profile)
    }

    pub fn get(&self, id: Uuid) -> Result<Option<SpeakerProfile>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, created_at, data FROM speaker_profile WHERE id = ?1",
            )?;
            let mut rows = stmt.query_map(params![id.to_string()], row_to_profile)?;
            rows.next().transpose()
        })
    }

    pub fn list(&self) -> Result<Vec<SpeakerProfile>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, created_at, data FROM speaker_profile ORDER BY id",
            )?;
            let rows = stmt.query_map([], row_to_profile)?;
            rows.collect()
        })
    }
}

fn row_to_profile(row: &Row) -> rusqlite::Result<SpeakerProfile> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|_| {
        rusqlite::Error::InvalidColumnType(0, "id".to_string(), rusqlite::types::Type::Text)
    })?;

    Ok(SpeakerProfile {
        id,
        name: row.get(1)?,
        created_at: row.get(2)?,
        data: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SpeakerStore {
        SpeakerStore::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    #[test]
    fn create_then_get_round_trips_payload() {
        let store = store();
        let payload = vec![0u8, 1, 2, 254, 255];
        let created = store.create("narrator", payload.clone()).unwrap();

        let fetched = store.get(created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "narrator");
        assert_eq!(fetched.data, payload);
        assert_eq!(fetched.id, created.id);
    }

    #[test]
    fn get_unknown_is_none() {
        let store = store();
        assert!(store.get(Uuid::now_v7()).unwrap().is_none());
    }

    #[test]
    fn list_returns_all_profiles_in_id_order() {
        let store = store();
        let first = store.create("a", vec![1]).unwrap();
        let second = store.create("b", vec![2]).unwrap();

        let profiles = store.list().unwrap();
        assert_eq!(profiles.len(), 2);
        // v7 ids are time-sortable, so insertion order holds.
        assert_eq!(profiles[0].id, first.id);
        assert_eq!(profiles[1].id, second.id);
    }
}
