//! Token persistence and verification.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use tracing::warn;
use uuid::Uuid;

use crate::auth::token::{self, AuthTokenRecord};
use crate::error::{Error, Result};
use crate::storage::Database;

/// Issues, verifies, and revokes bearer tokens backed by the database.
///
/// Every operation is an independent row-level transaction; there is no
/// cross-request coordination.
#[derive(Clone)]
pub struct TokenStore {
    db: Arc<Database>,
}

impl TokenStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a token and return the record together with the plaintext
    /// secret. The secret is shown exactly once and cannot be retrieved
    /// again.
    pub fn issue(
        &self,
        name: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(AuthTokenRecord, String)> {
        let secret = token::generate_secret();
        let secret_hash = token::hash_secret(&secret)?;
        let record = AuthTokenRecord::new(name, secret_hash, expires_at);

        self.db.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO auth_token
                    (id, name, secret_hash, created_at, last_used_at, expires_at, revoked)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    record.id.to_string(),
                    record.name,
                    record.secret_hash,
                    record.created_at,
                    record.last_used_at,
                    record.expires_at,
                    record.revoked,
                ],
            )
        })?;

        Ok((record, secret))
    }

    pub fn get(&self, id: Uuid) -> Result<Option<AuthTokenRecord>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, secret_hash, created_at, last_used_at, expires_at, revoked
                 FROM auth_token WHERE id = ?1",
            )?;
            let mut rows = stmt.query_map(params![id.to_string()], row_to_record)?;
            rows.next().transpose()
        })
    }

    /// All token records, oldest first. Records carry hashes, never
    /// secrets.
    pub fn list(&self) -> Result<Vec<AuthTokenRecord>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, secret_hash, created_at, last_used_at, expires_at, revoked
                 FROM auth_token ORDER BY id",
            )?;
            let rows = stmt.query_map([], row_to_record)?;
            rows.collect()
        })
    }

    /// Authenticate a full token string.
    ///
    /// Malformed, unknown, revoked, expired, and wrong-secret tokens all
    /// fail with the same [`Error::InvalidCredential`]; the caller learns
    /// nothing about which check failed. On success `last_used_at` is
    /// updated best-effort: a failed update is logged and does not affect
    /// the authentication result.
    pub fn verify(&self, token_string: &str) -> Result<AuthTokenRecord> {
        let (id, secret) = token::decode_token(token_string).ok_or(Error::InvalidCredential)?;

        let mut record = self.get(id)?.ok_or(Error::InvalidCredential)?;
        if !record.is_valid() {
            return Err(Error::InvalidCredential);
        }
        if !token::verify_secret(&secret, &record.secret_hash) {
            return Err(Error::InvalidCredential);
        }

        let now = Utc::now();
        match self.touch(id, now) {
            Ok(()) => record.last_used_at = Some(now),
            Err(err) => warn!(token = %id, "Failed to update last_used_at: {err}"),
        }

        Ok(record)
    }

    /// Flag a token as revoked, keeping its row for audit. Idempotent;
    /// returns whether the token exists.
    pub fn revoke(&self, id: Uuid) -> Result<bool> {
        let updated = self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE auth_token SET revoked = 1 WHERE id = ?1",
                params![id.to_string()],
            )
        })?;
        Ok(updated > 0)
    }

    /// Purge a token row entirely. Returns whether it existed.
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        let deleted = self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM auth_token WHERE id = ?1",
                params![id.to_string()],
            )
        })?;
        Ok(deleted > 0)
    }

    fn touch(&self, id: Uuid, now: DateTime<Utc>) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE auth_token SET last_used_at = ?1 WHERE id = ?2",
                params![now, id.to_string()],
            )
        })?;
        Ok(())
    }
}

fn row_to_record(row: &Row) -> rusqlite::Result<AuthTokenRecord> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|_| {
        rusqlite::Error::InvalidColumnType(0, "id".to_string(), rusqlite::types::Type::Text)
    })?;

    Ok(AuthTokenRecord {
        id,
        name: row.get(1)?,
        secret_hash: row.get(2)?,
        created_at: row.get(3)?,
        last_used_at: row.get(4)?,
        expires_at: row.get(5)?,
        revoked: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store() -> TokenStore {
        TokenStore::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    #[test]
    fn issue_then_verify_round_trips() {
        let store = store();
        let (record, secret) = store.issue("svc", None).unwrap();

        let token = record.encode(&secret);
        let verified = store.verify(&token).unwrap();
        assert_eq!(verified.id, record.id);
        assert_eq!(verified.name, "svc");
        assert!(verified.last_used_at.is_some());
    }

    #[test]
    fn plaintext_secret_is_not_recoverable_from_the_record() {
        let store = store();
        let (_, secret) = store.issue("svc", None).unwrap();

        let stored = &store.list().unwrap()[0];
        assert_ne!(stored.secret_hash, secret);
        assert!(!stored.secret_hash.contains(&secret));
    }

    #[test]
    fn revoked_token_fails_verify_with_the_correct_secret() {
        let store = store();
        let (record, secret) = store.issue("svc", None).unwrap();
        let token = record.encode(&secret);

        assert!(store.verify(&token).is_ok());
        assert!(store.revoke(record.id).unwrap());
        assert!(matches!(
            store.verify(&token),
            Err(Error::InvalidCredential)
        ));

        // Revocation keeps the row.
        let stored = store.get(record.id).unwrap().unwrap();
        assert!(stored.revoked);
    }

    #[test]
    fn revoke_is_idempotent_and_reports_missing_rows() {
        let store = store();
        let (record, _) = store.issue("svc", None).unwrap();

        assert!(store.revoke(record.id).unwrap());
        assert!(store.revoke(record.id).unwrap());
        assert!(!store.revoke(Uuid::now_v7()).unwrap());
    }

    #[test]
    fn expired_token_fails_verify() {
        let store = store();
        let past = Utc::now() - Duration::hours(1);
        let (record, secret) = store.issue("svc", Some(past)).unwrap();

        assert!(matches!(
            store.verify(&record.encode(&secret)),
            Err(Error::InvalidCredential)
        ));
    }

    #[test]
    fn future_expiry_still_verifies() {
        let store = store();
        let future = Utc::now() + Duration::hours(1);
        let (record, secret) = store.issue("svc", Some(future)).unwrap();
        assert!(store.verify(&record.encode(&secret)).is_ok());
    }

    #[test]
    fn wrong_secret_fails_verify() {
        let store = store();
        let (record, _) = store.issue("svc", None).unwrap();
        let forged = record.encode(&token::generate_secret());

        assert!(matches!(
            store.verify(&forged),
            Err(Error::InvalidCredential)
        ));
    }

    #[test]
    fn malformed_token_fails_verify() {
        let store = store();
        assert!(matches!(
            store.verify("garbage-not-a-token"),
            Err(Error::InvalidCredential)
        ));
    }

    #[test]
    fn delete_purges_the_row() {
        let store = store();
        let (record, secret) = store.issue("svc", None).unwrap();

        assert!(store.delete(record.id).unwrap());
        assert!(!store.delete(record.id).unwrap());
        assert!(store.get(record.id).unwrap().is_none());
        assert!(matches!(
            store.verify(&record.encode(&secret)),
            Err(Error::InvalidCredential)
        ));
    }

    #[test]
    fn list_is_ordered_by_creation() {
        let store = store();
        let (first, _) = store.issue("first", None).unwrap();
        let (second, _) = store.issue("second", None).unwrap();

        let tokens = store.list().unwrap();
        assert_eq!(tokens.len(), 2);
        // v7 ids sort by creation time.
        assert_eq!(tokens[0].id, first.id);
        assert_eq!(tokens[1].id, second.id);
    }
}
