//! Token records and the credential wire format.
//!
//! A full token string is `sk-sauti-v1-` + base64url(`"<id>:<secret>"`).
//! The id alone enables O(1) lookup but is not a credential; only id and
//! secret together authenticate. The plaintext secret exists once, at
//! issuance, and only its Argon2 hash is ever stored.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Fixed literal prefix of every token string.
pub const TOKEN_PREFIX: &str = "sk-sauti-v1-";

const SECRET_BYTE_LENGTH: usize = 32;

/// A persisted auth token. Never contains the plaintext secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokenRecord {
    /// v7 ids sort by creation time.
    pub id: Uuid,
    pub name: String,
    /// PHC-encoded Argon2 hash of the secret.
    pub secret_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked: bool,
}

impl AuthTokenRecord {
    pub(crate) fn new(
        name: &str,
        secret_hash: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.to_string(),
            secret_hash,
            created_at: Utc::now(),
            last_used_at: None,
            expires_at,
            revoked: false,
        }
    }

    /// Format the full token string. Pure; the record is unchanged.
    pub fn encode(&self, secret: &str) -> String {
        let payload = format!("{}:{}", self.id, secret);
        format!("{TOKEN_PREFIX}{}", URL_SAFE.encode(payload))
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() > expires_at,
            None => false,
        }
    }

    /// Valid iff not revoked and not past its expiry.
    pub fn is_valid(&self) -> bool {
        !self.revoked && !self.is_expired()
    }
}

/// Generate a cryptographically random, URL-safe secret.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a secret for storage (Argon2, PHC string format).
pub fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| Error::HashError(err.to_string()))
}

/// Verify a secret against its stored hash. An unparsable hash verifies as
/// false, never as an error.
pub fn verify_secret(secret: &str, secret_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(secret_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}

/// Parse a token string into its id and secret components.
///
/// Pure: checks the prefix, base64url payload, UTF-8, and exactly one `:`
/// separator, without touching storage. Any malformation yields `None`.
pub fn decode_token(token: &str) -> Option<(Uuid, String)> {
    let payload = token.strip_prefix(TOKEN_PREFIX)?;
    let decoded = URL_SAFE.decode(payload).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    let mut parts = decoded.split(':');
    let id = parts.next()?;
    let secret = parts.next()?;
    if parts.next().is_some() || secret.is_empty() {
        return None;
    }

    let id = Uuid::parse_str(id).ok()?;
    Some((id, secret.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let secret = generate_secret();
        let record = AuthTokenRecord::new("svc", "unused".into(), None);
        let token = record.encode(&secret);

        assert!(token.starts_with(TOKEN_PREFIX));
        let (id, decoded_secret) = decode_token(&token).unwrap();
        assert_eq!(id, record.id);
        assert_eq!(decoded_secret, secret);
    }

    #[test]
    fn decode_rejects_malformed_tokens() {
        // Missing prefix.
        assert!(decode_token("garbage-not-a-token").is_none());
        // Invalid base64 payload.
        assert!(decode_token(&format!("{TOKEN_PREFIX}!!!not-base64!!!")).is_none());
        // No separator after decoding.
        let no_colon = format!("{TOKEN_PREFIX}{}", URL_SAFE.encode("justonepart"));
        assert!(decode_token(&no_colon).is_none());
        // More than one separator.
        let two_colons = format!(
            "{TOKEN_PREFIX}{}",
            URL_SAFE.encode(format!("{}:a:b", Uuid::now_v7()))
        );
        assert!(decode_token(&two_colons).is_none());
        // Separator but no uuid.
        let bad_id = format!("{TOKEN_PREFIX}{}", URL_SAFE.encode("not-a-uuid:secret"));
        assert!(decode_token(&bad_id).is_none());
        // Empty secret.
        let empty_secret = format!(
            "{TOKEN_PREFIX}{}",
            URL_SAFE.encode(format!("{}:", Uuid::now_v7()))
        );
        assert!(decode_token(&empty_secret).is_none());
    }

    #[test]
    fn hash_verifies_only_the_original_secret() {
        let secret = generate_secret();
        let hash = hash_secret(&secret).unwrap();

        assert_ne!(hash, secret);
        assert!(!hash.contains(&secret));
        assert!(verify_secret(&secret, &hash));
        assert!(!verify_secret("wrong", &hash));
        assert!(!verify_secret(&secret, "not-a-phc-string"));
    }

    #[test]
    fn secrets_are_distinct_and_urlsafe() {
        let a = generate_secret();
        let b = generate_secret();
        assert_ne!(a, b);
        assert!(!a.contains(':'));
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn validity_respects_revocation_and_expiry() {
        let mut record = AuthTokenRecord::new("svc", "hash".into(), None);
        assert!(record.is_valid());

        record.revoked = true;
        assert!(!record.is_valid());

        record.revoked = false;
        record.expires_at = Some(Utc::now() - chrono::Duration::hours(1));
        assert!(record.is_expired());
        assert!(!record.is_valid());

        record.expires_at = Some(Utc::now() + chrono::Duration::hours(1));
        assert!(record.is_valid());
    }
}
