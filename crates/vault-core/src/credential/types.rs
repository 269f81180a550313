//! Credential type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Plaintext shape of one stored secret - zeroed when dropped
///
/// Field order is the canonical serialization order.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CredentialRecord {
    pub website: String,
    pub username: String,
    pub password: String,
}

impl CredentialRecord {
    /// Create a new credential record
    pub fn new(website: &str, username: &str, password: &str) -> Self {
        Self {
            website: website.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Case-insensitive match on website or username
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.website.to_lowercase().contains(&term) || self.username.to_lowercase().contains(&term)
    }
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("website", &self.website)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A decrypted entry: the stored id plus its plaintext record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEntry {
    /// Identifier of the stored entry
    pub id: Uuid,

    /// Decrypted record
    pub record: CredentialRecord,

    /// Last time the ciphertext was written
    pub updated_at: DateTime<Utc>,
}
