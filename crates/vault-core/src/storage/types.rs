//! Persisted account and entry types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::crypto::{Ciphertext, KdfParams, DEFAULT_ITERATIONS};
use crate::error::{Result, VaultError};

/// Key derivation inputs of one account, fixed when the account is created
///
/// Neither field is secret. Both must stay stable for the account's lifetime,
/// otherwise existing entries can no longer be decrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Hex-encoded salt
    pub salt: String,

    /// PBKDF2 iteration count used for this account
    #[serde(default = "default_iterations")]
    pub kdf_iterations: u32,
}

fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

impl Account {
    /// Create an account record
    pub fn new(salt: &str, params: KdfParams) -> Self {
        Self {
            salt: salt.to_string(),
            kdf_iterations: params.iterations,
        }
    }

    /// Derivation parameters recorded for this account
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            iterations: self.kdf_iterations,
        }
    }
}

/// Persisted, opaque form of one credential record
///
/// The owner reference lives beside the ciphertext, never inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEntry {
    /// Unique identifier
    pub id: Uuid,

    /// Owning account
    pub owner_id: String,

    /// Encrypted record (iv:tag:ciphertext format)
    pub encrypted_data: Ciphertext,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last time the ciphertext was replaced
    pub updated_at: DateTime<Utc>,
}

impl StoredEntry {
    /// Create a new entry owned by `owner_id`
    pub fn new(owner_id: &str, encrypted_data: Ciphertext) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            encrypted_data,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Accounts and entries known to a backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct StoreData {
    /// Owner id -> account
    pub accounts: HashMap<String, Account>,
    /// Entry id -> entry
    pub entries: HashMap<Uuid, StoredEntry>,
}

impl StoreData {
    pub fn entries_for(&self, owner_id: &str) -> Vec<StoredEntry> {
        let mut entries: Vec<StoredEntry> = self
            .entries
            .values()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        entries
    }

    pub fn replace(&mut self, id: Uuid, encrypted_data: Ciphertext) -> Result<()> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or_else(|| VaultError::EntryNotFound(id.to_string()))?;
        entry.encrypted_data = encrypted_data;
        entry.updated_at = Utc::now();
        Ok(())
    }
}
