//! Credential manager for CRUD operations on encrypted entries

use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{CredentialRecord, VaultEntry};
use crate::error::{Result, VaultError};
use crate::session::SessionKeyHolder;
use crate::storage::{EntryStore, StoredEntry};

/// Credential manager for one account
///
/// Records are encrypted with the session key before they reach the store
/// and decrypted only after they come back.
pub struct CredentialManager {
    /// Owning account
    owner_id: String,
    /// Storage backend
    store: Arc<dyn EntryStore>,
    /// Session key
    session: SessionKeyHolder,
}

impl CredentialManager {
    /// Create a new credential manager
    pub fn new(owner_id: &str, store: Arc<dyn EntryStore>, session: SessionKeyHolder) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            store,
            session,
        }
    }

    /// Encrypt and store a new record
    pub async fn add(&self, record: &CredentialRecord) -> Result<Uuid> {
        validate(record)?;

        let ciphertext = self.session.encrypt(record).await?;
        let stored = self.store.insert_entry(&self.owner_id, ciphertext).await?;

        info!("Added entry: {}", stored.id);
        Ok(stored.id)
    }

    /// List and decrypt every entry of the account
    ///
    /// All-or-nothing: one undecryptable entry locks the session and fails
    /// the whole listing.
    pub async fn list(&self) -> Result<Vec<VaultEntry>> {
        if !self.session.is_key_set().await {
            return Err(VaultError::VaultLocked);
        }

        let stored = self.store.list_entries(&self.owner_id).await?;
        let entries = self.session.decrypt_all(&stored).await?;

        debug!("Decrypted {} entries", entries.len());
        Ok(entries)
    }

    /// Entries whose website or username contains `term`, ignoring case
    pub async fn search(&self, term: &str) -> Result<Vec<VaultEntry>> {
        let entries = self.list().await?;
        Ok(entries.into_iter().filter(|e| e.record.matches(term)).collect())
    }

    /// Get and decrypt a single entry
    pub async fn get(&self, id: Uuid) -> Result<VaultEntry> {
        let stored = self.owned_entry(id).await?;
        let record = self.session.decrypt(&stored.encrypted_data).await?;

        Ok(VaultEntry {
            id: stored.id,
            record,
            updated_at: stored.updated_at,
        })
    }

    /// Replace an entry with a freshly encrypted record
    pub async fn update(&self, id: Uuid, record: &CredentialRecord) -> Result<()> {
        validate(record)?;
        self.owned_entry(id).await?;

        let ciphertext = self.session.encrypt(record).await?;
        self.store.update_entry(id, ciphertext).await?;

        info!("Updated entry: {}", id);
        Ok(())
    }

    /// Delete an entry
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.owned_entry(id).await?;
        self.store.delete_entry(id).await?;

        info!("Deleted entry: {}", id);
        Ok(())
    }

    /// Entries of other accounts are reported as missing
    async fn owned_entry(&self, id: Uuid) -> Result<StoredEntry> {
        self.store
            .get_entry(id)
            .await?
            .filter(|entry| entry.owner_id == self.owner_id)
            .ok_or_else(|| VaultError::EntryNotFound(id.to_string()))
    }
}

fn validate(record: &CredentialRecord) -> Result<()> {
    if record.website.trim().is_empty() {
        return Err(VaultError::InvalidInput("Website is required".to_string()));
    }
    if record.password.is_empty() {
        return Err(VaultError::InvalidInput("Password is required".to_string()));
    }
    Ok(())
}
