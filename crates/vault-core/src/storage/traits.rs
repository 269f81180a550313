//! Storage trait definitions

use async_trait::async_trait;
use uuid::Uuid;

use super::{Account, StoredEntry};
use crate::crypto::Ciphertext;
use crate::error::Result;

/// Persistence collaborator holding account records and ciphertext
///
/// Implementations only ever see ciphertext, salts and iteration counts. Their
/// failures must be reported as storage errors, never as decryption errors.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Load the account record (salt and KDF parameters)
    async fn load_account(&self, owner_id: &str) -> Result<Option<Account>>;

    /// Persist the account record
    async fn save_account(&self, owner_id: &str, account: &Account) -> Result<()>;

    /// List all entries owned by an account
    async fn list_entries(&self, owner_id: &str) -> Result<Vec<StoredEntry>>;

    /// Get a single entry by id
    async fn get_entry(&self, id: Uuid) -> Result<Option<StoredEntry>>;

    /// Store a new entry
    async fn insert_entry(&self, owner_id: &str, encrypted_data: Ciphertext) -> Result<StoredEntry>;

    /// Replace the ciphertext of an existing entry
    async fn update_entry(&self, id: Uuid, encrypted_data: Ciphertext) -> Result<()>;

    /// Remove an entry
    async fn delete_entry(&self, id: Uuid) -> Result<()>;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
