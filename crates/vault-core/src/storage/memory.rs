//! In-memory storage backend

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::types::StoreData;
use super::{Account, EntryStore, StoredEntry};
use crate::crypto::Ciphertext;
use crate::error::Result;

/// Storage backend that keeps everything in process memory
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn load_account(&self, owner_id: &str) -> Result<Option<Account>> {
        Ok(self.data.read().await.accounts.get(owner_id).cloned())
    }

    async fn save_account(&self, owner_id: &str, account: &Account) -> Result<()> {
        self.data
            .write()
            .await
            .accounts
            .insert(owner_id.to_string(), account.clone());
        Ok(())
    }

    async fn list_entries(&self, owner_id: &str) -> Result<Vec<StoredEntry>> {
        Ok(self.data.read().await.entries_for(owner_id))
    }

    async fn get_entry(&self, id: Uuid) -> Result<Option<StoredEntry>> {
        Ok(self.data.read().await.entries.get(&id).cloned())
    }

    async fn insert_entry(&self, owner_id: &str, encrypted_data: Ciphertext) -> Result<StoredEntry> {
        let entry = StoredEntry::new(owner_id, encrypted_data);
        self.data.write().await.entries.insert(entry.id, entry.clone());
        debug!("Inserted entry: {}", entry.id);
        Ok(entry)
    }

    async fn update_entry(&self, id: Uuid, encrypted_data: Ciphertext) -> Result<()> {
        self.data.write().await.replace(id, encrypted_data)
    }

    async fn delete_entry(&self, id: Uuid) -> Result<()> {
        self.data.write().await.entries.remove(&id);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "In-Memory Storage"
    }
}
