//! JSON file storage backend
//!
//! Stores account records and encrypted entries in a single JSON file in the
//! user's data directory. Entries are already ciphertext; nothing here ever
//! handles plaintext.

use async_trait::async_trait;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::types::StoreData;
use super::{Account, EntryStore, StoredEntry};
use crate::crypto::Ciphertext;
use crate::error::{Result, VaultError};

const FILE_VERSION: u32 = 1;

/// File storage backend
pub struct FileStore {
    /// Directory for storage files
    storage_dir: PathBuf,
    /// In-memory copy of the file
    data: RwLock<StoreData>,
}

/// File format for persistent storage
#[derive(Debug, Serialize, Deserialize)]
struct StorageFile<T> {
    version: u32,
    data: T,
}

impl FileStore {
    /// Create a file store in the default data directory
    pub fn new() -> Result<Self> {
        Self::with_dir(Self::default_dir()?)
    }

    /// Create with a custom storage directory
    pub fn with_dir(storage_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&storage_dir)?;
        debug!("File storage initialized at: {:?}", storage_dir);

        Ok(Self {
            storage_dir,
            data: RwLock::new(StoreData::default()),
        })
    }

    /// Get the default storage directory
    pub fn default_dir() -> Result<PathBuf> {
        ProjectDirs::from("org", "sealed-vault", "sealed-vault")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                VaultError::StorageError("Could not determine data directory".to_string())
            })
    }

    /// Get the storage directory path
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn storage_file_path(&self) -> PathBuf {
        self.storage_dir.join("vault.json")
    }

    /// Load storage from disk
    pub async fn load(&self) -> Result<()> {
        let path = self.storage_file_path();

        if !path.exists() {
            debug!("No existing storage file found");
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&path).await?;
        let file: StorageFile<StoreData> = serde_json::from_str(&contents)?;

        if file.version != FILE_VERSION {
            return Err(VaultError::StorageError(format!(
                "Unsupported storage file version: {}",
                file.version
            )));
        }

        let mut data = self.data.write().await;
        *data = file.data;

        debug!("Loaded {} entries from storage", data.entries.len());
        Ok(())
    }

    /// Write the current state to disk, atomically via a temp file
    async fn save(&self, data: &StoreData) -> Result<()> {
        let contents = serde_json::to_string_pretty(&StorageFile {
            version: FILE_VERSION,
            data,
        })?;
        let path = self.storage_file_path();

        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        debug!("Saved {} entries to storage", data.entries.len());
        Ok(())
    }

    /// Apply `change` to a copy of the data and adopt it only once it is on
    /// disk. A failed write leaves memory exactly as it was.
    async fn commit<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut StoreData) -> Result<T>,
    {
        let mut data = self.data.write().await;
        let mut next = data.clone();
        let out = change(&mut next)?;

        self.save(&next).await?;
        *data = next;
        Ok(out)
    }
}

#[async_trait]
impl EntryStore for FileStore {
    async fn load_account(&self, owner_id: &str) -> Result<Option<Account>> {
        Ok(self.data.read().await.accounts.get(owner_id).cloned())
    }

    async fn save_account(&self, owner_id: &str, account: &Account) -> Result<()> {
        let account = account.clone();
        self.commit(|data| {
            data.accounts.insert(owner_id.to_string(), account);
            Ok(())
        })
        .await?;

        debug!("Saved account record: {}", owner_id);
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

        let stored = entry.clone();
        self.commit(|data| {
            data.entries.insert(stored.id, stored);
            Ok(())
        })
        .await?;

        debug!("Inserted entry: {}", entry.id);
        Ok(entry)
    }

    async fn update_entry(&self, id: Uuid, encrypted_data: Ciphertext) -> Result<()> {
        self.commit(|data| data.replace(id, encrypted_data)).await?;

        debug!("Updated entry: {}", id);
        Ok(())
    }

    async fn delete_entry(&self, id: Uuid) -> Result<()> {
        if !self.data.read().await.entries.contains_key(&id) {
            return Ok(());
        }

        self.commit(|data| {
            data.entries.remove(&id);
            Ok(())
        })
        .await?;

        debug!("Deleted entry: {}", id);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "File Storage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KdfParams;
    use tempfile::TempDir;

    fn ct(s: &str) -> Ciphertext {
        Ciphertext::from(s.to_string())
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::with_dir(temp_dir.path().to_path_buf()).unwrap();

        store.insert_entry("alice", ct("aa:bb:cc")).await.unwrap();
        store.insert_entry("bob", ct("dd:ee:ff")).await.unwrap();

        let entries = store.list_entries("alice").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].encrypted_data, ct("aa:bb:cc"));
    }

    #[tokio::test]
    async fn test_persistence() {
        let temp_dir = TempDir::new().unwrap();

        let id = {
            let store = FileStore::with_dir(temp_dir.path().to_path_buf()).unwrap();
            store
                .save_account("alice", &Account::new("a1b2", KdfParams { iterations: 200_000 }))
                .await
                .unwrap();
            store.insert_entry("alice", ct("aa:bb:cc")).await.unwrap().id
        };

        {
            let store = FileStore::with_dir(temp_dir.path().to_path_buf()).unwrap();
            store.load().await.unwrap();

            let account = store.load_account("alice").await.unwrap().unwrap();
            assert_eq!(account.salt, "a1b2");
            assert_eq!(account.kdf_iterations, 200_000);
            let entry = store.get_entry(id).await.unwrap().unwrap();
            assert_eq!(entry.owner_id, "alice");
        }
    }

    #[tokio::test]
    async fn test_update_and_delete_persist() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::with_dir(temp_dir.path().to_path_buf()).unwrap();

        let id = store.insert_entry("alice", ct("old")).await.unwrap().id;
        store.update_entry(id, ct("new")).await.unwrap();

        let reopened = FileStore::with_dir(temp_dir.path().to_path_buf()).unwrap();
        reopened.load().await.unwrap();
        assert_eq!(
            reopened.get_entry(id).await.unwrap().unwrap().encrypted_data,
            ct("new")
        );

        store.delete_entry(id).await.unwrap();
        let reopened = FileStore::with_dir(temp_dir.path().to_path_buf()).unwrap();
        reopened.load().await.unwrap();
        assert!(reopened.get_entry(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::with_dir(temp_dir.path().to_path_buf()).unwrap();

        store.load().await.unwrap();
        assert!(store.list_entries("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("vault.json"), "{ not json").unwrap();

        let store = FileStore::with_dir(temp_dir.path().to_path_buf()).unwrap();
        let err = store.load().await.unwrap_err();

        assert!(err.is_persistence());
        assert!(!matches!(err, VaultError::DecryptionFailed));
    }

    /// Makes the temp-file write fail by occupying its path with a directory
    fn block_writes(dir: &Path) {
        std::fs::create_dir(dir.join("vault.tmp")).unwrap();
    }

    #[tokio::test]
    async fn test_failed_write_leaves_memory_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::with_dir(temp_dir.path().to_path_buf()).unwrap();
        let kept = store.insert_entry("alice", ct("kept")).await.unwrap();

        block_writes(temp_dir.path());

        let err = store.insert_entry("alice", ct("lost")).await.unwrap_err();
        assert!(err.is_persistence());
        let entries = store.list_entries("alice").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, kept.id);

        assert!(store.update_entry(kept.id, ct("changed")).await.is_err());
        assert_eq!(
            store.get_entry(kept.id).await.unwrap().unwrap().encrypted_data,
            ct("kept")
        );

        assert!(store.delete_entry(kept.id).await.is_err());
        assert!(store.get_entry(kept.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_account_write_is_not_remembered() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::with_dir(temp_dir.path().to_path_buf()).unwrap();

        block_writes(temp_dir.path());

        let account = Account::new("a1b2", KdfParams::default());
        assert!(store.save_account("alice", &account).await.is_err());
        assert_eq!(store.load_account("alice").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_older_account_without_iterations_uses_default() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("vault.json"),
            r#"{"version":1,"data":{"accounts":{"alice":{"salt":"a1b2"}},"entries":{}}}"#,
        )
        .unwrap();

        let store = FileStore::with_dir(temp_dir.path().to_path_buf()).unwrap();
        store.load().await.unwrap();

        let account = store.load_account("alice").await.unwrap().unwrap();
        assert_eq!(account.kdf_params(), KdfParams::default());
    }
}
