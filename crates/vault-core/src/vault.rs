//! Main vault orchestration

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::credential::{CredentialManager, CredentialRecord, VaultEntry};
use crate::crypto::{generate_salt, generate_strong_password, KdfParams};
use crate::error::{Result, VaultError};
use crate::session::{SessionKeyHolder, SessionState};
use crate::settings::Settings;
use crate::storage::{Account, EntryStore};

/// What [`Vault::unlock_or_create`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// First unlock: an account record was generated and persisted
    Created,
    /// Existing account record was used
    Unlocked,
}

/// One account's vault: session key, encrypted entries and settings
pub struct Vault {
    /// Owning account
    owner_id: String,
    /// Storage backend
    store: Arc<dyn EntryStore>,
    /// Session key holder
    session: SessionKeyHolder,
    /// Credential manager
    pub credentials: CredentialManager,
    /// Derivation parameters for accounts created by this vault
    new_account_params: KdfParams,
    /// Settings
    settings: Settings,
}

impl Vault {
    /// Create a locked vault for `owner_id`
    pub fn new(owner_id: &str, store: Arc<dyn EntryStore>, settings: Settings) -> Result<Self> {
        let new_account_params = settings.kdf_params()?;
        let session = SessionKeyHolder::new();
        let credentials = CredentialManager::new(owner_id, store.clone(), session.clone());

        Ok(Self {
            owner_id: owner_id.to_string(),
            store,
            session,
            credentials,
            new_account_params,
            settings,
        })
    }

    /// Owning account
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Get the current session state
    pub async fn state(&self) -> SessionState {
        self.session.state().await
    }

    /// Check if the vault is unlocked
    pub async fn is_unlocked(&self) -> bool {
        self.session.is_key_set().await
    }

    /// Whether the account record exists, i.e. a master password was set before
    pub async fn has_master_password(&self) -> Result<bool> {
        Ok(self.store.load_account(&self.owner_id).await?.is_some())
    }

    /// Unlock with the master password, creating the account record on first use
    ///
    /// An existing account always derives with the salt and iteration count
    /// stored when it was created; the settings only apply to new accounts.
    /// The password is not checked here. A wrong one is only noticed when
    /// existing entries fail to decrypt, which locks the vault again.
    pub async fn unlock_or_create(&self, master_password: &str) -> Result<UnlockOutcome> {
        if master_password.is_empty() {
            return Err(VaultError::InvalidInput(
                "Please enter your master password".to_string(),
            ));
        }

        let (account, outcome) = match self.store.load_account(&self.owner_id).await? {
            Some(account) => (account, UnlockOutcome::Unlocked),
            None => {
                let account = Account::new(&generate_salt(), self.new_account_params);
                self.store.save_account(&self.owner_id, &account).await?;
                info!("Created account record: {}", self.owner_id);
                (account, UnlockOutcome::Created)
            }
        };

        self.session
            .set_master_password_with(master_password, &account.salt, account.kdf_params())
            .await?;
        Ok(outcome)
    }

    /// Lock the vault (drop the session key)
    pub async fn lock(&self) {
        self.session.clear().await;
    }

    /// Sign out: the session key goes with the account session
    pub async fn sign_out(&self) {
        self.lock().await;
        info!("Signed out: {}", self.owner_id);
    }

    /// All decrypted entries
    pub async fn entries(&self) -> Result<Vec<VaultEntry>> {
        self.credentials.list().await
    }

    /// Decrypted entries matching `term` on website or username
    pub async fn search(&self, term: &str) -> Result<Vec<VaultEntry>> {
        self.credentials.search(term).await
    }

    /// Add a record
    pub async fn add(&self, record: &CredentialRecord) -> Result<Uuid> {
        self.credentials.add(record).await
    }

    /// Replace a record
    pub async fn update(&self, id: Uuid, record: &CredentialRecord) -> Result<()> {
        self.credentials.update(id, record).await
    }

    /// Delete a record
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.credentials.delete(id).await
    }

    /// Generate a password with the configured defaults
    pub fn generate_password(&self) -> String {
        let generator = self.settings.generator;
        generate_strong_password(generator.length, generator.options)
    }

    /// Get current settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Session key holder shared with the credential manager
    pub fn session(&self) -> &SessionKeyHolder {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn test_vault(store: Arc<MemoryStore>) -> Vault {
        Vault::new("alice", store, Settings::default()).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_unlock() {
        let store = Arc::new(MemoryStore::new());
        let vault = test_vault(store.clone());

        assert!(!vault.has_master_password().await.unwrap());
        assert_eq!(
            vault.unlock_or_create("master").await.unwrap(),
            UnlockOutcome::Created
        );
        assert!(vault.is_unlocked().await);
        let account = store.load_account("alice").await.unwrap().unwrap();
        assert_eq!(account.kdf_iterations, 100_000);

        vault.lock().await;
        assert_eq!(vault.state().await, SessionState::Locked);

        assert_eq!(
            vault.unlock_or_create("master").await.unwrap(),
            UnlockOutcome::Unlocked
        );
        assert_eq!(store.load_account("alice").await.unwrap().unwrap(), account);
    }

    #[tokio::test]
    async fn test_empty_master_password() {
        let vault = test_vault(Arc::new(MemoryStore::new()));

        let result = vault.unlock_or_create("").await;
        assert!(matches!(result, Err(VaultError::InvalidInput(_))));
        assert!(!vault.has_master_password().await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_password_locks_on_listing() {
        let store = Arc::new(MemoryStore::new());
        let vault = test_vault(store.clone());

        vault.unlock_or_create("correct").await.unwrap();
        vault
            .add(&CredentialRecord::new("example.com", "bob", "hunter2"))
            .await
            .unwrap();
        vault.sign_out().await;

        // Unlock "succeeds" with the wrong password
        vault.unlock_or_create("incorrect").await.unwrap();
        assert!(vault.is_unlocked().await);

        let err = vault.entries().await.unwrap_err();
        assert!(matches!(err, VaultError::DecryptionFailed));
        assert!(err.user_message().contains("master password"));
        assert!(!vault.is_unlocked().await);

        vault.unlock_or_create("correct").await.unwrap();
        assert_eq!(vault.entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_weak_settings_rejected() {
        let settings = Settings {
            kdf_iterations: 1,
            ..Settings::default()
        };
        let result = Vault::new("alice", Arc::new(MemoryStore::new()), settings);
        assert!(matches!(result, Err(VaultError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_generate_password_uses_settings() {
        let vault = test_vault(Arc::new(MemoryStore::new()));
        assert_eq!(vault.generate_password().len(), 16);
    }

    #[tokio::test]
    async fn test_changed_settings_do_not_affect_existing_account() {
        let store = Arc::new(MemoryStore::new());

        let vault = test_vault(store.clone());
        vault.unlock_or_create("correct").await.unwrap();
        vault
            .add(&CredentialRecord::new("example.com", "bob", "hunter2"))
            .await
            .unwrap();
        vault.sign_out().await;

        let stronger = Settings {
            kdf_iterations: 200_000,
            ..Settings::default()
        };
        let reopened = Vault::new("alice", store.clone(), stronger).unwrap();
        assert_eq!(
            reopened.unlock_or_create("correct").await.unwrap(),
            UnlockOutcome::Unlocked
        );

        let entries = reopened.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].record.password, "hunter2");
        assert_eq!(
            store.load_account("alice").await.unwrap().unwrap().kdf_iterations,
            100_000
        );
    }

    #[tokio::test]
    async fn test_new_account_records_configured_iterations() {
        let store = Arc::new(MemoryStore::new());
        let settings = Settings {
            kdf_iterations: 200_000,
            ..Settings::default()
        };
        let vault = Vault::new("bob", store.clone(), settings).unwrap();

        vault.unlock_or_create("master").await.unwrap();

        let account = store.load_account("bob").await.unwrap().unwrap();
        assert_eq!(account.kdf_iterations, 200_000);
    }
}
