//! Session key holder
//!
//! Owns the one derived key of an unlocked session. Only
//! [`SessionKeyHolder::set_master_password`] writes it and only
//! [`SessionKeyHolder::clear`] erases it; any number of readers may encrypt or
//! decrypt with it concurrently.
//!
//! Unlocking never verifies the password. A wrong password derives a key like
//! any other, and the mistake surfaces the first time existing data fails to
//! decrypt, at which point the key is dropped.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::credential::{CredentialRecord, VaultEntry};
use crate::crypto::{self, derive_key, Ciphertext, DerivedKey, KdfParams};
use crate::error::{Result, VaultError};
use crate::storage::StoredEntry;

/// Lifecycle of the session key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No key held
    Locked,
    /// Key derivation in flight
    Unlocking,
    /// Key cached and ready
    Unlocked,
}

enum KeySlot {
    Locked,
    Unlocking,
    Unlocked(DerivedKey),
}

impl KeySlot {
    fn state(&self) -> SessionState {
        match self {
            Self::Locked => SessionState::Locked,
            Self::Unlocking => SessionState::Unlocking,
            Self::Unlocked(_) => SessionState::Unlocked,
        }
    }
}

/// Cloneable handle to the session's key cell
#[derive(Clone)]
pub struct SessionKeyHolder {
    slot: Arc<RwLock<KeySlot>>,
    params: KdfParams,
}

impl SessionKeyHolder {
    /// Create a locked holder using default derivation parameters
    pub fn new() -> Self {
        Self::with_params(KdfParams::default())
    }

    /// Create a locked holder with explicit derivation parameters
    pub fn with_params(params: KdfParams) -> Self {
        Self {
            slot: Arc::new(RwLock::new(KeySlot::Locked)),
            params,
        }
    }

    /// Current state
    pub async fn state(&self) -> SessionState {
        self.slot.read().await.state()
    }

    /// Whether a key is cached
    pub async fn is_key_set(&self) -> bool {
        self.state().await == SessionState::Unlocked
    }

    /// Derive the key for `(password, salt)` and cache it
    ///
    /// Uses the holder's own derivation parameters. See
    /// [`set_master_password_with`](Self::set_master_password_with).
    pub async fn set_master_password(&self, password: &str, salt: &str) -> Result<()> {
        self.set_master_password_with(password, salt, self.params).await
    }

    /// Derive the key for `(password, salt)` under `params` and cache it
    ///
    /// Derivation runs on the blocking pool. If [`clear`](Self::clear) is
    /// called while it runs, the freshly derived key is thrown away and
    /// [`VaultError::VaultLocked`] is returned.
    pub async fn set_master_password_with(
        &self,
        password: &str,
        salt: &str,
        params: KdfParams,
    ) -> Result<()> {
        *self.slot.write().await = KeySlot::Unlocking;
        debug!("Deriving session key ({} iterations)", params.iterations);

        let password = Zeroizing::new(password.to_string());
        let salt = salt.to_string();

        let derived = tokio::task::spawn_blocking(move || derive_key(&password, &salt, Some(params)))
            .await
            .map_err(|e| VaultError::KeyDerivationError(e.to_string()))
            .and_then(|result| result);

        let mut slot = self.slot.write().await;
        match derived {
            Ok(key) if matches!(*slot, KeySlot::Unlocking) => {
                *slot = KeySlot::Unlocked(key);
                info!("Session unlocked");
                Ok(())
            }
            Ok(_) => {
                debug!("Session was cleared during derivation, discarding key");
                Err(VaultError::VaultLocked)
            }
            Err(e) => {
                *slot = KeySlot::Locked;
                Err(e)
            }
        }
    }

    /// Discard the cached key. Clearing a locked session is a no-op.
    pub async fn clear(&self) {
        let mut slot = self.slot.write().await;
        if matches!(*slot, KeySlot::Locked) {
            return;
        }
        *slot = KeySlot::Locked;
        info!("Session locked");
    }

    /// Encrypt a record with the session key
    pub async fn encrypt(&self, record: &CredentialRecord) -> Result<Ciphertext> {
        let slot = self.slot.read().await;
        let key = current_key(&slot)?;
        crypto::encrypt(record, key)
    }

    /// Decrypt a record with the session key
    ///
    /// A decryption failure locks the session before the error is returned.
    pub async fn decrypt(&self, ciphertext: &Ciphertext) -> Result<CredentialRecord> {
        let result = {
            let slot = self.slot.read().await;
            let key = current_key(&slot)?;
            crypto::decrypt(ciphertext, key)
        };

        if matches!(result, Err(VaultError::DecryptionFailed)) {
            warn!("Decryption failed, locking session");
            self.clear().await;
        }
        result
    }

    /// Decrypt a batch of stored entries, all or nothing
    ///
    /// Stops at the first entry that fails, locks the session and returns
    /// [`VaultError::DecryptionFailed`]; no partial list is ever returned.
    pub async fn decrypt_all(&self, entries: &[StoredEntry]) -> Result<Vec<VaultEntry>> {
        let result = {
            let slot = self.slot.read().await;
            let key = current_key(&slot)?;

            entries
                .iter()
                .map(|entry| {
                    crypto::decrypt(&entry.encrypted_data, key).map(|record| VaultEntry {
                        id: entry.id,
                        record,
                        updated_at: entry.updated_at,
                    })
                })
                .collect::<Result<Vec<_>>>()
        };

        if matches!(result, Err(VaultError::DecryptionFailed)) {
            warn!("An entry failed to decrypt, locking session");
            self.clear().await;
        }
        result
    }
}

impl Default for SessionKeyHolder {
    fn default() -> Self {
        Self::new()
    }
}

fn current_key(slot: &KeySlot) -> Result<&DerivedKey> {
    match slot {
        KeySlot::Unlocked(key) => Ok(key),
        KeySlot::Locked | KeySlot::Unlocking => Err(VaultError::VaultLocked),
    }
}
