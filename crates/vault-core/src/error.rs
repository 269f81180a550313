//! Error types for vault-core

use thiserror::Error;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Vault error types
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Wrong key or corrupted ciphertext. Carries no detail on purpose; the
    /// cause is logged at debug level instead.
    #[error("Decryption failed: wrong key or corrupted data")]
    DecryptionFailed,

    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationError(String),

    #[error("Vault is locked - enter the master password first")]
    VaultLocked,

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl VaultError {
    /// True for failures of the persistence collaborator. These are transient
    /// from the user's point of view and unrelated to the key.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::StorageError(_) | Self::IoError(_) | Self::SerializationError(_)
        )
    }

    /// Message safe to show to an end user
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(reason) => reason.clone(),
            Self::DecryptionFailed => {
                "Could not decrypt your data. The master password may be incorrect.".to_string()
            }
            Self::VaultLocked => "Vault is locked. Enter your master password.".to_string(),
            Self::EntryNotFound(_) => "That entry no longer exists.".to_string(),
            Self::EncryptionError(_) | Self::KeyDerivationError(_) => {
                "An internal encryption error occurred.".to_string()
            }
            Self::StorageError(_) | Self::IoError(_) | Self::SerializationError(_) => {
                "Could not reach your saved data. Please try again.".to_string()
            }
        }
    }
}
