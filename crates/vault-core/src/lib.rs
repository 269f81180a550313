//! # vault-core
//!
//! Client-side core of Sealed Vault, a zero-knowledge password manager:
//! - PBKDF2-HMAC-SHA256 key derivation from the master password and a per-account salt
//! - AES-256-GCM envelope encryption of credential records
//! - A session key holder that locks itself when decryption fails
//! - Storage backends that only ever see salts and ciphertext
//! - A random password generator

pub mod credential;
pub mod crypto;
pub mod error;
pub mod session;
pub mod settings;
pub mod storage;
mod vault;

pub use credential::{CredentialManager, CredentialRecord, VaultEntry};
pub use crypto::{
    decrypt, derive_key, encrypt, generate_salt, generate_strong_password, Ciphertext,
    DerivedKey, KdfParams, PasswordOptions,
};
pub use error::{Result, VaultError};
pub use session::{SessionKeyHolder, SessionState};
pub use settings::{GeneratorSettings, Settings, SettingsManager};
pub use storage::{Account, EntryStore, FileStore, MemoryStore, StoredEntry};
pub use vault::{UnlockOutcome, Vault};
