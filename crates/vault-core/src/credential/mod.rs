//! Credential records and their encrypted CRUD

mod manager;
mod types;

pub use manager::CredentialManager;
pub use types::*;
