//! Sealed Vault CLI - terminal front-end for the end-to-end encrypted vault
//!
//! Every command unlocks the vault with the master password first. The
//! password comes from `VAULT_MASTER_PASSWORD` or an interactive prompt and is
//! never written anywhere; only the salt and ciphertext reach the disk.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use vault_core::crypto::PasswordOptions;
use vault_core::{
    generate_strong_password, CredentialRecord, EntryStore, FileStore, SettingsManager,
    UnlockOutcome, Vault, VaultEntry, VaultError,
};

/// Sealed Vault - zero-knowledge password manager
#[derive(Parser, Debug)]
#[command(name = "vault")]
#[command(version)]
#[command(about = "Sealed Vault - end-to-end encrypted password manager")]
struct Args {
    /// Directory holding vault.json and settings.json
    #[arg(long, env = "VAULT_DIR", global = true)]
    dir: Option<PathBuf>,

    /// Account whose entries to use
    #[arg(long, env = "VAULT_ACCOUNT", default_value = "default", global = true)]
    account: String,

    /// Master password (prompted for when absent)
    #[arg(long, env = "VAULT_MASTER_PASSWORD", hide_env_values = true, global = true)]
    master_password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List entries, optionally filtered by website or username
    List {
        /// Case-insensitive search term
        #[arg(long, short)]
        search: Option<String>,

        /// Show passwords in clear
        #[arg(long)]
        show: bool,
    },
    /// Add an entry
    Add(EntryArgs),
    /// Replace an entry (keeps its password unless --password is given)
    Edit {
        /// Entry id
        id: Uuid,

        #[command(flatten)]
        entry: EntryArgs,
    },
    /// Delete an entry
    Delete {
        /// Entry id
        id: Uuid,
    },
    /// Generate a password without touching the vault
    Generate(GenerateArgs),
}

#[derive(ClapArgs, Debug)]
struct EntryArgs {
    /// Website
    #[arg(long)]
    website: String,

    /// Username or email
    #[arg(long, default_value = "")]
    username: String,

    /// Password; generated from the configured defaults when absent
    #[arg(long)]
    password: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct GenerateArgs {
    /// Password length (configured default when absent)
    #[arg(long, short)]
    length: Option<usize>,

    /// Exclude uppercase letters
    #[arg(long)]
    no_uppercase: bool,

    /// Exclude lowercase letters
    #[arg(long)]
    no_lowercase: bool,

    /// Exclude digits
    #[arg(long)]
    no_numbers: bool,

    /// Exclude symbols
    #[arg(long)]
    no_symbols: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let dir = match args.dir {
        Some(dir) => dir,
        None => FileStore::default_dir()?,
    };
    let settings = SettingsManager::new(&dir)
        .map_err(|e| format!("Invalid settings file: {}", e))?
        .get()
        .clone();

    if let Command::Generate(generate) = &args.command {
        let options = PasswordOptions {
            include_uppercase: !generate.no_uppercase,
            include_lowercase: !generate.no_lowercase,
            include_numbers: !generate.no_numbers,
            include_symbols: !generate.no_symbols,
        };
        let length = generate.length.unwrap_or(settings.generator.length);
        println!("{}", generate_strong_password(length, options));
        return Ok(());
    }

    let store = FileStore::with_dir(dir)?;
    store.load().await.map_err(|e| e.user_message())?;
    debug!("Using {} at {:?}", store.backend_name(), store.storage_dir());
    let vault = Vault::new(&args.account, Arc::new(store), settings)?;

    let master_password = match args.master_password {
        Some(password) => password,
        None => rpassword::prompt_password(password_prompt(&vault).await?)?,
    };

    match vault.unlock_or_create(&master_password).await {
        Ok(UnlockOutcome::Created) => info!("Master password set for account {}", args.account),
        Ok(UnlockOutcome::Unlocked) => {}
        Err(e) => return Err(e.user_message().into()),
    }

    let result = run(&vault, args.command).await;
    vault.sign_out().await;

    result.map_err(|e| e.user_message().into())
}

/// Prompt text depending on whether the account already exists
///
/// Store failures come back as user-facing text, like every other error.
async fn password_prompt(vault: &Vault) -> Result<&'static str, String> {
    let existing = vault
        .has_master_password()
        .await
        .map_err(|e| e.user_message())?;

    Ok(if existing {
        "Master password: "
    } else {
        "Create a master password: "
    })
}

async fn run(vault: &Vault, command: Command) -> Result<(), VaultError> {
    match command {
        Command::List { search, show } => {
            let entries = match search {
                Some(term) => vault.search(&term).await?,
                None => vault.entries().await?,
            };

            if entries.is_empty() {
                println!("No passwords found.");
            }
            for entry in &entries {
                print_entry(entry, show);
            }
        }
        Command::Add(entry) => {
            let record = to_record(vault, entry);
            let id = vault.add(&record).await?;
            println!("Saved {}", id);
        }
        Command::Edit { id, mut entry } => {
            // Keep the current password unless a new one is given
            if entry.password.is_none() {
                let current = vault.credentials.get(id).await?;
                entry.password = Some(current.record.password.clone());
            }
            let record = to_record(vault, entry);
            vault.update(id, &record).await?;
            println!("Updated {}", id);
        }
        Command::Delete { id } => {
            vault.delete(id).await?;
            println!("Deleted {}", id);
        }
        Command::Generate(_) => {}
    }
    Ok(())
}

fn to_record(vault: &Vault, entry: EntryArgs) -> CredentialRecord {
    let password = entry
        .password
        .unwrap_or_else(|| vault.generate_password());
    CredentialRecord::new(&entry.website, &entry.username, &password)
}

fn print_entry(entry: &VaultEntry, show: bool) {
    let password = if show {
        entry.record.password.as_str()
    } else {
        "••••••••••••"
    };
    println!(
        "{}  {}  {}  {}",
        entry.id, entry.record.website, entry.record.username, password
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vault_core::{Account, Ciphertext, MemoryStore, Settings, StoredEntry};

    /// Store whose every call fails the way an unreachable disk would
    struct BrokenStore;

    fn unreachable_disk<T>() -> vault_core::Result<T> {
        Err(VaultError::StorageError("/var/lib/vault/vault.json: permission denied".to_string()))
    }

    #[async_trait]
    impl EntryStore for BrokenStore {
        async fn load_account(&self, _owner_id: &str) -> vault_core::Result<Option<Account>> {
            unreachable_disk()
        }

        async fn save_account(&self, _owner_id: &str, _account: &Account) -> vault_core::Result<()> {
            unreachable_disk()
        }

        async fn list_entries(&self, _owner_id: &str) -> vault_core::Result<Vec<StoredEntry>> {
            unreachable_disk()
        }

        async fn get_entry(&self, _id: Uuid) -> vault_core::Result<Option<StoredEntry>> {
            unreachable_disk()
        }

        async fn insert_entry(
            &self,
            _owner_id: &str,
            _encrypted_data: Ciphertext,
        ) -> vault_core::Result<StoredEntry> {
            unreachable_disk()
        }

        async fn update_entry(&self, _id: Uuid, _encrypted_data: Ciphertext) -> vault_core::Result<()> {
            unreachable_disk()
        }

        async fn delete_entry(&self, _id: Uuid) -> vault_core::Result<()> {
            unreachable_disk()
        }

        fn backend_name(&self) -> &'static str {
            "Broken"
        }
    }

    #[tokio::test]
    async fn test_prompt_for_new_and_existing_account() {
        let store = Arc::new(MemoryStore::new());
        let vault = Vault::new("alice", store, Settings::default()).unwrap();
        assert_eq!(password_prompt(&vault).await.unwrap(), "Create a master password: ");

        vault.unlock_or_create("master").await.unwrap();
        assert_eq!(password_prompt(&vault).await.unwrap(), "Master password: ");
    }

    #[tokio::test]
    async fn test_prompt_store_failure_is_user_facing() {
        let vault = Vault::new("alice", Arc::new(BrokenStore), Settings::default()).unwrap();

        let message = password_prompt(&vault).await.unwrap_err();
        assert_eq!(
            message,
            VaultError::StorageError(String::new()).user_message()
        );
        assert!(!message.contains("permission denied"));
        assert!(!message.contains("/var/lib"));
    }
}
