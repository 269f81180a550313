//! Application settings management
//!
//! Stores non-sensitive configuration in a plain JSON file next to the vault
//! data. Settings are readable while the vault is locked.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::crypto::{KdfParams, PasswordOptions, DEFAULT_ITERATIONS, DEFAULT_LENGTH};
use crate::error::{Result, VaultError};

/// Password generator defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorSettings {
    /// Generated password length
    pub length: usize,
    /// Character categories
    #[serde(flatten)]
    pub options: PasswordOptions,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            options: PasswordOptions::default(),
        }
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Settings file version
    pub version: u32,
    /// PBKDF2 iteration count for newly created accounts. Existing accounts
    /// keep the count recorded when they were created.
    pub kdf_iterations: u32,
    /// Password generator defaults
    pub generator: GeneratorSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            kdf_iterations: DEFAULT_ITERATIONS,
            generator: GeneratorSettings::default(),
        }
    }
}

impl Settings {
    /// Key derivation parameters, validated
    pub fn kdf_params(&self) -> Result<KdfParams> {
        let params = KdfParams {
            iterations: self.kdf_iterations,
        };
        params.validate()?;
        Ok(params)
    }
}

/// Settings manager
pub struct SettingsManager {
    settings_file: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Create a settings manager for the given directory
    ///
    /// A missing file means defaults. A file that cannot be read or parsed
    /// is an error, so a typo never silently resets the configuration.
    pub fn new(storage_dir: &Path) -> Result<Self> {
        let settings_file = storage_dir.join("settings.json");
        let settings = Self::load_from_file(&settings_file)?;

        Ok(Self {
            settings_file,
            settings,
        })
    }

    fn load_from_file(path: &Path) -> Result<Settings> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub async fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.settings)?;

        // Write atomically using temp file
        let temp_path = self.settings_file.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &self.settings_file).await?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Update settings and save
    pub async fn update(&mut self, settings: Settings) -> Result<()> {
        settings.kdf_params()?;
        self.settings = settings;
        self.save().await
    }

    /// Update generator defaults and save
    pub async fn set_generator(&mut self, generator: GeneratorSettings) -> Result<()> {
        self.settings.generator = generator;
        self.save().await
    }

    /// Reset settings to defaults and delete the settings file
    pub async fn reset(&mut self) -> Result<()> {
        self.settings = Settings::default();

        if self.settings_file.exists() {
            tokio::fs::remove_file(&self.settings_file)
                .await
                .map_err(|e| VaultError::StorageError(e.to_string()))?;
        }

        Ok(())
    }
}
