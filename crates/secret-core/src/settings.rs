//! Protection settings management
//!
//! Stores non-sensitive defaults (lengths, KDF tuning, local backend) in a
//! plain JSON file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::crypto::{CipherMode, Kdf, KeySize, PaddingMode, SaltSource, DEFAULT_ITERATION_COUNT};
use crate::error::Result;

/// Where the local protection facility keeps its scope keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocalBackend {
    /// OS keychain, key files when unavailable
    #[default]
    Keychain,
    /// Key files only
    File,
    /// Process memory only
    Memory,
}

/// Protection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProtectSettings {
    /// Settings file version
    pub version: u32,
    /// Generated entropy length for scoped protection
    pub entropy_length: usize,
    /// Generated salt length for password protection
    pub salt_length: usize,
    /// PBKDF2 iteration count
    pub iteration_count: u32,
    /// AES key size in bits
    pub key_size: KeySize,
    pub cipher_mode: CipherMode,
    pub padding_mode: PaddingMode,
    pub kdf: Kdf,
    /// Scope key backend
    pub local_backend: LocalBackend,
    /// Current-user key file directory (platform data dir when unset)
    pub key_directory: Option<PathBuf>,
    /// Machine-wide key file directory for the local-machine scope
    /// (system data dir when unset)
    pub machine_key_directory: Option<PathBuf>,
}

impl Default for ProtectSettings {
    fn default() -> Self {
        Self {
            version: 1,
            entropy_length: SaltSource::DEFAULT_LENGTH,
            salt_length: SaltSource::DEFAULT_LENGTH,
            iteration_count: DEFAULT_ITERATION_COUNT,
            key_size: KeySize::Aes256,
            cipher_mode: CipherMode::Cbc,
            padding_mode: PaddingMode::Pkcs7,
            kdf: Kdf::Pbkdf2Sha1,
            local_backend: LocalBackend::Keychain,
            key_directory: None,
            machine_key_directory: None,
        }
    }
}

impl ProtectSettings {
    /// Entropy source for a new scoped protector
    pub fn entropy_source(&self) -> SaltSource<'static> {
        SaltSource::Random(self.entropy_length)
    }

    /// Salt source for a new password protector
    pub fn salt_source(&self) -> SaltSource<'static> {
        SaltSource::Random(self.salt_length)
    }
}

/// Settings manager
pub struct SettingsManager {
    settings_file: PathBuf,
    settings: ProtectSettings,
}

impl SettingsManager {
    /// Load settings from `settings.json` in `storage_dir`, or use defaults
    pub fn new(storage_dir: &Path) -> Result<Self> {
        let settings_file = storage_dir.join("settings.json");
        let settings = Self::load_from_file(&settings_file)?;

        Ok(Self {
            settings_file,
            settings,
        })
    }

    /// Load settings from file
    fn load_from_file(path: &Path) -> Result<ProtectSettings> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(ProtectSettings::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: ProtectSettings = serde_json::from_str(&contents)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub async fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.settings)?;

        if let Some(parent) = self.settings_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write atomically using temp file
        let temp_path = self.settings_file.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &self.settings_file).await?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &ProtectSettings {
        &self.settings
    }

    /// Get mutable settings
    pub fn get_mut(&mut self) -> &mut ProtectSettings {
        &mut self.settings
    }

    /// Update settings and save
    pub async fn update(&mut self, settings: ProtectSettings) -> Result<()> {
        self.settings = settings;
        self.save().await
    }

    /// Reset settings to defaults and delete settings file
    pub async fn reset(&mut self) -> Result<()> {
        self.settings = ProtectSettings::default();

        if self.settings_file.exists() {
            tokio::fs::remove_file(&self.settings_file).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Argon2Params;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_settings_default() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path()).unwrap();

        let settings = manager.get();
        assert_eq!(settings.entropy_length, 128);
        assert_eq!(settings.salt_length, 128);
        assert_eq!(settings.iteration_count, 4096);
        assert_eq!(settings.key_size, KeySize::Aes256);
        assert_eq!(settings.local_backend, LocalBackend::Keychain);
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let mut manager = SettingsManager::new(temp_dir.path()).unwrap();
            manager.get_mut().iteration_count = 10_000;
            manager.get_mut().key_size = KeySize::Aes128;
            manager.get_mut().kdf = Kdf::Argon2id(Argon2Params::default());
            manager.get_mut().local_backend = LocalBackend::File;
            manager.save().await.unwrap();
        }

        {
            let manager = SettingsManager::new(temp_dir.path()).unwrap();
            assert_eq!(manager.get().iteration_count, 10_000);
            assert_eq!(manager.get().key_size, KeySize::Aes128);
            assert_eq!(manager.get().kdf, Kdf::Argon2id(Argon2Params::default()));
            assert_eq!(manager.get().local_backend, LocalBackend::File);
        }
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("settings.json"),
            r#"{ "saltLength": 32, "keySize": 192 }"#,
        )
        .unwrap();

        let manager = SettingsManager::new(temp_dir.path()).unwrap();
        assert_eq!(manager.get().salt_length, 32);
        assert_eq!(manager.get().key_size, KeySize::Aes192);
        assert_eq!(manager.get().iteration_count, 4096);
    }

    #[tokio::test]
    async fn test_invalid_key_size_rejected() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("settings.json"), r#"{ "keySize": 512 }"#).unwrap();

        assert!(SettingsManager::new(temp_dir.path()).is_err());
    }

    #[tokio::test]
    async fn test_update_and_reset() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path()).unwrap();

        let settings = ProtectSettings {
            entropy_length: 64,
            ..ProtectSettings::default()
        };
        manager.update(settings).await.unwrap();
        assert!(temp_dir.path().join("settings.json").exists());

        manager.reset().await.unwrap();
        assert_eq!(manager.get(), &ProtectSettings::default());
        assert!(!temp_dir.path().join("settings.json").exists());
    }
}
