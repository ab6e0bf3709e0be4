//! Scope keys stored as files
//!
//! One base64 key file per scope. A per-user source lives in the user's data
//! directory and its files are readable by the owner only (on unix). A
//! machine-wide source lives in a system directory and its files are
//! world-readable, so every user on the machine can unprotect local-machine
//! data. Files are written atomically.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::debug;
use zeroize::Zeroizing;

use super::{ProtectionScope, ScopeKeySource};
use crate::crypto::{base64_decode, base64_encode, ScopeKey};
use crate::error::{ProtectError, Result};

const APP_DIR: &str = "secret-protect";

/// File-backed scope key source
pub struct FileKeySource {
    key_dir: PathBuf,
    machine_wide: bool,
}

impl FileKeySource {
    /// Create a per-user source in the default data directory
    pub fn new() -> Result<Self> {
        Self::with_dir(Self::default_dir()?)
    }

    /// Create a per-user source with a custom key directory
    pub fn with_dir(key_dir: impl Into<PathBuf>) -> Result<Self> {
        let key_dir = key_dir.into();
        fs::create_dir_all(&key_dir)?;

        debug!("File key source initialized at: {:?}", key_dir);
        Ok(Self {
            key_dir,
            machine_wide: false,
        })
    }

    /// Create a machine-wide source in the system data directory
    pub fn machine() -> Self {
        Self::machine_with_dir(Self::default_machine_dir())
    }

    /// Create a machine-wide source with a custom key directory.
    ///
    /// The directory is created on the first store, which usually needs
    /// administrator rights for the system location. Loading works for
    /// every user once the key exists.
    pub fn machine_with_dir(key_dir: impl Into<PathBuf>) -> Self {
        let key_dir = key_dir.into();
        debug!("Machine-wide file key source at: {:?}", key_dir);
        Self {
            key_dir,
            machine_wide: true,
        }
    }

    /// Default per-user key directory under the platform data dir
    pub fn default_dir() -> Result<PathBuf> {
        ProjectDirs::from("com", "thrzn41", APP_DIR)
            .map(|dirs| dirs.data_dir().join("scope-keys"))
            .ok_or_else(|| ProtectError::NotFound("Could not determine data directory".to_string()))
    }

    /// Default machine-wide key directory
    pub fn default_machine_dir() -> PathBuf {
        Self::system_data_dir().join(APP_DIR).join("scope-keys")
    }

    #[cfg(windows)]
    fn system_data_dir() -> PathBuf {
        std::env::var_os("ProgramData")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData"))
    }

    #[cfg(target_os = "macos")]
    fn system_data_dir() -> PathBuf {
        PathBuf::from("/Library/Application Support")
    }

    #[cfg(not(any(windows, target_os = "macos")))]
    fn system_data_dir() -> PathBuf {
        PathBuf::from("/var/lib")
    }

    /// Get the key directory path
    pub fn key_dir(&self) -> &Path {
        &self.key_dir
    }

    /// Whether keys are shared with every user on the machine
    pub fn is_machine_wide(&self) -> bool {
        self.machine_wide
    }

    fn key_path(&self, scope: ProtectionScope) -> PathBuf {
        self.key_dir.join(format!("{}.key", scope.as_str()))
    }
}

impl ScopeKeySource for FileKeySource {
    fn load(&self, scope: ProtectionScope) -> Result<Option<ScopeKey>> {
        let path = self.key_path(scope);
        if !path.exists() {
            return Ok(None);
        }

        let encoded = Zeroizing::new(fs::read_to_string(&path)?);
        let raw = Zeroizing::new(base64_decode(encoded.trim())?);
        let key = ScopeKey::from_slice(&raw).ok_or_else(|| {
            ProtectError::Format(format!("Scope key file {:?} has the wrong length", path))
        })?;

        Ok(Some(key))
    }

    fn store(&self, scope: ProtectionScope, key: &ScopeKey) -> Result<()> {
        let path = self.key_path(scope);
        let temp_path = path.with_extension("tmp");
        let encoded = Zeroizing::new(base64_encode(key.as_bytes()));
        fs::create_dir_all(&self.key_dir)?;

        {
            let mut options = fs::OpenOptions::new();
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(if self.machine_wide { 0o644 } else { 0o600 });
            }
            let mut file = options.open(&temp_path)?;
            // The creation mode is narrowed by the umask
            #[cfg(unix)]
            if self.machine_wide {
                use std::os::unix::fs::PermissionsExt;
                file.set_permissions(fs::Permissions::from_mode(0o644))?;
            }
            file.write_all(encoded.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &path)?;

        debug!("Saved {} scope key to {:?}", scope, path);
        Ok(())
    }

    fn delete(&self, scope: ProtectionScope) -> Result<()> {
        let path = self.key_path(scope);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Deleted {} scope key", scope);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn is_hardware_backed(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        if self.machine_wide {
            "Machine Key Files"
        } else {
            "Key Files"
        }
    }
}
