//! Password-based encryption (PBE): key and IV derived from password + salt

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::encoding::{base64_encode, encode_chars};
use super::encryption::{decrypt_blocks, encrypt_blocks, CipherMode, KeySize, PaddingMode, BLOCK_LEN};
use super::key_derivation::{derive_bytes, Kdf};
use super::protect::{DataProtect, SaltSource};
use crate::error::{ProtectError, Result};
use crate::settings::ProtectSettings;

/// Shortest salt accepted for key derivation
pub const MIN_SALT_LENGTH: usize = 8;

/// Default PBKDF2 iteration count
pub const DEFAULT_ITERATION_COUNT: u32 = 4096;

/// Tunables for [`PasswordProtect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordOptions {
    /// KDF iterations (PBKDF2 only)
    pub iteration_count: u32,
    /// AES key size
    pub key_size: KeySize,
    /// Block mode
    pub cipher_mode: CipherMode,
    /// Padding scheme
    pub padding_mode: PaddingMode,
    /// Key derivation function
    pub kdf: Kdf,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            iteration_count: DEFAULT_ITERATION_COUNT,
            key_size: KeySize::Aes256,
            cipher_mode: CipherMode::Cbc,
            padding_mode: PaddingMode::Pkcs7,
            kdf: Kdf::Pbkdf2Sha1,
        }
    }
}

impl PasswordOptions {
    /// Options configured in settings
    pub fn from_settings(settings: &ProtectSettings) -> Self {
        Self {
            iteration_count: settings.iteration_count,
            key_size: settings.key_size,
            cipher_mode: settings.cipher_mode,
            padding_mode: settings.padding_mode,
            kdf: settings.kdf,
        }
    }

    pub fn with_iteration_count(mut self, iteration_count: u32) -> Self {
        self.iteration_count = iteration_count;
        self
    }

    pub fn with_key_size(mut self, key_size: KeySize) -> Self {
        self.key_size = key_size;
        self
    }

    pub fn with_cipher_mode(mut self, cipher_mode: CipherMode) -> Self {
        self.cipher_mode = cipher_mode;
        self
    }

    pub fn with_padding_mode(mut self, padding_mode: PaddingMode) -> Self {
        self.padding_mode = padding_mode;
        self
    }

    pub fn with_kdf(mut self, kdf: Kdf) -> Self {
        self.kdf = kdf;
        self
    }
}

#[derive(Zeroize, ZeroizeOnDrop)]
struct KeyMaterial {
    key: Vec<u8>,
    iv: [u8; BLOCK_LEN],
    salt: Vec<u8>,
}

/// AES protector keyed from a password.
///
/// The derived key material never changes after construction. [`DataProtect::dispose`]
/// zeroes key, IV and salt.
pub struct PasswordProtect {
    material: RwLock<Option<KeyMaterial>>,
    options: PasswordOptions,
}

impl PasswordProtect {
    /// Derive a protector from password bytes
    pub fn new(password: &[u8], salt: SaltSource<'_>, options: PasswordOptions) -> Result<Self> {
        if options.iteration_count == 0 {
            return Err(ProtectError::Range(
                "iteration_count must be at least 1".to_string(),
            ));
        }

        let salt = salt.resolve()?;
        if salt.len() < MIN_SALT_LENGTH {
            return Err(ProtectError::Range(format!(
                "salt must be at least {} bytes, got {}",
                MIN_SALT_LENGTH,
                salt.len()
            )));
        }

        let key_len = options.key_size.bytes();
        let derived = derive_bytes(
            password,
            &salt,
            options.iteration_count,
            key_len + BLOCK_LEN,
            &options.kdf,
        )?;

        let key = derived[..key_len].to_vec();
        let mut iv = [0u8; BLOCK_LEN];
        iv.copy_from_slice(&derived[key_len..]);

        debug!(
            "Derived {}-bit password key ({:?}, {:?}/{:?})",
            options.key_size.bits(),
            options.kdf,
            options.cipher_mode,
            options.padding_mode
        );

        Ok(Self {
            material: RwLock::new(Some(KeyMaterial { key, iv, salt })),
            options,
        })
    }

    /// Derive a protector from a password held as chars
    pub fn from_chars(password: &[char], salt: SaltSource<'_>, options: PasswordOptions) -> Result<Self> {
        let password = encode_chars(password);
        Self::new(&password, salt, options)
    }

    /// Copy of the salt; persist it to decrypt later
    pub fn salt(&self) -> Result<Vec<u8>> {
        self.with_material(|m| Ok(m.salt.clone()))
    }

    /// Salt as base64
    pub fn salt_base64(&self) -> Result<String> {
        self.with_material(|m| Ok(base64_encode(&m.salt)))
    }

    /// Options this protector was derived with
    pub fn options(&self) -> &PasswordOptions {
        &self.options
    }

    fn with_material<T>(&self, f: impl FnOnce(&KeyMaterial) -> Result<T>) -> Result<T> {
        let material = self.material.read();
        let material = material
            .as_ref()
            .ok_or(ProtectError::UseAfterRelease("PasswordProtect"))?;
        f(material)
    }
}

impl DataProtect for PasswordProtect {
    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.with_material(|m| {
            encrypt_blocks(
                &m.key,
                &m.iv,
                self.options.cipher_mode,
                self.options.padding_mode,
                data,
            )
        })
    }

    fn decrypt(&self, encrypted_data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        self.with_material(|m| {
            decrypt_blocks(
                &m.key,
                &m.iv,
                self.options.cipher_mode,
                self.options.padding_mode,
                encrypted_data,
            )
        })
    }

    fn dispose(&self) {
        if let Some(mut material) = self.material.write().take() {
            material.zeroize();
            debug!("Disposed password protector");
        }
    }

    fn is_disposed(&self) -> bool {
        self.material.read().is_none()
    }
}

impl std::fmt::Debug for PasswordProtect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordProtect")
            .field("options", &self.options)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
