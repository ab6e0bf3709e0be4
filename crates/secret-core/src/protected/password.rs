//! Values protected by password-based encryption

use super::{ProtectedByteArray, ProtectedString};
use crate::crypto::{PasswordOptions, PasswordProtect, SaltSource};
use crate::error::Result;

pub type PasswordProtectedByteArray = ProtectedByteArray<PasswordProtect>;
pub type PasswordProtectedString = ProtectedString<PasswordProtect>;

impl ProtectedByteArray<PasswordProtect> {
    /// Encrypt with a new owned protector derived from `password`
    pub fn from_data(
        data: &[u8],
        password: &[u8],
        salt: SaltSource<'_>,
        options: PasswordOptions,
    ) -> Result<Self> {
        Self::with_data(data, PasswordProtect::new(password, salt, options)?)
    }

    pub fn from_encrypted_data(
        encrypted_data: Vec<u8>,
        password: &[u8],
        salt: SaltSource<'_>,
        options: PasswordOptions,
    ) -> Result<Self> {
        Ok(Self::with_encrypted_data(
            encrypted_data,
            PasswordProtect::new(password, salt, options)?,
        ))
    }

    pub fn from_encrypted_data_base64(
        encrypted_data: &str,
        password: &[u8],
        salt: SaltSource<'_>,
        options: PasswordOptions,
    ) -> Result<Self> {
        Self::with_encrypted_data_base64(encrypted_data, PasswordProtect::new(password, salt, options)?)
    }

    pub fn salt(&self) -> Result<Vec<u8>> {
        self.protector().salt()
    }

    pub fn salt_base64(&self) -> Result<String> {
        self.protector().salt_base64()
    }
}

impl ProtectedString<PasswordProtect> {
    /// Encrypt with a new owned protector derived from `password`
    pub fn from_text(
        text: &str,
        password: &[u8],
        salt: SaltSource<'_>,
        options: PasswordOptions,
    ) -> Result<Self> {
        Self::with_str(text, PasswordProtect::new(password, salt, options)?)
    }

    pub fn from_chars(
        chars: &[char],
        password: &[u8],
        salt: SaltSource<'_>,
        options: PasswordOptions,
    ) -> Result<Self> {
        Self::with_chars(chars, PasswordProtect::new(password, salt, options)?)
    }

    pub fn from_encrypted_data(
        encrypted_data: Vec<u8>,
        password: &[u8],
        salt: SaltSource<'_>,
        options: PasswordOptions,
    ) -> Result<Self> {
        Ok(Self::with_encrypted_data(
            encrypted_data,
            PasswordProtect::new(password, salt, options)?,
        ))
    }

    pub fn from_encrypted_data_base64(
        encrypted_data: &str,
        password: &[u8],
        salt: SaltSource<'_>,
        options: PasswordOptions,
    ) -> Result<Self> {
        Self::with_encrypted_data_base64(encrypted_data, PasswordProtect::new(password, salt, options)?)
    }

    pub fn salt(&self) -> Result<Vec<u8>> {
        self.protector().salt()
    }

    pub fn salt_base64(&self) -> Result<String> {
        self.protector().salt_base64()
    }
}
