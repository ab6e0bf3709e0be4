//! Values protected under the local user or machine scope

use super::{ProtectedByteArray, ProtectedString};
use crate::crypto::{SaltSource, ScopedProtect};
use crate::error::Result;
use crate::facility::ProtectionScope;

pub type LocalProtectedByteArray = ProtectedByteArray<ScopedProtect>;
pub type LocalProtectedString = ProtectedString<ScopedProtect>;

impl ProtectedByteArray<ScopedProtect> {
    /// Encrypt with a new owned protector on the default facility
    pub fn from_data(data: &[u8], entropy: SaltSource<'_>, scope: ProtectionScope) -> Result<Self> {
        Self::with_data(data, ScopedProtect::new(entropy, scope)?)
    }

    pub fn from_encrypted_data(
        encrypted_data: Vec<u8>,
        entropy: SaltSource<'_>,
        scope: ProtectionScope,
    ) -> Result<Self> {
        Ok(Self::with_encrypted_data(encrypted_data, ScopedProtect::new(entropy, scope)?))
    }

    pub fn from_encrypted_data_base64(
        encrypted_data: &str,
        entropy: SaltSource<'_>,
        scope: ProtectionScope,
    ) -> Result<Self> {
        Self::with_encrypted_data_base64(encrypted_data, ScopedProtect::new(entropy, scope)?)
    }

    pub fn entropy(&self) -> Result<Vec<u8>> {
        self.protector().entropy()
    }

    pub fn entropy_base64(&self) -> Result<String> {
        self.protector().entropy_base64()
    }

    pub fn scope(&self) -> ProtectionScope {
        self.protector().scope()
    }
}

impl ProtectedString<ScopedProtect> {
    /// Encrypt with a new owned protector on the default facility
    pub fn from_text(text: &str, entropy: SaltSource<'_>, scope: ProtectionScope) -> Result<Self> {
        Self::with_str(text, ScopedProtect::new(entropy, scope)?)
    }

    pub fn from_chars(chars: &[char], entropy: SaltSource<'_>, scope: ProtectionScope) -> Result<Self> {
        Self::with_chars(chars, ScopedProtect::new(entropy, scope)?)
    }

    pub fn from_encrypted_data(
        encrypted_data: Vec<u8>,
        entropy: SaltSource<'_>,
        scope: ProtectionScope,
    ) -> Result<Self> {
        Ok(Self::with_encrypted_data(encrypted_data, ScopedProtect::new(entropy, scope)?))
    }

    pub fn from_encrypted_data_base64(
        encrypted_data: &str,
        entropy: SaltSource<'_>,
        scope: ProtectionScope,
    ) -> Result<Self> {
        Self::with_encrypted_data_base64(encrypted_data, ScopedProtect::new(entropy, scope)?)
    }

    pub fn entropy(&self) -> Result<Vec<u8>> {
        self.protector().entropy()
    }

    pub fn entropy_base64(&self) -> Result<String> {
        self.protector().entropy_base64()
    }

    pub fn scope(&self) -> ProtectionScope {
        self.protector().scope()
    }
}
