//! JSON envelope carrying protected data plus what is needed to open it

use serde::{Deserialize, Serialize};

use secret_core::{
    LocalProtectedString, PasswordOptions, PasswordProtectedString, ProtectionScope, ProtectedValue,
    Result, SaltSource,
};

/// Everything except the password or the scope key travels in the envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Envelope {
    #[serde(rename_all = "camelCase")]
    Password {
        salt: String,
        options: PasswordOptions,
        data: String,
    },
    #[serde(rename_all = "camelCase")]
    Local {
        entropy: String,
        scope: ProtectionScope,
        data: String,
    },
}

impl Envelope {
    pub fn seal_with_password(
        text: &str,
        password: &[u8],
        salt: SaltSource<'_>,
        options: PasswordOptions,
    ) -> Result<Self> {
        let protected = PasswordProtectedString::from_text(text, password, salt, options)?;
        Self::from_password_protected(&protected)
    }

    pub fn seal_local(text: &str, entropy: SaltSource<'_>, scope: ProtectionScope) -> Result<Self> {
        let protected = LocalProtectedString::from_text(text, entropy, scope)?;
        Ok(Self::Local {
            entropy: protected.entropy_base64()?,
            scope,
            data: protected.encrypted_data_base64()?,
        })
    }

    pub fn from_password_protected(protected: &PasswordProtectedString) -> Result<Self> {
        Ok(Self::Password {
            salt: protected.salt_base64()?,
            options: *protected.protector().options(),
            data: protected.encrypted_data_base64()?,
        })
    }

    /// Rebuild a password-protected value; `None` for a local envelope
    pub fn open_with_password(&self, password: &[u8]) -> Result<Option<PasswordProtectedString>> {
        match self {
            Self::Password { salt, options, data } => Ok(Some(PasswordProtectedString::from_encrypted_data_base64(
                data,
                password,
                SaltSource::Base64(salt),
                *options,
            )?)),
            Self::Local { .. } => Ok(None),
        }
    }

    /// Rebuild a locally protected value; `None` for a password envelope
    pub fn open_local(&self) -> Result<Option<LocalProtectedString>> {
        match self {
            Self::Local { entropy, scope, data } => Ok(Some(LocalProtectedString::from_encrypted_data_base64(
                data,
                SaltSource::Base64(entropy),
                *scope,
            )?)),
            Self::Password { .. } => Ok(None),
        }
    }

    pub fn needs_password(&self) -> bool {
        matches!(self, Self::Password { .. })
    }
}
