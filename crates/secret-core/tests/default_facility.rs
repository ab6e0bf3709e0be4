//! The process-wide facility, installed once per test binary

use std::sync::Arc;

use secret_core::facility::{MemoryKeySource, ScopeKeyProtection};
use secret_core::{
    default_facility, install_default_facility, LocalProtectedByteArray, LocalProtectedString,
    ProtectedValue, ProtectionScope, SaltSource,
};

#[test]
fn local_constructors_use_installed_facility() {
    let facility = Arc::new(ScopeKeyProtection::new(MemoryKeySource::new()));
    assert!(install_default_facility(facility).is_ok());
    assert_eq!(default_facility().unwrap().backend_name(), "In-Memory Keys");

    // Only one install wins
    let again = Arc::new(ScopeKeyProtection::new(MemoryKeySource::new()));
    assert!(install_default_facility(again).is_err());

    let value =
        LocalProtectedString::from_text("per user", SaltSource::default(), ProtectionScope::CurrentUser).unwrap();
    assert_eq!(value.scope(), ProtectionScope::CurrentUser);
    assert_eq!(value.entropy().unwrap().len(), 128);

    let restored = LocalProtectedString::from_encrypted_data_base64(
        &value.encrypted_data_base64().unwrap(),
        SaltSource::Base64(&value.entropy_base64().unwrap()),
        ProtectionScope::CurrentUser,
    )
    .unwrap();
    assert_eq!(restored.decrypt_to_string().unwrap(), "per user");

    let bytes =
        LocalProtectedByteArray::from_data(b"machine", SaltSource::Random(16), ProtectionScope::LocalMachine).unwrap();
    let copy = LocalProtectedByteArray::from_encrypted_data(
        bytes.encrypted_data().unwrap().to_vec(),
        SaltSource::Bytes(&bytes.entropy().unwrap()),
        ProtectionScope::LocalMachine,
    )
    .unwrap();
    assert_eq!(copy.decrypt().unwrap().as_slice(), b"machine");

    let chars: Vec<char> = "chars".chars().collect();
    let from_chars =
        LocalProtectedString::from_chars(&chars, SaltSource::Random(8), ProtectionScope::CurrentUser).unwrap();
    assert_eq!(from_chars.decrypt_to_secret_string().unwrap().expose(), "chars");
}
