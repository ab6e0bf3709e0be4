//! Process-lifetime scope keys, for tests and ephemeral use

use std::collections::HashMap;

use parking_lot::Mutex;

use super::{ProtectionScope, ScopeKeySource};
use crate::crypto::ScopeKey;
use crate::error::Result;

/// Keeps scope keys in memory only; everything protected with them is lost at exit
#[derive(Default)]
pub struct MemoryKeySource {
    keys: Mutex<HashMap<ProtectionScope, ScopeKey>>,
}

impl MemoryKeySource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScopeKeySource for MemoryKeySource {
    fn load(&self, scope: ProtectionScope) -> Result<Option<ScopeKey>> {
        Ok(self.keys.lock().get(&scope).cloned())
    }

    fn store(&self, scope: ProtectionScope, key: &ScopeKey) -> Result<()> {
        self.keys.lock().insert(scope, key.clone());
        Ok(())
    }

    fn delete(&self, scope: ProtectionScope) -> Result<()> {
        self.keys.lock().remove(&scope);
        Ok(())
    }

    fn is_hardware_backed(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "In-Memory Keys"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_load_delete() {
        let source = MemoryKeySource::new();
        assert!(source.load(ProtectionScope::CurrentUser).unwrap().is_none());

        let key = ScopeKey::generate();
        source.store(ProtectionScope::CurrentUser, &key).unwrap();

        let loaded = source.load(ProtectionScope::CurrentUser).unwrap().unwrap();
        assert_eq!(loaded.as_bytes(), key.as_bytes());
        assert!(source.load(ProtectionScope::LocalMachine).unwrap().is_none());

        source.delete(ProtectionScope::CurrentUser).unwrap();
        assert!(source.load(ProtectionScope::CurrentUser).unwrap().is_none());
    }
}
