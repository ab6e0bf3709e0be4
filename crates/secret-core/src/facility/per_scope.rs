//! Separate stores for the two protection scopes

use super::{ProtectionScope, ScopeKeySource};
use crate::crypto::ScopeKey;
use crate::error::Result;

/// Routes current-user keys to a per-user source and local-machine keys to a
/// machine-wide one
pub struct PerScopeKeySource<U: ScopeKeySource, M: ScopeKeySource> {
    current_user: U,
    local_machine: M,
}

impl<U: ScopeKeySource, M: ScopeKeySource> PerScopeKeySource<U, M> {
    pub fn new(current_user: U, local_machine: M) -> Self {
        Self {
            current_user,
            local_machine,
        }
    }

    pub fn current_user(&self) -> &U {
        &self.current_user
    }

    pub fn local_machine(&self) -> &M {
        &self.local_machine
    }

    fn source(&self, scope: ProtectionScope) -> &dyn ScopeKeySource {
        match scope {
            ProtectionScope::CurrentUser => &self.current_user,
            ProtectionScope::LocalMachine => &self.local_machine,
        }
    }

    /// Name of the store holding keys for `scope`
    pub fn backend_name_for(&self, scope: ProtectionScope) -> &'static str {
        self.source(scope).backend_name()
    }
}

impl<U: ScopeKeySource, M: ScopeKeySource> ScopeKeySource for PerScopeKeySource<U, M> {
    fn load(&self, scope: ProtectionScope) -> Result<Option<ScopeKey>> {
        self.source(scope).load(scope)
    }

    fn store(&self, scope: ProtectionScope, key: &ScopeKey) -> Result<()> {
        self.source(scope).store(scope, key)
    }

    fn delete(&self, scope: ProtectionScope) -> Result<()> {
        self.source(scope).delete(scope)
    }

    fn is_hardware_backed(&self) -> bool {
        self.current_user.is_hardware_backed() && self.local_machine.is_hardware_backed()
    }

    /// Named after the current-user store
    fn backend_name(&self) -> &'static str {
        self.current_user.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facility::MemoryKeySource;

    #[test]
    fn test_scopes_use_separate_sources() {
        let source = PerScopeKeySource::new(MemoryKeySource::new(), MemoryKeySource::new());
        let user_key = ScopeKey::generate();
        let machine_key = ScopeKey::generate();

        source.store(ProtectionScope::CurrentUser, &user_key).unwrap();
        source.store(ProtectionScope::LocalMachine, &machine_key).unwrap();

        assert!(source.current_user().load(ProtectionScope::LocalMachine).unwrap().is_none());
        assert!(source.local_machine().load(ProtectionScope::CurrentUser).unwrap().is_none());
        assert_eq!(
            source.load(ProtectionScope::LocalMachine).unwrap().unwrap().as_bytes(),
            machine_key.as_bytes()
        );

        source.delete(ProtectionScope::CurrentUser).unwrap();
        assert!(source.load(ProtectionScope::CurrentUser).unwrap().is_none());
        assert!(source.load(ProtectionScope::LocalMachine).unwrap().is_some());
    }
}
