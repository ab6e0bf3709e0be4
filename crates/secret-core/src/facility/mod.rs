//! Local protection facility backing [`ScopedProtect`](crate::ScopedProtect)
//!
//! Current-user scope keys can live in:
//! 1. OS Keychain (hardware-backed where available)
//! 2. Key files in the user's data directory (fallback)
//! 3. Memory (tests, throwaway processes)
//!
//! Local-machine keys live in key files in a system directory, outside any
//! single user's keychain or profile.

mod file;
mod keychain;
mod memory;
mod per_scope;
mod protection;
mod traits;

pub use file::FileKeySource;
pub use keychain::KeychainKeySource;
pub use memory::MemoryKeySource;
pub use per_scope::PerScopeKeySource;
pub use protection::{default_facility, facility_for, install_default_facility, ScopeKeyProtection};
pub use traits::{LocalProtection, ProtectionScope, ScopeKeySource};
