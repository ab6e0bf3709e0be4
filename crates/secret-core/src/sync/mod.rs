//! Lock primitives: a blocking read/write lock with upgradeable reads, and
//! an awaitable mutex with cancellation

mod async_mutex;
mod rw_lock;

pub use async_mutex::{AsyncMutex, AsyncMutexGuard};
pub use rw_lock::{
    LockState, ReadGuard, ReadWriteLock, RecursionPolicy, UpgradeableReadGuard, WriteGuard,
};
