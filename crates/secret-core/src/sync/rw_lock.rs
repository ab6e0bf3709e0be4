//! Blocking read/write lock with upgradeable reads
//!
//! Guards carry only the lock reference and the owning thread, so they live on
//! the stack and need no pooling. Writers are preferred: once a writer or an
//! upgrade is waiting, new (non-recursive) readers queue behind it.

use std::collections::HashMap;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::debug;

use crate::error::{ProtectError, Result};

/// Whether a thread may re-acquire a lock it already holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecursionPolicy {
    /// Re-entry fails with [`ProtectError::LockRecursion`]
    #[default]
    NoRecursion,
    /// Re-entry nests. Escalating a plain read to write or upgradeable
    /// still fails.
    SupportsRecursion,
}

/// Snapshot of the lock mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    /// Number of read holds, counting nested ones
    ReadHeld(usize),
    WriteHeld,
    /// An upgradeable holder plus `readers` plain read holds
    UpgradeableReadHeld { readers: usize },
}

#[derive(Debug, Default)]
struct LockInner {
    readers: HashMap<ThreadId, usize>,
    reader_count: usize,
    writer: Option<ThreadId>,
    writer_depth: usize,
    upgradeable: Option<ThreadId>,
    upgradeable_depth: usize,
    waiting_writers: usize,
    waiting_upgrade: bool,
}

impl LockInner {
    fn read_depth(&self, id: ThreadId) -> usize {
        self.readers.get(&id).copied().unwrap_or(0)
    }

    fn holds_any(&self, id: ThreadId) -> bool {
        self.read_depth(id) > 0 || self.writer == Some(id) || self.upgradeable == Some(id)
    }
}

/// Read/write lock with read, write and upgradeable-read modes.
///
/// Many readers may hold the lock together, and alongside them at most one
/// upgradeable reader. A writer excludes everyone. The upgradeable holder
/// can become the writer without letting another writer in between.
#[derive(Debug)]
pub struct ReadWriteLock {
    inner: Mutex<LockInner>,
    changed: Condvar,
    policy: RecursionPolicy,
}

impl Default for ReadWriteLock {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadWriteLock {
    /// Lock that rejects recursion
    pub fn new() -> Self {
        Self::with_policy(RecursionPolicy::NoRecursion)
    }

    pub fn with_policy(policy: RecursionPolicy) -> Self {
        Self {
            inner: Mutex::new(LockInner::default()),
            changed: Condvar::new(),
            policy,
        }
    }

    pub fn policy(&self) -> RecursionPolicy {
        self.policy
    }

    /// Block until read mode is available
    pub fn enter_read(&self) -> Result<ReadGuard<'_>> {
        let owner = thread::current().id();
        let mut inner = self.inner.lock();

        let recursive = inner.holds_any(owner);
        if recursive {
            let nested_read = inner.read_depth(owner) > 0 || inner.writer == Some(owner);
            if nested_read && self.policy == RecursionPolicy::NoRecursion {
                return Err(self.recursion("read"));
            }
        } else {
            while inner.writer.is_some() || inner.waiting_writers > 0 || inner.waiting_upgrade {
                self.changed.wait(&mut inner);
            }
        }

        *inner.readers.entry(owner).or_insert(0) += 1;
        inner.reader_count += 1;

        Ok(ReadGuard { lock: self, owner })
    }

    /// Block until write mode is available.
    ///
    /// Called by the upgradeable holder this upgrades, waiting for the plain
    /// readers to drain.
    pub fn enter_write(&self) -> Result<WriteGuard<'_>> {
        self.enter_write_as(thread::current().id())
    }

    fn enter_write_as(&self, owner: ThreadId) -> Result<WriteGuard<'_>> {
        let mut inner = self.inner.lock();

        if inner.read_depth(owner) > 0 {
            return Err(self.recursion("write while holding read"));
        }

        if inner.writer == Some(owner) {
            if self.policy == RecursionPolicy::NoRecursion {
                return Err(self.recursion("write"));
            }
            inner.writer_depth += 1;
            return Ok(WriteGuard { lock: self, owner });
        }

        if inner.upgradeable == Some(owner) {
            inner.waiting_upgrade = true;
            while inner.reader_count > 0 {
                self.changed.wait(&mut inner);
            }
            inner.waiting_upgrade = false;
        } else {
            inner.waiting_writers += 1;
            while inner.writer.is_some() || inner.upgradeable.is_some() || inner.reader_count > 0 {
                self.changed.wait(&mut inner);
            }
            inner.waiting_writers -= 1;
        }

        inner.writer = Some(owner);
        inner.writer_depth = 1;

        Ok(WriteGuard { lock: self, owner })
    }

    /// Block until upgradeable-read mode is available
    pub fn enter_upgradeable_read(&self) -> Result<UpgradeableReadGuard<'_>> {
        let owner = thread::current().id();
        let mut inner = self.inner.lock();

        if inner.read_depth(owner) > 0 {
            return Err(self.recursion("upgradeable read while holding read"));
        }

        if inner.upgradeable == Some(owner) || inner.writer == Some(owner) {
            if self.policy == RecursionPolicy::NoRecursion {
                return Err(self.recursion("upgradeable read"));
            }
        } else {
            while inner.writer.is_some() || inner.upgradeable.is_some() || inner.waiting_writers > 0 {
                self.changed.wait(&mut inner);
            }
        }

        inner.upgradeable = Some(owner);
        inner.upgradeable_depth += 1;

        Ok(UpgradeableReadGuard { lock: self, owner })
    }

    /// Run `f` in read mode. The lock is released even if `f` panics.
    pub fn execute_in_reader_lock<R>(&self, f: impl FnOnce() -> R) -> Result<R> {
        let _guard = self.enter_read()?;
        Ok(f())
    }

    /// Run `f` in write mode. The lock is released even if `f` panics.
    pub fn execute_in_writer_lock<R>(&self, f: impl FnOnce() -> R) -> Result<R> {
        let _guard = self.enter_write()?;
        Ok(f())
    }

    /// Run `f` in upgradeable-read mode; `f` may upgrade through the guard
    pub fn execute_in_upgradeable_reader_lock<R>(
        &self,
        f: impl FnOnce(&mut UpgradeableReadGuard<'_>) -> R,
    ) -> Result<R> {
        let mut guard = self.enter_upgradeable_read()?;
        Ok(f(&mut guard))
    }

    /// Current mode
    pub fn state(&self) -> LockState {
        let inner = self.inner.lock();
        if inner.writer.is_some() {
            LockState::WriteHeld
        } else if inner.upgradeable.is_some() {
            LockState::UpgradeableReadHeld {
                readers: inner.reader_count,
            }
        } else if inner.reader_count > 0 {
            LockState::ReadHeld(inner.reader_count)
        } else {
            LockState::Unlocked
        }
    }

    pub fn is_read_lock_held(&self) -> bool {
        self.inner.lock().read_depth(thread::current().id()) > 0
    }

    pub fn is_write_lock_held(&self) -> bool {
        self.inner.lock().writer == Some(thread::current().id())
    }

    pub fn is_upgradeable_read_lock_held(&self) -> bool {
        self.inner.lock().upgradeable == Some(thread::current().id())
    }

    /// Threads blocked in [`ReadWriteLock::enter_write`]
    pub fn waiting_write_count(&self) -> usize {
        self.inner.lock().waiting_writers
    }

    fn recursion(&self, mode: &str) -> ProtectError {
        debug!("Rejected recursive {} acquisition ({:?})", mode, self.policy);
        ProtectError::LockRecursion(format!("{} ({:?})", mode, self.policy))
    }

    fn release(&self, f: impl FnOnce(&mut MutexGuard<'_, LockInner>)) {
        let mut inner = self.inner.lock();
        f(&mut inner);
        drop(inner);
        self.changed.notify_all();
    }

    fn exit_read(&self, owner: ThreadId) {
        self.release(|inner| {
            if let Some(depth) = inner.readers.get_mut(&owner) {
                *depth -= 1;
                if *depth == 0 {
                    inner.readers.remove(&owner);
                }
                inner.reader_count -= 1;
            }
        });
    }

    fn exit_write(&self, owner: ThreadId) {
        self.release(|inner| {
            if inner.writer == Some(owner) {
                inner.writer_depth -= 1;
                if inner.writer_depth == 0 {
                    inner.writer = None;
                }
            }
        });
    }

    fn exit_upgradeable_read(&self, owner: ThreadId) {
        self.release(|inner| {
            if inner.upgradeable == Some(owner) {
                inner.upgradeable_depth -= 1;
                if inner.upgradeable_depth == 0 {
                    inner.upgradeable = None;
                }
            }
        });
    }
}

/// Read hold; released on drop
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct ReadGuard<'a> {
    lock: &'a ReadWriteLock,
    owner: ThreadId,
}

impl ReadGuard<'_> {
    /// Release now
    pub fn release(self) {}
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.lock.exit_read(self.owner);
    }
}

/// Write hold; released on drop
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct WriteGuard<'a> {
    lock: &'a ReadWriteLock,
    owner: ThreadId,
}

impl WriteGuard<'_> {
    pub fn release(self) {}
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.exit_write(self.owner);
    }
}

/// Upgradeable-read hold; released on drop
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct UpgradeableReadGuard<'a> {
    lock: &'a ReadWriteLock,
    owner: ThreadId,
}

impl UpgradeableReadGuard<'_> {
    /// Wait for plain readers to drain, then hold write mode. Dropping the
    /// returned guard goes back to upgradeable read, not to unlocked.
    ///
    /// The upgrade acts for the thread that entered upgradeable read, so it
    /// also works after the guard was moved to another thread.
    pub fn upgrade_to_write(&mut self) -> Result<WriteGuard<'_>> {
        self.lock.enter_write_as(self.owner)
    }

    pub fn release(self) {}
}

impl Drop for UpgradeableReadGuard<'_> {
    fn drop(&mut self) {
        self.lock.exit_upgradeable_read(self.owner);
    }
}
