//! Awaitable mutual exclusion over a single-permit semaphore

use std::future::Future;

use tokio::sync::{Semaphore, SemaphorePermit, TryAcquireError};
use tracing::debug;

use crate::error::{ProtectError, Result};

/// Mutual exclusion whose acquisition suspends the task instead of blocking
/// the thread. Guards the critical section, not a value.
#[derive(Debug)]
pub struct AsyncMutex {
    semaphore: Semaphore,
}

impl Default for AsyncMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncMutex {
    pub fn new() -> Self {
        Self {
            semaphore: Semaphore::new(1),
        }
    }

    /// Wait for the lock
    pub async fn enter_locked_block(&self) -> Result<AsyncMutexGuard<'_>> {
        let permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ProtectError::UseAfterRelease("AsyncMutex"))?;

        Ok(AsyncMutexGuard { _permit: permit })
    }

    /// Wait for the lock unless `cancel` completes first.
    ///
    /// A cancelled wait leaves the semaphore untouched. Once the lock is
    /// acquired `cancel` is no longer observed.
    pub async fn enter_locked_block_with_cancel<C>(&self, cancel: C) -> Result<AsyncMutexGuard<'_>>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;

            _ = cancel => {
                debug!("Async lock wait cancelled");
                Err(ProtectError::OperationCancelled)
            }
            guard = self.enter_locked_block() => guard,
        }
    }

    /// Take the lock only if it is free right now
    pub fn try_enter_locked_block(&self) -> Result<Option<AsyncMutexGuard<'_>>> {
        match self.semaphore.try_acquire() {
            Ok(permit) => Ok(Some(AsyncMutexGuard { _permit: permit })),
            Err(TryAcquireError::NoPermits) => Ok(None),
            Err(TryAcquireError::Closed) => Err(ProtectError::UseAfterRelease("AsyncMutex")),
        }
    }

    /// Acquire, await `f`, release. The lock is released even if `f` panics
    /// or the returned future is dropped.
    pub async fn execute_in_lock<F, Fut, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        let _guard = self.enter_locked_block().await?;
        Ok(f().await)
    }

    /// [`AsyncMutex::execute_in_lock`] with a cancellable wait
    pub async fn execute_in_lock_with_cancel<C, F, Fut, R>(&self, cancel: C, f: F) -> Result<R>
    where
        C: Future<Output = ()>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        let _guard = self.enter_locked_block_with_cancel(cancel).await?;
        Ok(f().await)
    }

    /// Whether some task holds the lock
    pub fn is_locked(&self) -> bool {
        self.semaphore.available_permits() == 0
    }

    /// Fail current waiters and all future acquisitions with
    /// [`ProtectError::UseAfterRelease`]. The current holder is unaffected.
    pub fn close(&self) {
        self.semaphore.close();
        debug!("Async lock closed");
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }
}

/// Lock hold; dropping it returns the single permit
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct AsyncMutexGuard<'a> {
    _permit: SemaphorePermit<'a>,
}

impl AsyncMutexGuard<'_> {
    /// Release now
    pub fn release(self) {}
}

impl std::fmt::Debug for AsyncMutexGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AsyncMutexGuard")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments() {
        let lock = Arc::new(AsyncMutex::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..100)
            .map(|_| {
                let (lock, counter) = (lock.clone(), counter.clone());
                tokio::spawn(async move {
                    lock.execute_in_lock(|| async {
                        // Split read-modify-write; lost updates show up without exclusion
                        let value = counter.load(Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        counter.store(value + 1, Ordering::SeqCst);
                    })
                    .await
                    .unwrap();
                })
            })
            .collect();

        for result in futures::future::join_all(tasks).await {
            result.unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 100);
        assert!(!lock.is_locked());
    }

    #[tokio::test]
    async fn test_cancel_before_acquire() {
        let lock = Arc::new(AsyncMutex::new());
        let held = lock.enter_locked_block().await.unwrap();

        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let waiter = {
            let lock = lock.clone();
            tokio::spawn(async move {
                lock.enter_locked_block_with_cancel(async {
                    let _ = cancel_rx.await;
                })
                .await
                .map(|_| ())
            })
        };

        tokio::task::yield_now().await;
        cancel_tx.send(()).unwrap();

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(ProtectError::OperationCancelled)));

        // The semaphore still works for later acquirers
        assert!(lock.is_locked());
        held.release();
        assert!(!lock.is_locked());

        let again = lock.enter_locked_block().await.unwrap();
        assert!(lock.try_enter_locked_block().unwrap().is_none());
        drop(again);
        assert!(lock.try_enter_locked_block().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cancel_unused_when_free() {
        let lock = AsyncMutex::new();
        let guard = lock
            .enter_locked_block_with_cancel(std::future::pending())
            .await
            .unwrap();
        assert!(lock.is_locked());
        drop(guard);
        assert!(!lock.is_locked());
    }

    #[tokio::test]
    async fn test_execute_in_lock_with_cancel_timeout() {
        let lock = AsyncMutex::new();
        let _held = lock.enter_locked_block().await.unwrap();

        let result = lock
            .execute_in_lock_with_cancel(tokio::time::sleep(Duration::from_millis(10)), || async { 1 })
            .await;
        assert!(matches!(result, Err(ProtectError::OperationCancelled)));
    }

    #[tokio::test]
    async fn test_execute_in_lock_returns_value() {
        let lock = AsyncMutex::new();
        let value = lock.execute_in_lock(|| async { "done" }).await.unwrap();
        assert_eq!(value, "done");
        assert!(!lock.is_locked());
    }

    #[tokio::test]
    async fn test_release_after_panic() {
        let lock = Arc::new(AsyncMutex::new());

        let task = {
            let lock = lock.clone();
            tokio::spawn(async move {
                lock.execute_in_lock(|| async {
                    if true {
                        panic!("boom");
                    }
                })
                .await
            })
        };
        assert!(task.await.unwrap_err().is_panic());

        assert!(!lock.is_locked());
        assert!(lock.try_enter_locked_block().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_close() {
        let lock = Arc::new(AsyncMutex::new());
        let held = lock.enter_locked_block().await.unwrap();

        let waiter = {
            let lock = lock.clone();
            tokio::spawn(async move { lock.enter_locked_block().await.map(|_| ()) })
        };
        tokio::task::yield_now().await;

        lock.close();
        assert!(lock.is_closed());
        assert!(matches!(
            waiter.await.unwrap(),
            Err(ProtectError::UseAfterRelease(_))
        ));
        assert!(matches!(
            lock.try_enter_locked_block(),
            Err(ProtectError::UseAfterRelease(_))
        ));

        drop(held);
    }
}
