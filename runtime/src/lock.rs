//! Per-court mutual exclusion.
//!
//! A [`ResourceLocker`] hands out a [`LockHandle`] granting exclusive
//! ownership of one court key. The admission service holds the handle across
//! the overlap check and the write that follows it.
//!
//! Two implementations are provided:
//!
//! - [`LocalLocker`]: one async mutex per key, created on first use and
//!   evicted when nobody holds or awaits it
//! - [`ShardedLocker`]: a fixed array of mutexes, key hashed to a shard
//!
//! Both rely on `tokio::sync::Mutex`, which queues waiters in FIFO order.

use courtside_core::{CourtId, LockError};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Boxed future returned by [`ResourceLocker::acquire`].
pub type LockFuture<'a> = Pin<Box<dyn Future<Output = Result<LockHandle, LockError>> + Send + 'a>>;

type KeyMutex = Arc<AsyncMutex<()>>;

/// Exclusive ownership of resource keys.
///
/// # Dyn Compatibility
///
/// `acquire` returns a boxed future so lockers can be shared as
/// `Arc<dyn ResourceLocker>`.
///
/// # Cancellation
///
/// Dropping the future returned by `acquire` abandons the wait without
/// taking the lock.
///
/// # Re-entrancy
///
/// Locks are not re-entrant. Acquiring a key already held by the same task
/// waits forever, or until the wait limit elapses.
pub trait ResourceLocker: Send + Sync {
    /// Wait for exclusive ownership of `key`.
    ///
    /// `wait_limit = None` waits without bound.
    ///
    /// # Errors
    ///
    /// [`LockError::Timeout`] if the lock was not obtained within `wait_limit`.
    fn acquire<'a>(&'a self, key: &'a CourtId, wait_limit: Option<Duration>) -> LockFuture<'a>;

    /// Give up ownership held by `handle`.
    ///
    /// # Errors
    ///
    /// - [`LockError::ForeignHandle`]: the handle came from another locker
    /// - [`LockError::NotHeld`]: this locker has no held lock for the key
    ///
    /// The underlying lock is released even when an error is returned.
    fn release(&self, handle: LockHandle) -> Result<(), LockError>;
}

// ============================================================================
// Handle
// ============================================================================

enum Origin {
    Table(Arc<LockTable>),
    Shards(Arc<ShardSet>),
}

/// Token representing ownership of one key's lock.
///
/// Dropping the handle releases the lock, so an early return or a panic in
/// the holder can never leave a court locked.
pub struct LockHandle {
    key: CourtId,
    guard: Option<OwnedMutexGuard<()>>,
    origin: Origin,
}

impl LockHandle {
    /// Key this handle owns.
    #[must_use]
    pub const fn key(&self) -> &CourtId {
        &self.key
    }

    fn release_inner(&mut self) -> Result<(), LockError> {
        let Some(guard) = self.guard.take() else {
            return Ok(());
        };
        match &self.origin {
            Origin::Table(table) => table.release(&self.key, guard),
            Origin::Shards(_) => {
                drop(guard);
                Ok(())
            }
        }
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if let Err(e) = self.release_inner() {
            tracing::debug!(key = %self.key, error = %e, "Lock released on drop without table entry");
        }
    }
}

impl fmt::Debug for LockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockHandle")
            .field("key", &self.key)
            .field("held", &self.guard.is_some())
            .finish_non_exhaustive()
    }
}

async fn lock_within(
    mutex: KeyMutex,
    wait_limit: Option<Duration>,
) -> Result<OwnedMutexGuard<()>, LockError> {
    match wait_limit {
        None => Ok(mutex.lock_owned().await),
        Some(limit) => tokio::time::timeout(limit, mutex.lock_owned())
            .await
            .map_err(|_| LockError::Timeout { waited: limit }),
    }
}

// ============================================================================
// LocalLocker
// ============================================================================

/// Key → mutex table shared by a [`LocalLocker`] and the handles it issues.
#[derive(Debug, Default)]
struct LockTable {
    entries: Mutex<HashMap<CourtId, KeyMutex>>,
}

impl LockTable {
    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<CourtId, KeyMutex>> {
        // The map is never left half-updated, so a poisoned guard is still usable.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn checkout(&self, key: &CourtId) -> KeyMutex {
        let mut entries = self.entries();
        Arc::clone(
            entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }

    /// Release `guard` and evict the entry if nobody else references it.
    fn release(&self, key: &CourtId, guard: OwnedMutexGuard<()>) -> Result<(), LockError> {
        let mut entries = self.entries();
        let held = entries
            .get(key)
            .is_some_and(|entry| Arc::ptr_eq(entry, OwnedMutexGuard::mutex(&guard)));
        if !held {
            drop(guard);
            return Err(LockError::NotHeld { key: key.clone() });
        }

        // One reference in the table, one in our guard: no waiters.
        if entries
            .get(key)
            .is_some_and(|entry| Arc::strong_count(entry) <= 2)
        {
            entries.remove(key);
        }
        drop(guard);
        Ok(())
    }

    /// Drop an abandoned waiter's reference, evicting the entry if idle.
    fn abandon(&self, key: &CourtId, mutex: KeyMutex) {
        let mut entries = self.entries();
        let idle = entries
            .get(key)
            .is_some_and(|entry| Arc::ptr_eq(entry, &mutex) && Arc::strong_count(&mutex) <= 2);
        if idle {
            entries.remove(key);
        }
    }

    fn len(&self) -> usize {
        self.entries().len()
    }
}

/// A waiter's claim on a table entry. Cleans up if the wait is abandoned.
struct PendingEntry<'a> {
    table: &'a Arc<LockTable>,
    key: &'a CourtId,
    mutex: Option<KeyMutex>,
}

impl PendingEntry<'_> {
    fn disarm(mut self) {
        self.mutex = None;
    }
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        if let Some(mutex) = self.mutex.take() {
            self.table.abandon(self.key, mutex);
        }
    }
}

/// One lock per court, created lazily and evicted when idle.
///
/// Cloning shares the underlying table.
#[derive(Debug, Clone, Default)]
pub struct LocalLocker {
    table: Arc<LockTable>,
}

impl LocalLocker {
    /// Create an empty locker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held or awaited.
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.table.len()
    }
}

impl ResourceLocker for LocalLocker {
    fn acquire<'a>(&'a self, key: &'a CourtId, wait_limit: Option<Duration>) -> LockFuture<'a> {
        Box::pin(async move {
            let mutex = self.table.checkout(key);
            let pending = PendingEntry {
                table: &self.table,
                key,
                mutex: Some(Arc::clone(&mutex)),
            };

            let guard = lock_within(mutex, wait_limit).await?;
            pending.disarm();

            tracing::trace!(key = %key, "Acquired court lock");
            Ok(LockHandle {
                key: key.clone(),
                guard: Some(guard),
                origin: Origin::Table(Arc::clone(&self.table)),
            })
        })
    }

    fn release(&self, mut handle: LockHandle) -> Result<(), LockError> {
        let ours = matches!(&handle.origin, Origin::Table(table) if Arc::ptr_eq(table, &self.table));
        if ours {
            handle.release_inner()
        } else {
            Err(LockError::ForeignHandle)
        }
    }
}

// ============================================================================
// ShardedLocker
// ============================================================================

#[derive(Debug)]
struct ShardSet {
    shards: Vec<KeyMutex>,
}

/// Fixed number of locks shared by all courts.
///
/// Memory stays bounded regardless of how many courts exist. Two courts that
/// hash to the same shard contend with each other.
#[derive(Debug, Clone)]
pub struct ShardedLocker {
    set: Arc<ShardSet>,
}

impl ShardedLocker {
    /// Create a locker with `shards` locks. Zero is treated as one.
    #[must_use]
    pub fn new(shards: usize) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| Arc::new(AsyncMutex::new(())))
            .collect();
        Self {
            set: Arc::new(ShardSet { shards }),
        }
    }

    /// Number of shards.
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.set.shards.len()
    }

    /// Shard index `key` maps to.
    #[must_use]
    pub fn shard_for(&self, key: &CourtId) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        #[allow(clippy::cast_possible_truncation)] // Reduced modulo shard count
        let index = (hasher.finish() % self.set.shards.len() as u64) as usize;
        index
    }
}

impl ResourceLocker for ShardedLocker {
    fn acquire<'a>(&'a self, key: &'a CourtId, wait_limit: Option<Duration>) -> LockFuture<'a> {
        Box::pin(async move {
            let shard = self.shard_for(key);
            let mutex = Arc::clone(&self.set.shards[shard]);
            let guard = lock_within(mutex, wait_limit).await?;

            tracing::trace!(key = %key, shard, "Acquired sharded court lock");
            Ok(LockHandle {
                key: key.clone(),
                guard: Some(guard),
                origin: Origin::Shards(Arc::clone(&self.set)),
            })
        })
    }

    fn release(&self, mut handle: LockHandle) -> Result<(), LockError> {
        let ours = matches!(&handle.origin, Origin::Shards(set) if Arc::ptr_eq(set, &self.set));
        if ours {
            handle.release_inner()
        } else {
            Err(LockError::ForeignHandle)
        }
    }
}
