//! Per-tournament mutation locks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::time::timeout;

use super::models::TournamentId;

/// Upper bound on waiting for a tournament's mutation lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Keyed mutex registry serializing mutating operations per tournament.
///
/// The bracket engine and the roster manager must share one registry: a
/// join that interleaves with a bracket generation would otherwise hand out
/// a duplicate seed, or register an entrant the frozen bracket never saw.
pub struct TournamentLocks {
    locks: RwLock<HashMap<TournamentId, Arc<Mutex<()>>>>,
    timeout: Duration,
}

impl TournamentLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    /// Acquire the lock for a tournament, waiting at most the configured
    /// timeout. `None` means the wait expired.
    pub async fn acquire(&self, id: TournamentId) -> Option<OwnedMutexGuard<()>> {
        let lock = {
            let locks = self.locks.read().await;
            locks.get(&id).cloned()
        };
        let lock = match lock {
            Some(lock) => lock,
            None => {
                let mut locks = self.locks.write().await;
                locks.entry(id).or_default().clone()
            }
        };
        timeout(self.timeout, lock.lock_owned()).await.ok()
    }

    /// Drop the registry entry for a tournament that will not be mutated
    /// again (completed, canceled or deleted). A no-op while anyone still
    /// holds or awaits the lock.
    pub async fn evict(&self, id: TournamentId) {
        let mut locks = self.locks.write().await;
        if locks.get(&id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&id);
        }
    }

    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn acquire_times_out_while_held() {
        let locks = TournamentLocks::new(Duration::from_millis(20));
        let id = Uuid::new_v4();

        let guard = locks.acquire(id).await.unwrap();
        assert!(locks.acquire(id).await.is_none());
        drop(guard);
        assert!(locks.acquire(id).await.is_some());
    }

    #[tokio::test]
    async fn evict_skips_held_locks() {
        let locks = TournamentLocks::new(DEFAULT_LOCK_TIMEOUT);
        let id = Uuid::new_v4();

        let guard = locks.acquire(id).await.unwrap();
        locks.evict(id).await;
        assert_eq!(locks.len().await, 1);

        drop(guard);
        locks.evict(id).await;
        assert!(locks.is_empty().await);
    }
}
