use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-candidate single-writer locks. Pipelines for different candidates run
/// in parallel; two writers on the same candidate are serialized.
#[derive(Debug, Default)]
pub struct CandidateLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl CandidateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and holds the candidate's lock until the guard is dropped.
    ///
    /// Entries nobody holds or waits on are pruned here, so the map only
    /// tracks candidates with a writer in flight.
    pub async fn acquire(&self, candidate_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(candidate_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_same_candidate_is_serialized() {
        let locks = Arc::new(CandidateLocks::new());
        let id = Uuid::new_v4();

        let guard = locks.acquire(id).await;
        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(id).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_released_entries_are_pruned() {
        let locks = CandidateLocks::new();
        let held = locks.acquire(Uuid::new_v4()).await;
        drop(locks.acquire(Uuid::new_v4()).await);

        let _current = locks.acquire(Uuid::new_v4()).await;
        // The released candidate is gone; the held one and the current one stay
        assert_eq!(locks.locks.lock().await.len(), 2);
        drop(held);
    }

    #[tokio::test]
    async fn test_different_candidates_do_not_block() {
        let locks = CandidateLocks::new();
        let _a = locks.acquire(Uuid::new_v4()).await;
        let _b = tokio::time::timeout(Duration::from_secs(1), locks.acquire(Uuid::new_v4()))
            .await
            .expect("second candidate should not wait");
    }
}
