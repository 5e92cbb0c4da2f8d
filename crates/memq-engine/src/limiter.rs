//! Process-wide cap on concurrently executing job bodies.

use std::sync::Arc;

use memq_core::QueueError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting permit pool shared by every namespace worker.
///
/// Cloning is cheap and shares the same pool.
#[derive(Clone, Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// One slot in the pool. Released when dropped, on every exit path.
#[derive(Debug)]
pub struct JobPermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 || capacity > Semaphore::MAX_PERMITS {
            return Err(QueueError::InvalidCapacity(capacity));
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Wait for a free slot. Suspends the caller while the pool is exhausted.
    ///
    /// Fails only after [`close`](Self::close).
    pub async fn acquire(&self) -> Result<JobPermit, QueueError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| QueueError::LimiterClosed)?;
        Ok(JobPermit { _permit: permit })
    }

    /// Stop handing out permits. Held permits stay valid until dropped.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Permits currently held.
    pub fn in_flight(&self) -> usize {
        self.capacity.saturating_sub(self.available())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn zero_capacity_is_rejected() {
        let err = ConcurrencyLimiter::new(0).unwrap_err();
        assert!(matches!(err, QueueError::InvalidCapacity(0)));
    }

    #[tokio::test]
    async fn acquire_blocks_when_exhausted() {
        let limiter = ConcurrencyLimiter::new(2).unwrap();
        let a = limiter.acquire().await.unwrap();
        let _b = limiter.acquire().await.unwrap();
        assert_eq!(limiter.in_flight(), 2);
        assert_eq!(limiter.available(), 0);

        let third = tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(third.is_err(), "third acquire should wait");

        drop(a);
        assert_eq!(limiter.in_flight(), 1);
        let c = tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(c.is_ok());
    }

    #[tokio::test]
    async fn clones_share_one_pool() {
        let limiter = ConcurrencyLimiter::new(1).unwrap();
        let other = limiter.clone();
        let _held = limiter.acquire().await.unwrap();
        assert_eq!(other.available(), 0);
    }

    #[tokio::test]
    async fn closed_limiter_refuses_new_permits() {
        let limiter = ConcurrencyLimiter::new(1).unwrap();
        let held = limiter.acquire().await.unwrap();
        limiter.close();
        assert!(limiter.is_closed());
        assert!(matches!(
            limiter.acquire().await,
            Err(QueueError::LimiterClosed)
        ));
        drop(held);
    }
}
