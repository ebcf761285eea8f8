//! Advisory per-domain request throttle.
//!
//! Keyed by (domain, caller): independent callers get independent budgets.
//! A violating request is rejected with the remaining wait time rather than
//! queued, so callers stay in control of their own latency. This is a
//! politeness mechanism, not a correctness lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

/// Shared last-attempt timestamp store.
#[derive(Debug, Clone)]
pub struct RequestThrottle {
    min_interval: Duration,
    last_attempt: Arc<RwLock<HashMap<(String, String), Instant>>>,
}

impl RequestThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_attempt: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Try to start a request to `domain` on behalf of `caller`.
    ///
    /// Ok: the attempt timestamp is recorded and the caller may proceed.
    /// Err: the remaining wait before this (domain, caller) pair is allowed
    /// again. The timestamp is not updated on rejection.
    pub async fn try_acquire(&self, domain: &str, caller: &str) -> Result<(), Duration> {
        let key = (domain.to_string(), caller.to_string());
        let mut store = self.last_attempt.write().await;
        if let Some(last) = store.get(&key) {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(domain, caller, ?wait, "request throttled");
                return Err(wait);
            }
        }
        store.insert(key, Instant::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_request_passes() {
        let throttle = RequestThrottle::new(Duration::from_secs(10));
        assert!(throttle.try_acquire("zealty.ca", "user-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_immediate_repeat_is_rejected_with_wait() {
        let throttle = RequestThrottle::new(Duration::from_secs(10));
        throttle.try_acquire("zealty.ca", "user-1").await.unwrap();
        let wait = throttle.try_acquire("zealty.ca", "user-1").await.unwrap_err();
        assert!(wait <= Duration::from_secs(10));
        assert!(wait > Duration::from_secs(9));
    }

    #[tokio::test]
    async fn test_callers_and_domains_are_independent() {
        let throttle = RequestThrottle::new(Duration::from_secs(10));
        throttle.try_acquire("zealty.ca", "user-1").await.unwrap();
        assert!(throttle.try_acquire("zealty.ca", "user-2").await.is_ok());
        assert!(throttle.try_acquire("realtor.ca", "user-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_rejection_does_not_extend_window() {
        let throttle = RequestThrottle::new(Duration::from_millis(50));
        throttle.try_acquire("zealty.ca", "user-1").await.unwrap();
        let _ = throttle.try_acquire("zealty.ca", "user-1").await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(throttle.try_acquire("zealty.ca", "user-1").await.is_ok());
    }
}
