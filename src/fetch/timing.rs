//! Delay abstraction and jitter.
//!
//! All waits in the fetch engine go through [`Sleeper`] so tests can run the
//! retry state machine without real time passing.

use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;

/// Blocking-wait seam for retry backoff and pre-request jitter.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Test sleeper that records requested delays instead of waiting.
pub struct RecordingSleeper {
    pub slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self {
            slept: Mutex::new(Vec::new()),
        }
    }

    pub fn total_slept(&self) -> Duration {
        self.slept.lock().unwrap().iter().sum()
    }
}

impl Default for RecordingSleeper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// A randomized delay in `[min_secs, max_secs]`, derived from the system
/// clock's nanoseconds.
pub fn jitter(min_secs: u64, max_secs: u64) -> Duration {
    let (min_secs, max_secs) = if min_secs <= max_secs {
        (min_secs, max_secs)
    } else {
        (max_secs, min_secs)
    };
    let span_ms = (max_secs - min_secs) * 1000;
    if span_ms == 0 {
        return Duration::from_secs(min_secs);
    }
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    Duration::from_millis(min_secs * 1000 + nanos % span_ms)
}
