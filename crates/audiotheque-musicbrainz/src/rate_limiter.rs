// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{sleep, Duration, Instant};

/// Rate limiter for web service calls.
///
/// One request at a time; the next request may start only once `min_interval`
/// has elapsed since the previous request *finished*, whether it succeeded or
/// failed. Completion is recorded when the [`RatePermit`] is dropped.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    min_interval: Duration,
    last_completed: Arc<Mutex<Option<Instant>>>,
    target: &'static str,
}

/// Held for the duration of one request.
#[derive(Debug)]
pub struct RatePermit {
    _permit: Option<OwnedSemaphorePermit>,
    last_completed: Arc<Mutex<Option<Instant>>>,
}

impl Drop for RatePermit {
    fn drop(&mut self) {
        if let Ok(mut last) = self.last_completed.lock() {
            *last = Some(Instant::now());
        }
    }
}

impl RateLimiter {
    /// Create a rate limiter; `target` is the tracing target used for its logs.
    pub fn new(min_interval: Duration, target: &'static str) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            min_interval,
            last_completed: Arc::new(Mutex::new(None)),
            target,
        }
    }

    /// Wait until a request can be made according to the rate limit.
    pub async fn acquire(&self) -> RatePermit {
        // The semaphore is never closed, so this only fails if that changes.
        let permit = self.semaphore.clone().acquire_owned().await.ok();

        let last = self.last_completed.lock().ok().and_then(|last| *last);
        if let Some(last_instant) = last {
            let elapsed = last_instant.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::trace!(
                    target: "rate_limit",
                    service = self.target,
                    "rate limiting: waiting {:?}",
                    wait_time
                );
                sleep(wait_time).await;
            }
        }

        RatePermit {
            _permit: permit,
            last_completed: Arc::clone(&self.last_completed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_rate_limiter_enforces_delay() {
        let limiter = RateLimiter::new(Duration::from_millis(100), "test");

        let start = Instant::now();

        // First request should be immediate
        drop(limiter.acquire().await);
        let first_elapsed = start.elapsed();
        assert!(first_elapsed < Duration::from_millis(50));

        // Second request should wait ~100ms
        drop(limiter.acquire().await);
        let second_elapsed = start.elapsed();
        assert!(
            second_elapsed >= Duration::from_millis(100),
            "expected >= 100ms, got {:?}",
            second_elapsed
        );
    }

    #[tokio::test]
    async fn test_interval_counts_from_completion() {
        let limiter = RateLimiter::new(Duration::from_millis(100), "test");

        let permit = limiter.acquire().await;
        // Simulate a slow request.
        sleep(Duration::from_millis(80)).await;
        let finished = Instant::now();
        drop(permit);

        drop(limiter.acquire().await);
        assert!(
            finished.elapsed() >= Duration::from_millis(100),
            "expected the wait to start at completion, waited {:?}",
            finished.elapsed()
        );
    }

    #[tokio::test]
    async fn test_rate_limiter_multiple_requests() {
        let limiter = RateLimiter::new(Duration::from_millis(50), "test");
        let start = Instant::now();

        for _ in 0..3 {
            drop(limiter.acquire().await);
        }

        let elapsed = start.elapsed();
        // Should take at least 100ms (2 intervals between 3 requests)
        assert!(
            elapsed >= Duration::from_millis(100),
            "expected >= 100ms, got {:?}",
            elapsed
        );
    }
}
