use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Enforces a minimum spacing between calls to a rate-limited provider.
///
/// The first call passes immediately; every later call waits until
/// `interval` has elapsed since the previous one was released.
#[derive(Debug)]
pub struct MinIntervalLimiter {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl MinIntervalLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Wait for our turn, then record the release time.
    pub async fn acquire(&self) {
        let mut guard = self.last.lock().await;
        if let Some(last) = *guard {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *guard = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_call_is_immediate() {
        let limiter = MinIntervalLimiter::new(Duration::from_millis(300));
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_second_call_waits_for_interval() {
        let limiter = MinIntervalLimiter::new(Duration::from_millis(120));
        limiter.acquire().await;
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
