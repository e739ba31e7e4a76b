//! Bounded polling for eventually-consistent external state
//!
//! Retries a fallible check at a fixed interval until it succeeds or a
//! timeout elapses. The attempt made once the deadline is reached is real
//! and definitive: callers always see an actual check result, never a
//! synthetic timeout error. The inter-attempt sleep is the only suspension
//! point and is interruptible by a shutdown signal.

use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::debug;

use crate::error::{BosunError, Result};

/// Successful poll result: the check output plus timing details.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub output: String,
    pub elapsed: Duration,
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct BoundedPoller {
    interval: Duration,
    timeout: Duration,
}

impl BoundedPoller {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Invoke `check` until it succeeds or the timeout is exhausted.
    ///
    /// On failure before the deadline, sleeps for the interval (or the
    /// remaining time if smaller) and retries. The first attempt at or past
    /// the deadline is final: its result is returned as-is. If `shutdown`
    /// flips to true mid-sleep, returns [`BosunError::Cancelled`] immediately.
    pub async fn poll<F, Fut>(
        &self,
        mut check: F,
        mut shutdown: Option<watch::Receiver<bool>>,
    ) -> Result<PollOutcome>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let start = Instant::now();
        let deadline = start + self.timeout;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match check().await {
                Ok(output) => {
                    return Ok(PollOutcome {
                        output,
                        elapsed: start.elapsed(),
                        attempts,
                    });
                }
                Err(err) => {
                    let now = Instant::now();
                    if now >= deadline {
                        debug!("final poll attempt {attempts} failed after {:?}", start.elapsed());
                        return Err(err);
                    }
                    let wait = self.interval.min(deadline - now);
                    debug!("poll attempt {attempts} failed, retrying in {wait:?}: {err}");
                    match shutdown.as_mut() {
                        Some(rx) => {
                            tokio::select! {
                                _ = tokio::time::sleep(wait) => {}
                                changed = rx.changed() => {
                                    if changed.is_err() || *rx.borrow() {
                                        return Err(BosunError::Cancelled);
                                    }
                                }
                            }
                        }
                        None => tokio::time::sleep(wait).await,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn poller(interval_ms: u64, timeout_ms: u64) -> BoundedPoller {
        BoundedPoller::new(
            Duration::from_millis(interval_ms),
            Duration::from_millis(timeout_ms),
        )
    }

    #[tokio::test]
    async fn test_immediate_success() {
        let outcome = poller(10, 100)
            .poll(|| async { Ok("ready".to_string()) }, None)
            .await
            .unwrap();
        assert_eq!(outcome.output, "ready");
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in_check = calls.clone();
        let outcome = poller(5, 500)
            .poll(
                move || {
                    let calls = calls_in_check.clone();
                    async move {
                        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                            Err(BosunError::collaborator("flux", "not ready"))
                        } else {
                            Ok("ready".to_string())
                        }
                    }
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(outcome.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout_returns_final_attempt_result() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in_check = calls.clone();
        let start = Instant::now();
        let err = poller(20, 50)
            .poll(
                move || {
                    let calls = calls_in_check.clone();
                    async move {
                        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                        Err::<String, _>(BosunError::collaborator("flux", format!("attempt {n}")))
                    }
                },
                None,
            )
            .await
            .unwrap_err();

        // The error is the final attempt's real failure, not a synthetic
        // timeout, and the loop stayed within one interval of the deadline.
        let total = calls.load(Ordering::SeqCst);
        assert!(err.to_string().contains(&format!("attempt {total}")));
        assert!(start.elapsed() < Duration::from_millis(50 + 20 + 20));
        assert!(total >= 3);
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_sleep() {
        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = tx.send(true);
        });

        let start = Instant::now();
        let err = poller(5_000, 10_000)
            .poll(
                || async { Err::<String, _>(BosunError::collaborator("flux", "never ready")) },
                Some(rx),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BosunError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
