use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Bounded retry for document writes that fail transiently.
#[derive(Clone, Debug)]
pub struct WriteRetryPolicy {
    max_retries: u32,
    backoff_base: Duration,
    backoff_max: Duration,
}

impl Default for WriteRetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(20), Duration::from_millis(200))
    }
}

impl WriteRetryPolicy {
    pub fn new(max_retries: u32, backoff_base: Duration, backoff_max: Duration) -> Self {
        Self { max_retries, backoff_base, backoff_max }
    }

    /// Never retry; every failure surfaces immediately.
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    pub fn backoff_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2_u32.saturating_pow(attempt - 1);
        self.backoff_base.saturating_mul(factor).min(self.backoff_max)
    }

    pub async fn wait_before_retry(&self, attempt: u32) {
        let backoff = self.backoff_for(attempt);
        debug!(?backoff, attempt, "retrying document write");
        sleep(backoff).await;
    }

    /// `attempt` counts retries already made.
    pub fn should_retry(&self, attempt: u32, error: &io::Error) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        let transient = matches!(
            error.kind(),
            io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        );
        if !transient {
            warn!(error = %error, "write error is not retryable");
        }
        transient
    }

    /// Run `op` until it succeeds, fails permanently or the retries run out.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> io::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = io::Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if self.should_retry(attempt, &e) => {
                    attempt += 1;
                    self.wait_before_retry(attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_doubles_and_caps() {
        let p = WriteRetryPolicy::new(5, Duration::from_millis(10), Duration::from_millis(35));
        assert_eq!(p.backoff_for(0), Duration::ZERO);
        assert_eq!(p.backoff_for(1), Duration::from_millis(10));
        assert_eq!(p.backoff_for(2), Duration::from_millis(20));
        assert_eq!(p.backoff_for(3), Duration::from_millis(35));
    }

    #[test]
    fn only_transient_kinds_are_retried() {
        let p = WriteRetryPolicy::default();
        assert!(p.should_retry(0, &io::Error::from(io::ErrorKind::Interrupted)));
        assert!(p.should_retry(1, &io::Error::from(io::ErrorKind::TimedOut)));
        assert!(!p.should_retry(2, &io::Error::from(io::ErrorKind::TimedOut)));
        assert!(!p.should_retry(0, &io::Error::from(io::ErrorKind::PermissionDenied)));
        assert!(!WriteRetryPolicy::disabled().should_retry(0, &io::Error::from(io::ErrorKind::Interrupted)));
    }

    fn flaky(calls: &AtomicU32, failures: u32, kind: io::ErrorKind) -> impl Future<Output = io::Result<u32>> {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < failures {
                Err(io::Error::from(kind))
            } else {
                Ok(n)
            }
        }
    }

    #[tokio::test]
    async fn run_retries_transient_failures_until_success() {
        let calls = AtomicU32::new(0);
        let p = WriteRetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(2));
        let out = p.run(|| flaky(&calls, 2, io::ErrorKind::Interrupted)).await.unwrap();
        assert_eq!(out, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn run_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let p = WriteRetryPolicy::new(1, Duration::from_millis(1), Duration::from_millis(2));
        let err = p.run(|| flaky(&calls, 5, io::ErrorKind::TimedOut)).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn run_does_not_retry_permanent_failures() {
        let calls = AtomicU32::new(0);
        let err = WriteRetryPolicy::default()
            .run(|| flaky(&calls, 5, io::ErrorKind::PermissionDenied))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
