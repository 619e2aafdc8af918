//! Exponential-backoff retry for transient upstream failures.

use std::future::Future;
use std::time::Duration;

use crate::error::UpstreamError;

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
pub const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// Upper bound on a server-provided `Retry-After` hint.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

fn backoff(delay_secs: u64, err: &UpstreamError) -> Duration {
    let base = Duration::from_secs(delay_secs);
    match err.retry_after() {
        Some(hint) => base.max(hint.min(MAX_RETRY_AFTER)),
        None => base,
    }
}

/// Run `op`, retrying only `TransientUnavailable` failures.
///
/// Makes up to four attempts. Any other error is returned immediately.
pub async fn with_retry<T, F, Fut>(label: &str, mut op: F) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    for (attempt, delay_secs) in RETRY_DELAYS_SECS.iter().enumerate() {
        match op().await {
            Err(e) if e.is_transient() => {
                let delay = backoff(*delay_secs, &e);
                tracing::warn!(
                    attempt = attempt + 1,
                    label,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Transient upstream failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }

    // Final attempt after the last backoff.
    op().await.inspect_err(|e| {
        tracing::error!(label, error = %e, "Upstream call failed after all retries");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> UpstreamError {
        UpstreamError::transient("test", "HTTP 503")
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();
        let out = with_retry("t", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(transient())
            } else {
                Ok(7)
            }
        })
        .await
        .unwrap();
        assert_eq!(out, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_four_attempts() {
        let calls = AtomicU32::new(0);
        let err = with_retry("t", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(transient())
        })
        .await
        .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let err = with_retry("t", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(UpstreamError::protocol("test", "garbage"))
        })
        .await
        .unwrap_err();
        assert!(!err.is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retry_after_hint_extends_but_is_capped() {
        let hinted = UpstreamError::TransientUnavailable {
            source_name: "t",
            reason: String::new(),
            retry_after: Some(Duration::from_secs(10)),
        };
        assert_eq!(backoff(1, &hinted), Duration::from_secs(10));
        let huge = UpstreamError::TransientUnavailable {
            source_name: "t",
            reason: String::new(),
            retry_after: Some(Duration::from_secs(3600)),
        };
        assert_eq!(backoff(4, &huge), MAX_RETRY_AFTER);
        assert_eq!(backoff(2, &transient()), Duration::from_secs(2));
    }
}
