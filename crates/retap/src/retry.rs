//! Single-retry wrapping and the boolean probe adapter.
//!
//! Device-automation calls are flaky by nature: animation and render
//! timing make a first attempt fail where a second, issued a moment
//! later, succeeds. [`with_retry`] is the base primitive nearly every
//! helper operation composes with: one retry after a fixed pause, the
//! second failure propagated untouched. Anything needing more than one
//! retry belongs in the attempt-budget loops in [`poll`](crate::poll)
//! instead.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Pause inserted between the two attempts of [`with_retry`].
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Sleep for a whole number of seconds.
///
/// A fixed sleep is a last resort for animations the backend's own
/// synchronisation cannot see; prefer the bounded waits on
/// [`Robot`](crate::robot::Robot).
pub async fn wait_secs(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

/// Run an async operation; on failure, pause [`RETRY_DELAY`] and run it
/// exactly one more time.
///
/// The first failure is logged and swallowed; the second is returned to
/// the caller unmodified. The operation must be idempotent.
///
/// # Example
///
/// ```
/// use retap::retry::with_retry;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let result: Result<u32, &str> = with_retry(|| async { Ok(7) }).await;
/// assert_eq!(result, Ok(7));
/// # }
/// ```
pub async fn with_retry<T, E, F, Fut>(mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match op().await {
        Ok(value) => Ok(value),
        Err(first) => {
            debug!(error = %first, "first attempt failed, retrying once");
            tokio::time::sleep(RETRY_DELAY).await;
            op().await
        }
    }
}

/// Convert an operation's succeed/fail outcome into a boolean.
///
/// Resolves `true` when the future succeeds and `false` on any failure;
/// the failure itself is never surfaced. For call sites that want an
/// existence probe rather than an assertion:
///
/// ```
/// use retap::retry::probe;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let closed: Result<(), &str> = Err("no such element");
/// assert!(!probe(async { closed }).await);
/// assert!(probe(async { Ok::<_, &str>(()) }).await);
/// # }
/// ```
pub async fn probe<T, E>(op: impl Future<Output = Result<T, E>>) -> bool {
    op.await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_retry_absorbs_single_failure() {
        let attempts = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result: Result<(), String> = with_retry(|| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err("not hittable yet".to_string())
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        // The two attempts are separated by the fixed delay.
        assert!(start.elapsed() >= RETRY_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_does_not_touch_success() {
        let attempts = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result: Result<u32, String> = with_retry(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Ok(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_propagates_second_failure_unmodified() {
        let attempts = AtomicU32::new(0);

        let result: Result<(), String> = with_retry(|| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move { Err(format!("failure #{n}")) }
        })
        .await;

        // Exactly two attempts, and the caller sees the second error.
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(result.unwrap_err(), "failure #1");
    }

    #[tokio::test]
    async fn test_probe_swallows_errors() {
        assert!(probe(async { Ok::<_, String>(5) }).await);
        assert!(!probe(async { Err::<(), _>("boom".to_string()) }).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_secs_sleeps() {
        let start = tokio::time::Instant::now();
        wait_secs(3).await;
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }
}
