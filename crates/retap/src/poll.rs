//! Bounded polling with recovery actions.
//!
//! Where [`retry`](crate::retry) is a one-shot safety net, the engine
//! here is for waiting out a state transition: repeat a check under an
//! attempt budget, running a caller-chosen recovery action (a sleep, a
//! scroll, a back-tap) between consecutive attempts. When the budget is
//! spent the caller's descriptive error is raised; recovery failures are
//! not absorbed: a broken scroll surface should fail the step, not be
//! polled over.
//!
//! Iterations are strictly sequential: attempt N+1 never starts before
//! attempt N's recovery completed. The budget here is independent of any
//! per-call timeout the driver applies inside one check.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, trace};

use crate::driver::DriverError;
use crate::error::{RetapError, RetapResult};

/// Default number of polling attempts.
pub const DEFAULT_ATTEMPTS: u32 = 7;

/// Default pause between polling attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Budget for one polling operation: how many attempts, and how long the
/// sleep-recovery pauses between them.
///
/// Scoped to a single helper invocation; the driver's own per-call
/// timeout is a separate mechanism and both must be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptBudget {
    /// Maximum number of check attempts.
    pub attempts: u32,
    /// Pause between attempts when the recovery is a plain sleep.
    pub interval: Duration,
}

impl Default for AttemptBudget {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl AttemptBudget {
    /// Budget with the given attempt count and the default interval.
    pub fn attempts(attempts: u32) -> Self {
        Self {
            attempts,
            ..Self::default()
        }
    }

    /// Replace the pause between attempts.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Repeat `check` until it succeeds or `attempts` checks have failed.
///
/// `recover` runs between consecutive checks (so a run of N checks
/// performs N-1 recoveries); its errors propagate immediately. After the
/// final failed check, `exhausted` is called with the attempt count to
/// build the error.
///
/// An `attempts` of zero is treated as one: a polling operation always
/// checks at least once.
pub async fn poll_until<C, CFut, R, RFut>(
    attempts: u32,
    mut check: C,
    mut recover: R,
    exhausted: impl FnOnce(u32) -> RetapError,
) -> RetapResult<()>
where
    C: FnMut() -> CFut,
    CFut: Future<Output = Result<(), DriverError>>,
    R: FnMut() -> RFut,
    RFut: Future<Output = RetapResult<()>>,
{
    let attempts = attempts.max(1);
    let mut remaining = attempts;
    loop {
        match check().await {
            Ok(()) => return Ok(()),
            Err(err) => {
                remaining -= 1;
                if remaining == 0 {
                    debug!(error = %err, attempts, "attempt budget exhausted");
                    return Err(exhausted(attempts));
                }
                trace!(error = %err, remaining, "check failed, running recovery");
                recover().await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn check_failing_first<'a>(
        counter: &'a AtomicU32,
        succeed_on: u32,
    ) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = Result<(), DriverError>> + 'a>> {
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Box::pin(async move {
                if n >= succeed_on {
                    Ok(())
                } else {
                    Err(DriverError::NotFound {
                        target: "id `x`".to_string(),
                    })
                }
            })
        }
    }

    fn counting_recovery<'a>(
        counter: &'a AtomicU32,
    ) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = RetapResult<()>> + 'a>> {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn test_immediate_success_runs_no_recovery() {
        let checks = AtomicU32::new(0);
        let recoveries = AtomicU32::new(0);

        let result = poll_until(
            7,
            check_failing_first(&checks, 1),
            counting_recovery(&recoveries),
            |attempts| RetapError::WaitExhausted {
                target: "id `x`".to_string(),
                attempts,
            },
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(checks.load(Ordering::SeqCst), 1);
        assert_eq!(recoveries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_on_attempt_k_runs_k_minus_one_recoveries() {
        let checks = AtomicU32::new(0);
        let recoveries = AtomicU32::new(0);

        let result = poll_until(
            10,
            check_failing_first(&checks, 4),
            counting_recovery(&recoveries),
            |attempts| RetapError::WaitExhausted {
                target: "id `x`".to_string(),
                attempts,
            },
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(checks.load(Ordering::SeqCst), 4);
        assert_eq!(recoveries.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_performs_exactly_n_checks() {
        let checks = AtomicU32::new(0);
        let recoveries = AtomicU32::new(0);

        let result = poll_until(
            7,
            check_failing_first(&checks, u32::MAX),
            counting_recovery(&recoveries),
            |attempts| RetapError::WaitExhausted {
                target: "id `summary`".to_string(),
                attempts,
            },
        )
        .await;

        match result {
            Err(RetapError::WaitExhausted { target, attempts }) => {
                assert_eq!(target, "id `summary`");
                assert_eq!(attempts, 7);
            }
            other => panic!("Expected WaitExhausted, got {other:?}"),
        }
        assert_eq!(checks.load(Ordering::SeqCst), 7);
        assert_eq!(recoveries.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_recovery_failure_propagates_immediately() {
        let checks = AtomicU32::new(0);

        let result = poll_until(
            7,
            check_failing_first(&checks, u32::MAX),
            || {
                Box::pin(async {
                    Err(RetapError::Driver(DriverError::ActionFailed(
                        "scroll surface gone".to_string(),
                    )))
                })
                    as std::pin::Pin<Box<dyn Future<Output = RetapResult<()>>>>
            },
            |attempts| RetapError::WaitExhausted {
                target: "id `x`".to_string(),
                attempts,
            },
        )
        .await;

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("scroll surface gone"));
        assert_eq!(checks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_checks_once() {
        let checks = AtomicU32::new(0);
        let recoveries = AtomicU32::new(0);

        let result = poll_until(
            0,
            check_failing_first(&checks, u32::MAX),
            counting_recovery(&recoveries),
            |attempts| RetapError::WaitExhausted {
                target: "id `x`".to_string(),
                attempts,
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(checks.load(Ordering::SeqCst), 1);
        assert_eq!(recoveries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_recovery_pauses_between_attempts() {
        let checks = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result = poll_until(
            3,
            check_failing_first(&checks, u32::MAX),
            || async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(())
            },
            |attempts| RetapError::WaitExhausted {
                target: "id `x`".to_string(),
                attempts,
            },
        )
        .await;

        assert!(result.is_err());
        // Three checks, two sleep recoveries.
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[test]
    fn test_budget_defaults_and_builders() {
        let budget = AttemptBudget::default();
        assert_eq!(budget.attempts, 7);
        assert_eq!(budget.interval, Duration::from_secs(1));

        let budget = AttemptBudget::attempts(3).with_interval(Duration::from_millis(200));
        assert_eq!(budget.attempts, 3);
        assert_eq!(budget.interval, Duration::from_millis(200));
    }
}
