//! Error types for the helper layer.
//!
//! Driver failures pass through unchanged; the variants added here are the
//! budget-exhaustion failures raised by the polling loops, each carrying
//! enough context (target, container, attempt count) to read in a test
//! report without reproducing the run.

use thiserror::Error;

use crate::driver::DriverError;

/// Result type for helper-layer operations.
pub type RetapResult<T> = Result<T, RetapError>;

/// Errors raised by the helper layer.
#[derive(Error, Debug)]
pub enum RetapError {
    /// A driver call failed and no retry/polling construct absorbed it.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// A visibility polling loop ran out of attempts.
    #[error("Cannot find {target} after {attempts} attempts")]
    WaitExhausted {
        /// Description of the locator that never became visible.
        target: String,
        /// The attempt budget that was spent.
        attempts: u32,
    },

    /// An enabled-state polling loop ran out of attempts.
    #[error("{target} still disabled after {attempts} attempts, or not found")]
    DisabledBeyondBudget {
        /// Description of the locator that never became enabled.
        target: String,
        /// The attempt budget that was spent.
        attempts: u32,
    },

    /// A scroll-until-visible loop spent its scroll budget.
    #[error("Cannot find {target} while scrolling {container}")]
    ScrollExhausted {
        /// Description of the locator that never became visible.
        target: String,
        /// Description of the container that was scrolled.
        container: String,
    },

    /// A repeated back-navigation loop spent its budget.
    #[error("Cannot find {target} after {attempts} back-navigation attempts")]
    BackNavigationExhausted {
        /// Description of the locator that never appeared.
        target: String,
        /// The back-tap budget that was spent.
        attempts: u32,
    },

    /// An I/O error from the debug side channels.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialisation error from the debug side channels.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhaustion_messages_name_target_and_budget() {
        let err = RetapError::WaitExhausted {
            target: "id `summary`".to_string(),
            attempts: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("id `summary`"));
        assert!(msg.contains('7'));

        let err = RetapError::ScrollExhausted {
            target: "text `Payment options`".to_string(),
            container: "id `supportScrollView`".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("text `Payment options`"));
        assert!(msg.contains("id `supportScrollView`"));

        let err = RetapError::BackNavigationExhausted {
            target: "id `accountHome`".to_string(),
            attempts: 3,
        };
        assert!(err.to_string().contains("3 back-navigation attempts"));
    }

    #[test]
    fn test_driver_errors_pass_through_transparently() {
        let inner = DriverError::NotFound {
            target: "id `missing`".to_string(),
        };
        let wrapped: RetapError = inner.into();
        assert_eq!(wrapped.to_string(), "No element matching id `missing`");
    }
}
