//! Serialisable records of helper operations.
//!
//! Every mutating operation the [`Robot`](crate::robot::Robot) performs
//! can be logged to the active [`RunState`](crate::run::RunState) as an
//! [`ActionRecord`]: what was done, to which target, and how it ended.
//! Records are plain data; they serialise to JSON Lines for the run log
//! and carry a `type` tag discriminator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The outcome of one helper operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    /// The operation completed (possibly after its internal retry).
    Success,

    /// The operation failed with the given error message.
    Failure(String),
}

impl ActionOutcome {
    /// True for [`ActionOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Success)
    }
}

/// The kinds of operations worth recording.
///
/// Targets and containers are rendered locator descriptions, not
/// structured locators; the log is for humans reading a failed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActionKind {
    /// Tap an element.
    Tap {
        /// Description of the tapped locator.
        target: String,
    },

    /// Tap at a point within an element.
    TapAt {
        /// Description of the tapped locator.
        target: String,
        /// X offset in the element's coordinate space.
        x: f64,
        /// Y offset in the element's coordinate space.
        y: f64,
    },

    /// Type text into an element.
    TypeText {
        /// Description of the target locator.
        target: String,
        /// The text that was typed.
        text: String,
    },

    /// Scroll a container by a fixed distance.
    Scroll {
        /// Description of the container locator.
        container: String,
        /// Scroll direction.
        direction: String,
        /// Gesture distance in pixels.
        pixels: u32,
    },

    /// Scroll a container to one of its edges.
    ScrollToEdge {
        /// Description of the container locator.
        container: String,
        /// The edge scrolled to.
        edge: String,
    },

    /// Scroll a container until a target becomes visible.
    ScrollSearch {
        /// Description of the searched-for locator.
        target: String,
        /// Description of the container locator.
        container: String,
    },

    /// Swipe on an element.
    Swipe {
        /// Description of the swiped locator.
        target: String,
        /// Swipe direction.
        direction: String,
    },

    /// A back-navigation tap (system back, webview back, or labelled tab).
    Back {
        /// The platform the back action was selected for.
        platform: String,
    },

    /// Repeated back-navigation until a target appeared.
    BackSearch {
        /// Description of the searched-for locator.
        target: String,
    },
}

impl ActionKind {
    /// Short, static name for this action kind, for tracing span metadata.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Tap { .. } => "tap",
            ActionKind::TapAt { .. } => "tap_at",
            ActionKind::TypeText { .. } => "type_text",
            ActionKind::Scroll { .. } => "scroll",
            ActionKind::ScrollToEdge { .. } => "scroll_to_edge",
            ActionKind::ScrollSearch { .. } => "scroll_search",
            ActionKind::Swipe { .. } => "swipe",
            ActionKind::Back { .. } => "back",
            ActionKind::BackSearch { .. } => "back_search",
        }
    }
}

/// A logged operation with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Unique identifier for this record.
    pub id: Uuid,

    /// When the operation finished.
    pub timestamp: DateTime<Utc>,

    /// The operation that was performed.
    pub action: ActionKind,

    /// How it ended.
    pub outcome: ActionOutcome,
}

impl ActionRecord {
    /// New record stamped with a fresh id and the current time.
    pub fn new(action: ActionKind, outcome: ActionOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        let kind = ActionKind::Tap {
            target: "id `login-button`".to_string(),
        };
        assert_eq!(kind.name(), "tap");

        let kind = ActionKind::ScrollSearch {
            target: "text `Payment options`".to_string(),
            container: "id `supportScrollView`".to_string(),
        };
        assert_eq!(kind.name(), "scroll_search");
    }

    #[test]
    fn test_record_serialises_with_type_tag() {
        let record = ActionRecord::new(
            ActionKind::Scroll {
                container: "id `list`".to_string(),
                direction: "down".to_string(),
                pixels: 400,
            },
            ActionOutcome::Success,
        );
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""type":"Scroll""#));
        assert!(json.contains(r#""pixels":400"#));

        let back: ActionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, record.id);
        assert!(back.outcome.is_success());
    }

    #[test]
    fn test_failure_outcome_carries_message() {
        let outcome = ActionOutcome::Failure("No element matching id `x`".to_string());
        assert!(!outcome.is_success());
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("No element matching"));
    }
}
