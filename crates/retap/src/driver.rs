//! Backend-agnostic driver trait for mobile UI automation.
//!
//! This module defines the [`UiDriver`] trait, the capability set the
//! helper layer consumes: locator-based taps and assertions, bounded
//! native waits, attribute reads, scroll/swipe gestures, and a full
//! accessibility-tree dump. Implementations wrap a concrete automation
//! backend (a device-farm agent, a simulator bridge); the helper layer
//! never talks to a backend directly.
//!
//! The trait ships default implementations for the query methods, built
//! on [`dump_tree`](UiDriver::dump_tree) and the pure resolution functions
//! in [`element`](crate::element). Backends with server-side search can
//! override them for fewer round-trips.
//!
//! All driver calls are async, may fail, and are assumed idempotent to
//! retry; that assumption is what makes the retry/polling layer sound.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::element::{self, ElementAttributes, UiElement};
use crate::locator::{Locator, ScrollDirection, ScrollEdge, SwipeSpeed};

/// Polling interval used by the default bounded-wait implementations.
const NATIVE_WAIT_POLL: Duration = Duration::from_millis(250);

/// The mobile platform a driver is talking to.
///
/// Used to select platform-specific locators and recovery actions (e.g.
/// the hardware back button exists only on Android).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Apple iOS (device or simulator).
    Ios,
    /// Android (device or emulator).
    Android,
}

impl Platform {
    /// True when the driver targets Android.
    pub fn is_android(&self) -> bool {
        matches!(self, Platform::Android)
    }

    /// Short name, for log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during driver operations.
///
/// This enum unifies errors from all backends behind a single type so the
/// retry and polling layers can treat every failure as potentially
/// transient.
#[derive(Error, Debug)]
pub enum DriverError {
    /// A gesture or command failed with the given message.
    #[error("Action failed: {0}")]
    ActionFailed(String),

    /// No element matched the locator.
    #[error("No element matching {target}")]
    NotFound {
        /// Description of the locator that failed to resolve.
        target: String,
    },

    /// The element was found but an asserted condition did not hold.
    #[error("Assertion failed for {target}: expected {condition}")]
    AssertionFailed {
        /// Description of the locator.
        target: String,
        /// The condition that was expected to hold.
        condition: String,
    },

    /// A bounded native wait elapsed without the condition becoming true.
    #[error("Timed out after {ms}ms waiting for {target}")]
    Timeout {
        /// Description of what was waited for.
        target: String,
        /// The wait budget in milliseconds.
        ms: u64,
    },

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse JSON data from the backend.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for backend-agnostic mobile UI automation.
///
/// Implementors provide the core capabilities (tapping, typing, gestures,
/// hierarchy inspection) using their specific backend. Query methods have
/// default implementations that fetch the tree via
/// [`dump_tree`](Self::dump_tree) and resolve locally.
///
/// # Required Methods
///
/// Implementors must provide: [`platform`](Self::platform),
/// [`tap`](Self::tap), [`tap_at`](Self::tap_at),
/// [`tap_type`](Self::tap_type), [`type_text`](Self::type_text),
/// [`scroll`](Self::scroll), [`scroll_to_edge`](Self::scroll_to_edge),
/// [`swipe`](Self::swipe), and [`dump_tree`](Self::dump_tree).
#[async_trait]
pub trait UiDriver: Send + Sync {
    /// The platform this driver is connected to.
    fn platform(&self) -> Platform;

    /// Tap the element addressed by the locator.
    async fn tap(&self, locator: &Locator) -> Result<(), DriverError>;

    /// Tap at a point expressed in the element's own coordinate space.
    async fn tap_at(&self, locator: &Locator, x: f64, y: f64) -> Result<(), DriverError>;

    /// Tap the Nth element of the given platform type.
    ///
    /// Used where neither an identifier nor a text is available, e.g. the
    /// iOS navigation-bar back button.
    async fn tap_type(&self, element_type: &str, index: usize) -> Result<(), DriverError>;

    /// Type text into the element addressed by the locator.
    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), DriverError>;

    /// Press the hardware/software system back control.
    ///
    /// Android only. The default implementation fails; iOS back
    /// navigation goes through labelled or type-based taps instead.
    async fn press_back(&self) -> Result<(), DriverError> {
        Err(DriverError::ActionFailed(
            "system back is not supported by this backend".to_string(),
        ))
    }

    /// Assert the element is rendered on screen.
    async fn assert_visible(&self, locator: &Locator) -> Result<(), DriverError> {
        let tree = self.dump_tree().await?;
        match element::resolve(&tree, locator) {
            Some(e) if e.visible => Ok(()),
            Some(_) => Err(DriverError::AssertionFailed {
                target: locator.to_string(),
                condition: "visible".to_string(),
            }),
            None => Err(DriverError::NotFound {
                target: locator.to_string(),
            }),
        }
    }

    /// Assert the element is absent or not rendered.
    async fn assert_not_visible(&self, locator: &Locator) -> Result<(), DriverError> {
        let tree = self.dump_tree().await?;
        match element::resolve(&tree, locator) {
            Some(e) if e.visible => Err(DriverError::AssertionFailed {
                target: locator.to_string(),
                condition: "not visible".to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Assert the element exists in the hierarchy (visible or not).
    async fn assert_exists(&self, locator: &Locator) -> Result<(), DriverError> {
        let tree = self.dump_tree().await?;
        element::resolve(&tree, locator)
            .map(|_| ())
            .ok_or_else(|| DriverError::NotFound {
                target: locator.to_string(),
            })
    }

    /// Assert no element matches the locator.
    async fn assert_not_exists(&self, locator: &Locator) -> Result<(), DriverError> {
        let tree = self.dump_tree().await?;
        match element::resolve(&tree, locator) {
            Some(_) => Err(DriverError::AssertionFailed {
                target: locator.to_string(),
                condition: "absent".to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Assert the element's visible text equals `expected`.
    async fn assert_text(&self, locator: &Locator, expected: &str) -> Result<(), DriverError> {
        let attrs = self.attributes(locator).await?;
        let actual = attrs.text.as_deref().or(attrs.label.as_deref());
        if actual == Some(expected) {
            Ok(())
        } else {
            Err(DriverError::AssertionFailed {
                target: locator.to_string(),
                condition: format!("text `{expected}`, got {actual:?}"),
            })
        }
    }

    /// Assert some element of the given platform type is visible.
    async fn assert_type_visible(&self, element_type: &str) -> Result<(), DriverError> {
        let tree = self.dump_tree().await?;
        if element::find_by_type(&tree, element_type)
            .iter()
            .any(|e| e.visible)
        {
            Ok(())
        } else {
            Err(DriverError::NotFound {
                target: format!("type `{element_type}`"),
            })
        }
    }

    /// Read the element's attributes.
    async fn attributes(&self, locator: &Locator) -> Result<ElementAttributes, DriverError> {
        let tree = self.dump_tree().await?;
        element::resolve(&tree, locator)
            .map(|e| ElementAttributes::from(&e))
            .ok_or_else(|| DriverError::NotFound {
                target: locator.to_string(),
            })
    }

    /// Bounded native wait for the element to become visible.
    ///
    /// This is the driver's own per-call timeout, independent of the
    /// attempt-budget loops the helper layer runs on top of it.
    async fn wait_visible(&self, locator: &Locator, timeout: Duration) -> Result<(), DriverError> {
        let start = tokio::time::Instant::now();
        loop {
            if self.assert_visible(locator).await.is_ok() {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(DriverError::Timeout {
                    target: locator.to_string(),
                    ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(NATIVE_WAIT_POLL).await;
        }
    }

    /// Bounded native wait for the element to disappear.
    async fn wait_not_visible(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let start = tokio::time::Instant::now();
        loop {
            if self.assert_not_visible(locator).await.is_ok() {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(DriverError::Timeout {
                    target: locator.to_string(),
                    ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(NATIVE_WAIT_POLL).await;
        }
    }

    /// Bounded native wait for an element of the given type to be visible.
    async fn wait_type_visible(
        &self,
        element_type: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let start = tokio::time::Instant::now();
        loop {
            if self.assert_type_visible(element_type).await.is_ok() {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(DriverError::Timeout {
                    target: format!("type `{element_type}`"),
                    ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(NATIVE_WAIT_POLL).await;
        }
    }

    /// Scroll a container by a fixed number of pixels.
    ///
    /// # Arguments
    ///
    /// * `container` - The scrollable container to gesture on
    /// * `direction` - Which way to reveal new content
    /// * `pixels` - Gesture distance in pixels
    /// * `start_x`, `start_y` - Normalised gesture start point within the
    ///   container (0.0..=1.0)
    async fn scroll(
        &self,
        container: &Locator,
        direction: ScrollDirection,
        pixels: u32,
        start_x: f64,
        start_y: f64,
    ) -> Result<(), DriverError>;

    /// Scroll a container all the way to one edge.
    async fn scroll_to_edge(
        &self,
        container: &Locator,
        edge: ScrollEdge,
    ) -> Result<(), DriverError>;

    /// Swipe on an element.
    ///
    /// `coverage` is the fraction of the element the gesture should
    /// traverse (backend default when `None`).
    async fn swipe(
        &self,
        locator: &Locator,
        direction: ScrollDirection,
        speed: SwipeSpeed,
        coverage: Option<f64>,
    ) -> Result<(), DriverError>;

    /// Dump the full accessibility hierarchy for the current screen.
    async fn dump_tree(&self) -> Result<Vec<UiElement>, DriverError>;
}

/// Scriptable in-memory driver for tests and development.
///
/// Holds a static accessibility tree, records every call it receives, and
/// can be told to fail an operation a fixed number of times before letting
/// it resolve against the tree, which is exactly the failure shape the
/// retry and polling layers exist to absorb.
///
/// # Example
///
/// ```
/// use retap::driver::{MockDriver, Platform, UiDriver};
/// use retap::element::UiElement;
/// use retap::locator::Locator;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let driver = MockDriver::new(Platform::Android);
/// driver.set_tree(vec![UiElement::with_id("login-button")]);
/// driver.fail_n("assert_visible:id `login-button`", 1);
///
/// // First check fails (scripted), second resolves against the tree.
/// assert!(driver.assert_visible(&Locator::id("login-button")).await.is_err());
/// assert!(driver.assert_visible(&Locator::id("login-button")).await.is_ok());
/// assert_eq!(driver.call_count("assert_visible:"), 2);
/// # }
/// ```
#[derive(Debug)]
pub struct MockDriver {
    platform: Platform,
    tree: Mutex<Vec<UiElement>>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, u32>>,
}

impl MockDriver {
    /// New mock with an empty tree.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            tree: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the accessibility tree.
    pub fn set_tree(&self, tree: Vec<UiElement>) {
        *self.tree.lock().unwrap() = tree;
    }

    /// Script the next `n` invocations of the keyed operation to fail.
    ///
    /// Keys are the same strings the mock records in its call log; see
    /// [`calls`](Self::calls) and the example above.
    pub fn fail_n(&self, key: impl Into<String>, n: u32) {
        self.failures.lock().unwrap().insert(key.into(), n);
    }

    /// Every call recorded so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// True if any recorded call starts with the prefix.
    pub fn was_called(&self, prefix: &str) -> bool {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.starts_with(prefix))
    }

    /// Number of recorded calls starting with the prefix.
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Record a call and report whether it is scripted to fail.
    fn enter(&self, call: String) -> bool {
        self.calls.lock().unwrap().push(call.clone());
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(&call) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn scripted(&self, call: String) -> Result<(), DriverError> {
        if self.enter(call.clone()) {
            Err(DriverError::ActionFailed(format!("scripted failure: {call}")))
        } else {
            Ok(())
        }
    }

    fn snapshot(&self) -> Vec<UiElement> {
        self.tree.lock().unwrap().clone()
    }
}

#[async_trait]
impl UiDriver for MockDriver {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn tap(&self, locator: &Locator) -> Result<(), DriverError> {
        self.scripted(format!("tap:{locator}"))?;
        element::resolve(&self.snapshot(), locator)
            .map(|_| ())
            .ok_or_else(|| DriverError::NotFound {
                target: locator.to_string(),
            })
    }

    async fn tap_at(&self, locator: &Locator, x: f64, y: f64) -> Result<(), DriverError> {
        self.scripted(format!("tap_at:{locator}:{x}:{y}"))?;
        element::resolve(&self.snapshot(), locator)
            .map(|_| ())
            .ok_or_else(|| DriverError::NotFound {
                target: locator.to_string(),
            })
    }

    async fn tap_type(&self, element_type: &str, index: usize) -> Result<(), DriverError> {
        self.scripted(format!("tap_type:{element_type}:{index}"))?;
        element::find_by_type(&self.snapshot(), element_type)
            .into_iter()
            .nth(index)
            .map(|_| ())
            .ok_or_else(|| DriverError::NotFound {
                target: format!("type `{element_type}`[{index}]"),
            })
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), DriverError> {
        self.scripted(format!("type_text:{locator}:{text}"))?;
        element::resolve(&self.snapshot(), locator)
            .map(|_| ())
            .ok_or_else(|| DriverError::NotFound {
                target: locator.to_string(),
            })
    }

    async fn press_back(&self) -> Result<(), DriverError> {
        self.scripted("press_back".to_string())?;
        if self.platform.is_android() {
            Ok(())
        } else {
            Err(DriverError::ActionFailed(
                "system back is not supported by this backend".to_string(),
            ))
        }
    }

    async fn assert_visible(&self, locator: &Locator) -> Result<(), DriverError> {
        self.scripted(format!("assert_visible:{locator}"))?;
        match element::resolve(&self.snapshot(), locator) {
            Some(e) if e.visible => Ok(()),
            Some(_) => Err(DriverError::AssertionFailed {
                target: locator.to_string(),
                condition: "visible".to_string(),
            }),
            None => Err(DriverError::NotFound {
                target: locator.to_string(),
            }),
        }
    }

    async fn assert_not_visible(&self, locator: &Locator) -> Result<(), DriverError> {
        self.scripted(format!("assert_not_visible:{locator}"))?;
        match element::resolve(&self.snapshot(), locator) {
            Some(e) if e.visible => Err(DriverError::AssertionFailed {
                target: locator.to_string(),
                condition: "not visible".to_string(),
            }),
            _ => Ok(()),
        }
    }

    async fn assert_exists(&self, locator: &Locator) -> Result<(), DriverError> {
        self.scripted(format!("assert_exists:{locator}"))?;
        element::resolve(&self.snapshot(), locator)
            .map(|_| ())
            .ok_or_else(|| DriverError::NotFound {
                target: locator.to_string(),
            })
    }

    async fn assert_not_exists(&self, locator: &Locator) -> Result<(), DriverError> {
        self.scripted(format!("assert_not_exists:{locator}"))?;
        match element::resolve(&self.snapshot(), locator) {
            Some(_) => Err(DriverError::AssertionFailed {
                target: locator.to_string(),
                condition: "absent".to_string(),
            }),
            None => Ok(()),
        }
    }

    async fn assert_text(&self, locator: &Locator, expected: &str) -> Result<(), DriverError> {
        self.scripted(format!("assert_text:{locator}:{expected}"))?;
        let attrs = self.attributes_unrecorded(locator)?;
        let actual = attrs.text.as_deref().or(attrs.label.as_deref());
        if actual == Some(expected) {
            Ok(())
        } else {
            Err(DriverError::AssertionFailed {
                target: locator.to_string(),
                condition: format!("text `{expected}`, got {actual:?}"),
            })
        }
    }

    async fn assert_type_visible(&self, element_type: &str) -> Result<(), DriverError> {
        self.scripted(format!("assert_type_visible:{element_type}"))?;
        if element::find_by_type(&self.snapshot(), element_type)
            .iter()
            .any(|e| e.visible)
        {
            Ok(())
        } else {
            Err(DriverError::NotFound {
                target: format!("type `{element_type}`"),
            })
        }
    }

    async fn attributes(&self, locator: &Locator) -> Result<ElementAttributes, DriverError> {
        self.scripted(format!("attributes:{locator}"))?;
        self.attributes_unrecorded(locator)
    }

    // Each bounded wait consumes at most one scripted failure: a scripted
    // entry models one full native timeout elapsing, not one poll tick.
    async fn wait_visible(&self, locator: &Locator, timeout: Duration) -> Result<(), DriverError> {
        if self.enter(format!("wait_visible:{locator}")) {
            return Err(DriverError::Timeout {
                target: locator.to_string(),
                ms: timeout.as_millis() as u64,
            });
        }
        match element::resolve(&self.snapshot(), locator) {
            Some(e) if e.visible => Ok(()),
            _ => Err(DriverError::Timeout {
                target: locator.to_string(),
                ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn wait_not_visible(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        if self.enter(format!("wait_not_visible:{locator}")) {
            return Err(DriverError::Timeout {
                target: locator.to_string(),
                ms: timeout.as_millis() as u64,
            });
        }
        match element::resolve(&self.snapshot(), locator) {
            Some(e) if e.visible => Err(DriverError::Timeout {
                target: locator.to_string(),
                ms: timeout.as_millis() as u64,
            }),
            _ => Ok(()),
        }
    }

    async fn wait_type_visible(
        &self,
        element_type: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        if self.enter(format!("wait_type_visible:{element_type}")) {
            return Err(DriverError::Timeout {
                target: format!("type `{element_type}`"),
                ms: timeout.as_millis() as u64,
            });
        }
        if element::find_by_type(&self.snapshot(), element_type)
            .iter()
            .any(|e| e.visible)
        {
            Ok(())
        } else {
            Err(DriverError::Timeout {
                target: format!("type `{element_type}`"),
                ms: timeout.as_millis() as u64,
            })
        }
    }

    async fn scroll(
        &self,
        container: &Locator,
        direction: ScrollDirection,
        pixels: u32,
        _start_x: f64,
        _start_y: f64,
    ) -> Result<(), DriverError> {
        self.scripted(format!("scroll:{container}:{direction}:{pixels}"))?;
        element::resolve(&self.snapshot(), container)
            .map(|_| ())
            .ok_or_else(|| DriverError::NotFound {
                target: container.to_string(),
            })
    }

    async fn scroll_to_edge(
        &self,
        container: &Locator,
        edge: ScrollEdge,
    ) -> Result<(), DriverError> {
        self.scripted(format!("scroll_to_edge:{container}:{edge}"))?;
        element::resolve(&self.snapshot(), container)
            .map(|_| ())
            .ok_or_else(|| DriverError::NotFound {
                target: container.to_string(),
            })
    }

    async fn swipe(
        &self,
        locator: &Locator,
        direction: ScrollDirection,
        speed: SwipeSpeed,
        _coverage: Option<f64>,
    ) -> Result<(), DriverError> {
        self.scripted(format!("swipe:{locator}:{direction}:{}", speed.as_str()))?;
        element::resolve(&self.snapshot(), locator)
            .map(|_| ())
            .ok_or_else(|| DriverError::NotFound {
                target: locator.to_string(),
            })
    }

    async fn dump_tree(&self) -> Result<Vec<UiElement>, DriverError> {
        self.calls.lock().unwrap().push("dump_tree".to_string());
        Ok(self.snapshot())
    }
}

impl MockDriver {
    fn attributes_unrecorded(&self, locator: &Locator) -> Result<ElementAttributes, DriverError> {
        element::resolve(&self.snapshot(), locator)
            .map(|e| ElementAttributes::from(&e))
            .ok_or_else(|| DriverError::NotFound {
                target: locator.to_string(),
            })
    }
}
