//! The helper surface scenario code drives the app through.
//!
//! [`Robot`] wraps a [`UiDriver`] and is the standard access path for
//! test scenarios: every interaction and assertion goes through the
//! single-retry wrapper or one of the bounded polling loops, so scenario
//! code never deals with transient automation failures itself. Direct
//! driver use remains possible for one-off assertions, but is not the
//! norm.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use retap::driver::{MockDriver, Platform};
//! use retap::locator::Locator;
//! use retap::robot::{Robot, ScrollSearch};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> retap::error::RetapResult<()> {
//! let robot = Robot::new(Arc::new(MockDriver::new(Platform::Android)));
//!
//! robot.tap(&Locator::id("supportTab")).await?;
//! robot
//!     .scroll_until_visible(
//!         &Locator::text("Payment options"),
//!         &Locator::id("supportScrollView"),
//!         ScrollSearch::default(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, info_span, Instrument};

use crate::action::{ActionKind, ActionOutcome, ActionRecord};
use crate::driver::{DriverError, Platform, UiDriver};
use crate::element;
use crate::error::{RetapError, RetapResult};
use crate::locator::{Locator, ScrollDirection, ScrollEdge, SwipeSpeed};
use crate::poll::{poll_until, AttemptBudget};
use crate::retry::{probe, wait_secs, with_retry};
use crate::run::RunState;

/// Default bounded-wait window, in seconds.
pub const DEFAULT_WAIT_SECS: u64 = 7;

/// Default number of back taps for [`Robot::back_until_visible`].
pub const DEFAULT_BACK_TAPS: u32 = 3;

/// Identifier of the Android webview back control.
pub const ANDROID_WEBVIEW_BACK_ID: &str = "backWebView";

/// Identifier of the iOS webview back control.
pub const IOS_WEBVIEW_BACK_ID: &str = "BackButton";

/// Platform type of the iOS webview container.
const IOS_WEBVIEW_TYPE: &str = "WKWebView";

/// Platform type of the Android webview container.
const ANDROID_WEBVIEW_TYPE: &str = "WebView";

/// Platform type used for the iOS navigation-bar back button.
const BUTTON_TYPE: &str = "Button";

/// Ordinal of the iOS navigation-bar back button among button elements.
const IOS_BACK_BUTTON_INDEX: usize = 1;

/// Wait window for the Android webview back control to appear.
const ANDROID_WEBVIEW_WAIT_SECS: u64 = 20;

/// Directory for debug screen dumps.
const DUMP_DIR: &str = "temp";

/// Parameters for [`Robot::scroll_until_visible`].
///
/// One parameterised search covers both id and text targets. Defaults
/// match common list screens: scroll down, 400 px per gesture, at most
/// ten gestures, starting the gesture at (0.5, 0.8) of the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSearch {
    /// Direction to reveal new content in.
    pub direction: ScrollDirection,
    /// Gesture distance per attempt, in pixels.
    pub pixels: u32,
    /// Maximum number of scroll gestures before giving up.
    pub max_scrolls: u32,
    /// Normalised gesture start x within the container.
    pub start_x: f64,
    /// Normalised gesture start y within the container.
    pub start_y: f64,
}

impl Default for ScrollSearch {
    fn default() -> Self {
        Self {
            direction: ScrollDirection::Down,
            pixels: 400,
            max_scrolls: 10,
            start_x: 0.5,
            start_y: 0.8,
        }
    }
}

impl ScrollSearch {
    /// Search scrolling in the given direction, other fields default.
    pub fn direction(direction: ScrollDirection) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }

    /// Replace the per-gesture distance.
    pub fn with_pixels(mut self, pixels: u32) -> Self {
        self.pixels = pixels;
        self
    }

    /// Replace the scroll budget.
    pub fn with_max_scrolls(mut self, max_scrolls: u32) -> Self {
        self.max_scrolls = max_scrolls;
        self
    }

    /// Replace the normalised gesture start point.
    pub fn with_start(mut self, x: f64, y: f64) -> Self {
        self.start_x = x;
        self.start_y = y;
        self
    }
}

/// Flake-tolerant interaction helper over a [`UiDriver`].
///
/// All operations are `&self` and strictly sequential per device session:
/// the live UI tree is one shared mutable resource, so concurrent
/// mutation is never issued. The only concurrency offered is joining
/// independent read-only existence checks, with no atomicity guarantee
/// across the batch.
pub struct Robot {
    driver: Arc<dyn UiDriver>,
    state: Option<Arc<RunState>>,
}

impl Robot {
    /// New robot over any driver backend.
    pub fn new(driver: Arc<dyn UiDriver>) -> Self {
        Self {
            driver,
            state: None,
        }
    }

    /// Attach a run state; mutating operations will be recorded to it.
    pub fn with_state(mut self, state: Arc<RunState>) -> Self {
        self.state = Some(state);
        self
    }

    /// The platform of the underlying driver.
    pub fn platform(&self) -> Platform {
        self.driver.platform()
    }

    /// The underlying driver, for one-off direct assertions.
    pub fn driver(&self) -> &Arc<dyn UiDriver> {
        &self.driver
    }

    fn record<T>(&self, kind: ActionKind, result: &RetapResult<T>) {
        if let Some(state) = &self.state {
            let outcome = match result {
                Ok(_) => ActionOutcome::Success,
                Err(err) => ActionOutcome::Failure(err.to_string()),
            };
            state.record_action(ActionRecord::new(kind, outcome));
        }
    }

    // -----------------------------------------------------------------
    // Taps and input
    // -----------------------------------------------------------------

    /// Tap an element, retrying once on a transient failure.
    pub async fn tap(&self, locator: &Locator) -> RetapResult<()> {
        let result = with_retry(|| self.driver.tap(locator))
            .instrument(info_span!("tap", target = %locator))
            .await
            .map_err(RetapError::from);
        self.record(
            ActionKind::Tap {
                target: locator.to_string(),
            },
            &result,
        );
        result
    }

    /// Wait for the element to report itself enabled, then tap it.
    pub async fn tap_when_enabled(
        &self,
        locator: &Locator,
        budget: AttemptBudget,
    ) -> RetapResult<()> {
        let result = with_retry(|| async move {
            self.wait_enabled(locator, budget).await?;
            self.driver.tap(locator).await.map_err(RetapError::from)
        })
        .instrument(info_span!("tap_when_enabled", target = %locator))
        .await;
        self.record(
            ActionKind::Tap {
                target: locator.to_string(),
            },
            &result,
        );
        result
    }

    /// Tap at a point in the element's own coordinate space.
    pub async fn tap_at(&self, locator: &Locator, x: f64, y: f64) -> RetapResult<()> {
        let result = with_retry(|| self.driver.tap_at(locator, x, y))
            .await
            .map_err(RetapError::from);
        self.record(
            ActionKind::TapAt {
                target: locator.to_string(),
                x,
                y,
            },
            &result,
        );
        result
    }

    /// Type text into an element.
    pub async fn type_text(&self, locator: &Locator, text: &str) -> RetapResult<()> {
        let result = with_retry(|| self.driver.type_text(locator, text))
            .await
            .map_err(RetapError::from);
        self.record(
            ActionKind::TypeText {
                target: locator.to_string(),
                text: text.to_string(),
            },
            &result,
        );
        result
    }

    // -----------------------------------------------------------------
    // Assertions (retried once)
    // -----------------------------------------------------------------

    /// Assert the element is visible.
    pub async fn visible(&self, locator: &Locator) -> RetapResult<()> {
        with_retry(|| self.driver.assert_visible(locator))
            .await
            .map_err(RetapError::from)
    }

    /// Assert the element is absent or hidden.
    pub async fn not_visible(&self, locator: &Locator) -> RetapResult<()> {
        with_retry(|| self.driver.assert_not_visible(locator))
            .await
            .map_err(RetapError::from)
    }

    /// Assert the element exists in the hierarchy, visible or not.
    pub async fn exists(&self, locator: &Locator) -> RetapResult<()> {
        with_retry(|| self.driver.assert_exists(locator))
            .await
            .map_err(RetapError::from)
    }

    /// Assert no element matches the locator.
    pub async fn not_exists(&self, locator: &Locator) -> RetapResult<()> {
        with_retry(|| self.driver.assert_not_exists(locator))
            .await
            .map_err(RetapError::from)
    }

    /// Assert the element's visible text equals `expected`.
    pub async fn has_text(&self, locator: &Locator, expected: &str) -> RetapResult<()> {
        with_retry(|| self.driver.assert_text(locator, expected))
            .await
            .map_err(RetapError::from)
    }

    /// Existence probe: `true` if the element is visible, `false` on any
    /// failure. Never raises.
    pub async fn is_visible(&self, locator: &Locator) -> bool {
        probe(self.visible(locator)).await
    }

    /// Assert several texts all exist on screen, checked concurrently.
    ///
    /// The checks are read-only and independent; nothing is implied about
    /// their relative order and the batch is not atomic.
    pub async fn exist_by_texts(&self, texts: &[&str]) -> RetapResult<()> {
        let locators: Vec<Locator> = texts.iter().map(|t| Locator::text(*t)).collect();
        futures::future::try_join_all(locators.iter().map(|l| self.driver.assert_exists(l)))
            .await
            .map(|_| ())
            .map_err(RetapError::from)
    }

    /// Assert at least `count` elements share the identifier.
    ///
    /// Walks the indices 0..count, so failure messages name the first
    /// missing ordinal.
    pub async fn exists_at_least(&self, id: &str, count: usize) -> RetapResult<()> {
        with_retry(|| async move {
            for index in 0..count {
                self.driver
                    .assert_exists(&Locator::id(id).at_index(index as i32))
                    .await?;
            }
            Ok::<(), DriverError>(())
        })
        .await
        .map_err(RetapError::from)
    }

    // -----------------------------------------------------------------
    // Bounded waits
    // -----------------------------------------------------------------

    /// Wait for the element to become visible within the driver's native
    /// bounded wait.
    ///
    /// First choice for appearance waits: the backend's own
    /// synchronisation decides when to give up, within `secs` seconds.
    pub async fn wait_visible(&self, locator: &Locator, secs: u64) -> RetapResult<()> {
        self.driver
            .wait_visible(locator, Duration::from_secs(secs))
            .await
            .map_err(RetapError::from)
    }

    /// Wait for the element to become visible, then tap it.
    pub async fn wait_visible_and_tap(&self, locator: &Locator, secs: u64) -> RetapResult<()> {
        let result = with_retry(|| async move {
            self.driver
                .wait_visible(locator, Duration::from_secs(secs))
                .await?;
            wait_secs(1).await;
            self.driver.tap(locator).await
        })
        .instrument(info_span!("wait_visible_and_tap", target = %locator))
        .await
        .map_err(RetapError::from);
        self.record(
            ActionKind::Tap {
                target: locator.to_string(),
            },
            &result,
        );
        result
    }

    /// Wait for the element to disappear within the driver's native
    /// bounded wait.
    pub async fn wait_not_visible(&self, locator: &Locator, secs: u64) -> RetapResult<()> {
        with_retry(|| self.driver.wait_not_visible(locator, Duration::from_secs(secs)))
            .await
            .map_err(RetapError::from)
    }

    /// Poll the element's `enabled` attribute under an attempt budget.
    ///
    /// One attribute read per attempt, sleeping the budget's interval
    /// between attempts. Use before tapping controls that render before
    /// they accept input.
    pub async fn wait_enabled(&self, locator: &Locator, budget: AttemptBudget) -> RetapResult<()> {
        let interval = budget.interval;
        poll_until(
            budget.attempts,
            || async move {
                let attrs = self.driver.attributes(locator).await?;
                if attrs.enabled {
                    Ok(())
                } else {
                    Err(DriverError::AssertionFailed {
                        target: locator.to_string(),
                        condition: "enabled".to_string(),
                    })
                }
            },
            || async move {
                tokio::time::sleep(interval).await;
                Ok(())
            },
            |attempts| RetapError::DisabledBeyondBudget {
                target: locator.to_string(),
                attempts,
            },
        )
        .await
    }

    /// Poll visibility under an attempt budget.
    ///
    /// Fallback for screens where the driver's native wait misjudges
    /// readiness; prefer [`wait_visible`](Self::wait_visible).
    pub async fn wait_displayed(&self, locator: &Locator, budget: AttemptBudget) -> RetapResult<()> {
        let interval = budget.interval;
        poll_until(
            budget.attempts,
            || self.driver.assert_visible(locator),
            || async move {
                tokio::time::sleep(interval).await;
                Ok(())
            },
            |attempts| RetapError::WaitExhausted {
                target: locator.to_string(),
                attempts,
            },
        )
        .await
    }

    // -----------------------------------------------------------------
    // Scrolling and swiping
    // -----------------------------------------------------------------

    /// Scroll a container by a fixed distance.
    ///
    /// Waits for the container to be visible first, then gestures from
    /// the default start point.
    pub async fn scroll(
        &self,
        container: &Locator,
        direction: ScrollDirection,
        pixels: u32,
    ) -> RetapResult<()> {
        let result = with_retry(|| async move {
            self.driver
                .wait_visible(container, Duration::from_secs(DEFAULT_WAIT_SECS))
                .await?;
            self.driver
                .scroll(container, direction, pixels, 0.5, 0.8)
                .await
        })
        .await
        .map_err(RetapError::from);
        self.record(
            ActionKind::Scroll {
                container: container.to_string(),
                direction: direction.as_str().to_string(),
                pixels,
            },
            &result,
        );
        result
    }

    /// Scroll a container all the way to one edge.
    pub async fn scroll_to_edge(&self, container: &Locator, edge: ScrollEdge) -> RetapResult<()> {
        let result = with_retry(|| self.driver.scroll_to_edge(container, edge))
            .await
            .map_err(RetapError::from);
        self.record(
            ActionKind::ScrollToEdge {
                container: container.to_string(),
                edge: edge.as_str().to_string(),
            },
            &result,
        );
        result
    }

    /// Swipe on an element (carousels, dismissals).
    pub async fn swipe(
        &self,
        locator: &Locator,
        direction: ScrollDirection,
        speed: SwipeSpeed,
        coverage: Option<f64>,
    ) -> RetapResult<()> {
        let result = with_retry(|| self.driver.swipe(locator, direction, speed, coverage))
            .await
            .map_err(RetapError::from);
        self.record(
            ActionKind::Swipe {
                target: locator.to_string(),
                direction: direction.as_str().to_string(),
            },
            &result,
        );
        result
    }

    /// Scroll a container until the target becomes visible.
    ///
    /// The container is asserted visible once, then: check the target,
    /// and on failure scroll the container by `search.pixels`, up to
    /// `search.max_scrolls` gestures. A target that appears on attempt K
    /// has cost exactly K-1 gestures; a target that never appears costs
    /// exactly `max_scrolls` gestures and a
    /// [`ScrollExhausted`](RetapError::ScrollExhausted) error naming both
    /// the target and the container.
    pub async fn scroll_until_visible(
        &self,
        target: &Locator,
        container: &Locator,
        search: ScrollSearch,
    ) -> RetapResult<()> {
        let result = async {
            self.visible(container).await?;
            poll_until(
                search.max_scrolls + 1,
                || self.driver.assert_visible(target),
                || async move {
                    self.driver
                        .scroll(
                            container,
                            search.direction,
                            search.pixels,
                            search.start_x,
                            search.start_y,
                        )
                        .await
                        .map_err(RetapError::from)
                },
                |_| RetapError::ScrollExhausted {
                    target: target.to_string(),
                    container: container.to_string(),
                },
            )
            .await
        }
        .instrument(info_span!("scroll_until_visible", target = %target, container = %container))
        .await;
        self.record(
            ActionKind::ScrollSearch {
                target: target.to_string(),
                container: container.to_string(),
            },
            &result,
        );
        result
    }

    // -----------------------------------------------------------------
    // Back navigation
    // -----------------------------------------------------------------

    /// One system-level back: hardware back on Android, the Nth
    /// button-typed element on iOS (navigation bars expose no id there).
    pub async fn native_back(&self) -> RetapResult<()> {
        let platform = self.platform();
        let result = with_retry(|| async move {
            if platform.is_android() {
                self.driver.press_back().await
            } else {
                self.driver.tap_type(BUTTON_TYPE, IOS_BACK_BUTTON_INDEX).await
            }
        })
        .await
        .map_err(RetapError::from);
        self.record(
            ActionKind::Back {
                platform: platform.as_str().to_string(),
            },
            &result,
        );
        result
    }

    /// Tap the webview's own back control.
    ///
    /// The control only becomes hittable after the webview's own
    /// transition settles, hence the fixed lead-in pause.
    pub async fn web_back(&self) -> RetapResult<()> {
        let platform = self.platform();
        let id = if platform.is_android() {
            ANDROID_WEBVIEW_BACK_ID
        } else {
            IOS_WEBVIEW_BACK_ID
        };
        let result = with_retry(|| async move {
            wait_secs(3).await;
            let back = Locator::id(id);
            self.driver
                .wait_visible(&back, Duration::from_secs(DEFAULT_WAIT_SECS))
                .await?;
            self.driver.tap(&back.at_index(0)).await
        })
        .await
        .map_err(RetapError::from);
        self.record(
            ActionKind::Back {
                platform: platform.as_str().to_string(),
            },
            &result,
        );
        result
    }

    /// One logical back out of an embedded webview stack: the software
    /// back button by id on Android, the labelled tab on iOS.
    pub async fn back_to_tab(&self, back_label: &str) -> RetapResult<()> {
        let platform = self.platform();
        let result = with_retry(|| async move {
            if platform.is_android() {
                let back = Locator::id(ANDROID_WEBVIEW_BACK_ID);
                self.driver
                    .wait_visible(&back, Duration::from_secs(DEFAULT_WAIT_SECS))
                    .await?;
                wait_secs(1).await;
                self.driver.tap(&back).await
            } else {
                let tab = Locator::text(back_label);
                self.driver.wait_visible(&tab, Duration::from_secs(1)).await?;
                self.driver.tap(&tab.at_index(0)).await
            }
        })
        .await
        .map_err(RetapError::from);
        self.record(
            ActionKind::Back {
                platform: platform.as_str().to_string(),
            },
            &result,
        );
        result
    }

    /// Navigate back repeatedly until the target appears.
    ///
    /// For traversing nested webview stacks before reaching a native
    /// screen: wait for the target (native bounded wait), and while it is
    /// missing perform [`back_to_tab`](Self::back_to_tab), up to
    /// `max_back_taps` times. Fails with
    /// [`BackNavigationExhausted`](RetapError::BackNavigationExhausted).
    pub async fn back_until_visible(
        &self,
        target: &Locator,
        back_label: &str,
        max_back_taps: u32,
    ) -> RetapResult<()> {
        let result = poll_until(
            max_back_taps + 1,
            || self.driver.wait_visible(target, Duration::from_secs(DEFAULT_WAIT_SECS)),
            || self.back_to_tab(back_label),
            |_| RetapError::BackNavigationExhausted {
                target: target.to_string(),
                attempts: max_back_taps,
            },
        )
        .instrument(info_span!("back_until_visible", target = %target))
        .await;
        self.record(
            ActionKind::BackSearch {
                target: target.to_string(),
            },
            &result,
        );
        result
    }

    // -----------------------------------------------------------------
    // Webview detection
    // -----------------------------------------------------------------

    /// Assert a webview page is currently displayed.
    pub async fn webview_visible(&self) -> RetapResult<()> {
        let class = if self.platform().is_android() {
            ANDROID_WEBVIEW_TYPE
        } else {
            IOS_WEBVIEW_TYPE
        };
        self.driver
            .assert_type_visible(class)
            .await
            .map_err(RetapError::from)
    }

    /// Wait for a webview page to be displayed.
    ///
    /// Android backends cannot address the webview element itself, so its
    /// back control's id stands in for presence there.
    pub async fn wait_for_webview(&self, secs: u64) -> RetapResult<()> {
        if self.platform().is_android() {
            self.driver
                .wait_visible(
                    &Locator::id(ANDROID_WEBVIEW_BACK_ID),
                    Duration::from_secs(ANDROID_WEBVIEW_WAIT_SECS),
                )
                .await
                .map_err(RetapError::from)
        } else {
            self.driver
                .wait_type_visible(IOS_WEBVIEW_TYPE, Duration::from_secs(secs))
                .await
                .map_err(RetapError::from)
        }
    }

    // -----------------------------------------------------------------
    // Reads and debugging
    // -----------------------------------------------------------------

    /// Read the element's user-visible text: the `text` attribute on
    /// Android, the accessibility label on iOS.
    pub async fn text_of(&self, locator: &Locator) -> RetapResult<Option<String>> {
        let attrs = self.driver.attributes(locator).await?;
        Ok(if self.platform().is_android() {
            attrs.text
        } else {
            attrs.label
        })
    }

    /// Dump the addressable elements of the current screen as JSON under
    /// `./temp/<name>.json`. Debugging aid, not part of any assertion.
    pub async fn dump_screen(&self, name: &str) -> RetapResult<PathBuf> {
        self.dump_screen_to(Path::new(DUMP_DIR), name).await
    }

    /// Dump the addressable elements of the current screen as JSON into
    /// an explicit directory.
    pub async fn dump_screen_to(&self, dir: &Path, name: &str) -> RetapResult<PathBuf> {
        let tree = self.driver.dump_tree().await?;
        let flat = element::flatten(&tree);
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{name}.json"));
        let file = std::fs::File::create(&path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), &flat)?;
        info!(path = %path.display(), elements = flat.len(), "screen dump saved");
        Ok(path)
    }
}
