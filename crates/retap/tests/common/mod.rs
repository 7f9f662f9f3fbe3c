//! Shared fixtures for retap integration tests.
//!
//! Provides canned accessibility trees modelled on a support/billing
//! screen, plus builders wiring a [`Robot`] to a scriptable
//! [`MockDriver`].

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use retap::driver::{MockDriver, Platform};
use retap::element::UiElement;
use retap::robot::Robot;
use retap::run::RunState;

/// Install a fmt subscriber once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A support-tab screen: a tab bar, a scroll view with a few cards, and
/// the webview back controls both platforms use.
pub fn support_screen() -> Vec<UiElement> {
    vec![UiElement::with_id("root")
        .child(
            UiElement::with_id("tabBar")
                .child(UiElement::with_id("homeTab").text("Home").label("Home"))
                .child(
                    UiElement::with_id("supportTab")
                        .text("Support")
                        .label("Support"),
                )
                .child(
                    UiElement::with_id("accountTab")
                        .text("Account")
                        .label("Account"),
                ),
        )
        .child(
            UiElement::with_id("supportScrollView")
                .typed("ScrollView")
                .child(
                    UiElement::with_id("PanelContainer-billing")
                        .text("BILLING SOLUTIONS")
                        .label("BILLING SOLUTIONS"),
                )
                .child(
                    UiElement::with_id("card")
                        .text("Manage accounts & IDs")
                        .label("Manage accounts & IDs"),
                )
                .child(
                    UiElement::with_id("card")
                        .text("Payment options")
                        .label("Payment options"),
                ),
        )]
}

/// The support screen plus the Android webview back control.
pub fn support_screen_with_web_back() -> Vec<UiElement> {
    let mut tree = support_screen();
    tree.push(UiElement::with_id("backWebView").typed("ImageButton"));
    tree
}

/// An iOS navigation bar exposing only button-typed elements.
pub fn ios_nav_bar() -> Vec<UiElement> {
    vec![UiElement::with_id("navBar")
        .child(UiElement::with_label("Share").typed("Button"))
        .child(UiElement::with_label("Back").typed("Button"))
        .child(UiElement::with_id("BackButton").typed("Button"))]
}

/// Robot over a fresh mock driver holding `tree`.
pub fn robot_on(platform: Platform, tree: Vec<UiElement>) -> (Robot, Arc<MockDriver>) {
    init_tracing();
    let driver = Arc::new(MockDriver::new(platform));
    driver.set_tree(tree);
    (Robot::new(driver.clone()), driver)
}

/// Robot with an attached run state logging into a unique temp directory.
pub fn robot_with_state(
    platform: Platform,
    tree: Vec<UiElement>,
) -> (Robot, Arc<MockDriver>, Arc<RunState>) {
    init_tracing();
    let driver = Arc::new(MockDriver::new(platform));
    driver.set_tree(tree);
    let state = Arc::new(RunState::new_with_log_dir(unique_temp_dir("retap_state")));
    let robot = Robot::new(driver.clone()).with_state(state.clone());
    (robot, driver, state)
}

/// Unique temp directory for test isolation.
pub fn unique_temp_dir(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{prefix}_{}", uuid::Uuid::new_v4()))
}
