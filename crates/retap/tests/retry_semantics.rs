//! Integration tests for the single-retry and bounded-polling semantics,
//! exercised through the full Robot -> MockDriver stack.
//!
//! Time-sensitive tests run with a paused tokio clock, so the fixed
//! delays between attempts are observed without wall-clock sleeps.

mod common;

use std::time::Duration;

use common::{robot_on, support_screen};

use retap::driver::{Platform, UiDriver};
use retap::error::RetapError;
use retap::locator::Locator;
use retap::poll::AttemptBudget;
use retap::retry::{probe, with_retry, RETRY_DELAY};

// ---------------------------------------------------------------------------
// 1. Single retry: fail once, succeed on the second attempt
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_single_retry_absorbs_one_transient_failure() {
    let (robot, driver) = robot_on(Platform::Android, support_screen());
    driver.fail_n("tap:id `supportTab`", 1);

    let start = tokio::time::Instant::now();
    robot.tap(&Locator::id("supportTab")).await.unwrap();

    // Exactly two underlying invocations, separated by the fixed delay.
    assert_eq!(driver.call_count("tap:id `supportTab`"), 2);
    assert!(start.elapsed() >= RETRY_DELAY);
}

// ---------------------------------------------------------------------------
// 2. Single retry: the second failure propagates unmodified
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_single_retry_propagates_second_failure() {
    let (robot, driver) = robot_on(Platform::Android, support_screen());
    driver.fail_n("tap:id `supportTab`", 2);

    let err = robot.tap(&Locator::id("supportTab")).await.unwrap_err();
    assert_eq!(driver.call_count("tap:id `supportTab`"), 2);
    // The driver's own error text reaches the caller untouched.
    assert!(err.to_string().contains("scripted failure"));
}

// ---------------------------------------------------------------------------
// 3. Bounded polling: budget of N performs exactly N failed attempts
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_wait_displayed_spends_exactly_its_budget() {
    let (robot, driver) = robot_on(Platform::Android, support_screen());

    let err = robot
        .wait_displayed(&Locator::id("missingPanel"), AttemptBudget::default())
        .await
        .unwrap_err();

    assert_eq!(driver.call_count("assert_visible:id `missingPanel`"), 7);
    match err {
        RetapError::WaitExhausted { target, attempts } => {
            assert_eq!(target, "id `missingPanel`");
            assert_eq!(attempts, 7);
        }
        other => panic!("Expected WaitExhausted, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// 4. Bounded polling: the sleep recovery paces attempts at the interval
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_wait_displayed_paces_attempts() {
    let (robot, _driver) = robot_on(Platform::Android, support_screen());

    let start = tokio::time::Instant::now();
    robot
        .wait_displayed(&Locator::id("missingPanel"), AttemptBudget::attempts(3))
        .await
        .unwrap_err();

    // Three checks, two one-second recoveries between them.
    assert_eq!(start.elapsed(), Duration::from_secs(2));
}

// ---------------------------------------------------------------------------
// 5. Enabled-state polling: resolves once the attribute read succeeds
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_wait_enabled_recovers_within_budget() {
    let (robot, driver) = robot_on(
        Platform::Android,
        vec![retap::element::UiElement::with_id("payButton").typed("Button")],
    );
    // Two attribute reads fail before the element reports itself.
    driver.fail_n("attributes:id `payButton`", 2);

    robot
        .wait_enabled(&Locator::id("payButton"), AttemptBudget::default())
        .await
        .unwrap();
    assert_eq!(driver.call_count("attributes:id `payButton`"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_wait_enabled_exhaustion_names_target() {
    let (robot, _driver) = robot_on(
        Platform::Android,
        vec![retap::element::UiElement::with_id("payButton").disabled()],
    );

    let err = robot
        .wait_enabled(&Locator::id("payButton"), AttemptBudget::attempts(4))
        .await
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("id `payButton`"));
    assert!(msg.contains("still disabled after 4 attempts"));
}

// ---------------------------------------------------------------------------
// 6. Boolean wrapper: failures become `false`, never errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_probe_converts_outcomes_to_bool() {
    let (robot, _driver) = robot_on(Platform::Android, support_screen());

    assert!(robot.is_visible(&Locator::id("supportTab")).await);
    assert!(!robot.is_visible(&Locator::id("closeBanner")).await);

    // probe() composes with any helper operation.
    assert!(probe(robot.has_text(&Locator::id("supportTab"), "Support")).await);
    assert!(!probe(robot.exists_at_least("card", 5)).await);
}

// ---------------------------------------------------------------------------
// 7. with_retry is usable standalone for ad hoc driver calls
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_with_retry_over_direct_driver_call() {
    let (robot, driver) = robot_on(Platform::Ios, support_screen());
    driver.fail_n("assert_text:id `supportTab`:Support", 1);

    let locator = Locator::id("supportTab");
    with_retry(|| robot.driver().assert_text(&locator, "Support"))
        .await
        .unwrap();
    assert_eq!(driver.call_count("assert_text:"), 2);
}

// ---------------------------------------------------------------------------
// 8. Index disambiguation through the full stack
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_indexed_locators_resolve_in_document_order() {
    let (robot, _driver) = robot_on(Platform::Android, support_screen());

    // Two elements share the `card` id; text distinguishes them.
    let first = robot.text_of(&Locator::id("card")).await.unwrap();
    assert_eq!(first.as_deref(), Some("Manage accounts & IDs"));

    let also_first = robot.text_of(&Locator::id("card").at_index(0)).await.unwrap();
    assert_eq!(also_first.as_deref(), Some("Manage accounts & IDs"));

    let second = robot.text_of(&Locator::id("card").at_index(1)).await.unwrap();
    assert_eq!(second.as_deref(), Some("Payment options"));

    // Out-of-range index is a plain not-found driver error.
    assert!(robot.text_of(&Locator::id("card").at_index(9)).await.is_err());
}
