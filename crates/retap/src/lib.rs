//! # retap
//!
//! Flake-tolerant interaction helpers for mobile UI automation.
//!
//! Device-automation backends are asynchronous and timing-sensitive: taps
//! land during animations, elements render before they accept input,
//! content sits below the fold. This crate wraps any such backend behind
//! a driver trait and layers the two control patterns that make E2E
//! scenarios survive that flakiness:
//!
//! - **single retry**: every interaction gets one second chance after a
//!   fixed pause ([`retry`])
//! - **bounded polling**: "wait for X" loops with an attempt budget and a
//!   recovery action between attempts (a sleep, a scroll, a back tap)
//!   ([`poll`], [`robot`])
//!
//! ## Modules
//!
//! - [`locator`] - Typed element locators (by id / by text, indexed, ancestor-scoped)
//! - [`element`] - Accessibility-tree model and pure locator resolution
//! - [`driver`] - The [`UiDriver`](driver::UiDriver) backend trait and a scriptable mock
//! - [`error`] - Helper-layer error taxonomy
//! - [`retry`] - Single-retry wrapper and the boolean probe adapter
//! - [`poll`] - Attempt budgets and the bounded polling engine
//! - [`robot`] - The [`Robot`](robot::Robot) helper surface scenarios drive the app through
//! - [`action`] - Serialisable records of performed operations
//! - [`run`] - Per-spec-file run state: skip-after-failure policy and the action log
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use retap::driver::{MockDriver, Platform};
//! use retap::locator::Locator;
//! use retap::poll::AttemptBudget;
//! use retap::robot::{Robot, ScrollSearch};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> retap::error::RetapResult<()> {
//!     let robot = Robot::new(Arc::new(MockDriver::new(Platform::Android)));
//!
//!     robot.wait_visible(&Locator::id("supportTab"), 7).await?;
//!     robot.tap(&Locator::id("supportTab")).await?;
//!     robot
//!         .scroll_until_visible(
//!             &Locator::text("Payment options"),
//!             &Locator::id("supportScrollView"),
//!             ScrollSearch::default(),
//!         )
//!         .await?;
//!     robot
//!         .tap_when_enabled(&Locator::id("payButton"), AttemptBudget::default())
//!         .await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod action;
pub mod driver;
pub mod element;
pub mod error;
pub mod locator;
pub mod poll;
pub mod retry;
pub mod robot;
pub mod run;
