//! Accessibility-tree element model and pure locator resolution.
//!
//! This module defines the data structures representing UI elements as
//! reported by an automation backend, plus the resolution functions that
//! map a [`Locator`] to its matches in a tree. Resolution is pure: no I/O,
//! no waiting. Backends and mocks feed it a snapshot of the live tree.
//!
//! Matches are collected in depth-first pre-order (document order), which
//! is what makes indexed locators meaningful.

use serde::{Deserialize, Serialize};

use crate::locator::Locator;

/// A UI element from the accessibility hierarchy.
///
/// Elements form a tree via the `children` field. Which of the optional
/// attributes are populated depends on the platform: Android backends
/// report visible text in `text`, iOS backends report it in `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiElement {
    /// The stable accessibility identifier, if the element has one.
    #[serde(default)]
    pub identifier: Option<String>,

    /// The user-visible text (Android).
    #[serde(default)]
    pub text: Option<String>,

    /// The accessibility label (iOS), typically the user-visible text.
    #[serde(default)]
    pub label: Option<String>,

    /// The current value, e.g. text field contents.
    #[serde(default)]
    pub value: Option<String>,

    /// The platform element type (e.g. "Button", "WKWebView").
    #[serde(rename = "type", default)]
    pub element_type: Option<String>,

    /// Whether the element currently accepts interaction.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether the element is rendered on screen.
    #[serde(default = "default_true")]
    pub visible: bool,

    /// The element's frame in screen points, if known.
    #[serde(default)]
    pub frame: Option<ElementFrame>,

    /// Child elements nested within this element.
    #[serde(default)]
    pub children: Vec<UiElement>,
}

fn default_true() -> bool {
    true
}

impl UiElement {
    /// New element with only an identifier set.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            identifier: Some(id.into()),
            ..Self::empty()
        }
    }

    /// New element with only visible text set.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::empty()
        }
    }

    /// New element with only an accessibility label set.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::empty()
        }
    }

    fn empty() -> Self {
        Self {
            identifier: None,
            text: None,
            label: None,
            value: None,
            element_type: None,
            enabled: true,
            visible: true,
            frame: None,
            children: Vec::new(),
        }
    }

    /// Set the platform element type.
    pub fn typed(mut self, element_type: impl Into<String>) -> Self {
        self.element_type = Some(element_type.into());
        self
    }

    /// Set the visible text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the accessibility label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the current value.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Mark the element as disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Mark the element as off-screen.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Append a child element.
    pub fn child(mut self, child: UiElement) -> Self {
        self.children.push(child);
        self
    }

    /// True if this element's text or label matches the given string.
    ///
    /// Text locators match either attribute so the same locator works on
    /// both platforms.
    pub fn matches_text(&self, text: &str) -> bool {
        self.text.as_deref() == Some(text) || self.label.as_deref() == Some(text)
    }
}

/// The frame (position and dimensions) of a UI element.
///
/// Coordinates are in screen points with the origin at the top-left
/// corner of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementFrame {
    /// The x-coordinate of the element's top-left corner.
    pub x: f64,
    /// The y-coordinate of the element's top-left corner.
    pub y: f64,
    /// The width of the element in points.
    pub width: f64,
    /// The height of the element in points.
    pub height: f64,
}

/// A read-only snapshot of one element's attributes.
///
/// Returned by [`UiDriver::attributes`](crate::driver::UiDriver::attributes);
/// used by the enabled-state polling loop and the platform-aware text
/// readout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementAttributes {
    /// Whether the element currently accepts interaction.
    pub enabled: bool,
    /// The user-visible text (Android).
    pub text: Option<String>,
    /// The accessibility label (iOS).
    pub label: Option<String>,
    /// The current value.
    pub value: Option<String>,
    /// The platform element type.
    pub element_type: Option<String>,
}

impl From<&UiElement> for ElementAttributes {
    fn from(element: &UiElement) -> Self {
        Self {
            enabled: element.enabled,
            text: element.text.clone(),
            label: element.label.clone(),
            value: element.value.clone(),
            element_type: element.element_type.clone(),
        }
    }
}

/// Collect every element matching the locator, in depth-first pre-order.
///
/// Ancestor-scoped locators first find every element whose identifier
/// equals the ancestor id, then match inside those subtrees (in order).
/// The locator's index is NOT applied here; see [`resolve`].
pub fn find_matches(tree: &[UiElement], locator: &Locator) -> Vec<UiElement> {
    let mut matches = Vec::new();
    match locator {
        Locator::ById {
            id,
            ancestor: Some(ancestor),
            ..
        } => {
            let mut scopes = Vec::new();
            collect(tree, &mut scopes, &|e| {
                e.identifier.as_deref() == Some(ancestor.as_str())
            });
            for scope in &scopes {
                collect(&scope.children, &mut matches, &|e| {
                    e.identifier.as_deref() == Some(id.as_str())
                });
            }
        }
        Locator::ById { id, .. } => {
            collect(tree, &mut matches, &|e| {
                e.identifier.as_deref() == Some(id.as_str())
            });
        }
        Locator::ByText { text, .. } => {
            collect(tree, &mut matches, &|e| e.matches_text(text));
        }
    }
    matches
}

/// Resolve a locator to a single element.
///
/// Applies the index rule: an absent or negative index selects the first
/// match, a non-negative index selects the Nth. Returns `None` when there
/// is no match at that position.
pub fn resolve(tree: &[UiElement], locator: &Locator) -> Option<UiElement> {
    find_matches(tree, locator)
        .into_iter()
        .nth(locator.selection_index())
}

/// Collect every element of the given platform type, in pre-order.
pub fn find_by_type(tree: &[UiElement], element_type: &str) -> Vec<UiElement> {
    let mut matches = Vec::new();
    collect(tree, &mut matches, &|e| {
        e.element_type.as_deref() == Some(element_type)
    });
    matches
}

/// Flatten a hierarchy into the list of addressable elements.
///
/// Keeps elements that carry an identifier, text, or label; anonymous
/// containers are dropped. Used by the debug screen dump.
pub fn flatten(tree: &[UiElement]) -> Vec<UiElement> {
    let mut result = Vec::new();
    collect(tree, &mut result, &|e| {
        e.identifier.is_some() || e.text.is_some() || e.label.is_some()
    });
    result
}

/// Depth-first pre-order traversal collecting elements that satisfy the
/// predicate. A matching element's subtree is still searched, so repeated
/// nested matches keep document order.
fn collect(tree: &[UiElement], out: &mut Vec<UiElement>, pred: &dyn Fn(&UiElement) -> bool) {
    for element in tree {
        if pred(element) {
            out.push(element.clone());
        }
        collect(&element.children, out, pred);
    }
}
