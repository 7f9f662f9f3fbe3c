//! Logical locators for addressing UI elements.
//!
//! A [`Locator`] describes how to find one element in the accessibility
//! tree: by stable identifier or by visible text. Either form can carry an
//! ordinal index to disambiguate repeated elements, and identifier locators
//! can additionally be scoped to an ancestor container.
//!
//! Identifier lookups are the preferred form; text lookups exist for
//! screens that expose no stable ids and should be treated as a fallback.
//!
//! # Example
//!
//! ```
//! use retap::locator::Locator;
//!
//! // Third "PlanCard" inside the plans list.
//! let card = Locator::id("PlanCard").within("plansList").at_index(2);
//! assert_eq!(card.selection_index(), 2);
//! ```

use serde::{Deserialize, Serialize};

/// A logical description of how to find one UI element.
///
/// A locator may resolve to zero, one, or many elements in the live tree;
/// index selection assumes the backend reports matches in a stable
/// (document) order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by")]
pub enum Locator {
    /// Match by stable accessibility identifier.
    ById {
        /// The accessibility identifier to match.
        id: String,
        /// Zero-based ordinal among the matches. `None` or a negative
        /// value means "the first/only match".
        index: Option<i32>,
        /// Identifier of an ancestor the element must be contained in.
        ancestor: Option<String>,
    },

    /// Match by visible text or accessibility label.
    ByText {
        /// The text to match.
        text: String,
        /// Zero-based ordinal among the matches. `None` or a negative
        /// value means "the first/only match".
        index: Option<i32>,
    },
}

impl Locator {
    /// Locator matching by accessibility identifier.
    pub fn id(id: impl Into<String>) -> Self {
        Locator::ById {
            id: id.into(),
            index: None,
            ancestor: None,
        }
    }

    /// Locator matching by visible text or label.
    pub fn text(text: impl Into<String>) -> Self {
        Locator::ByText {
            text: text.into(),
            index: None,
        }
    }

    /// Restrict an identifier locator to descendants of the element with
    /// the given ancestor identifier. Text locators are returned unchanged.
    pub fn within(self, ancestor: impl Into<String>) -> Self {
        match self {
            Locator::ById { id, index, .. } => Locator::ById {
                id,
                index,
                ancestor: Some(ancestor.into()),
            },
            other => other,
        }
    }

    /// Select the Nth match instead of the first.
    ///
    /// Negative values are accepted and mean the same as no index at all:
    /// take the first match.
    pub fn at_index(self, index: i32) -> Self {
        match self {
            Locator::ById { id, ancestor, .. } => Locator::ById {
                id,
                index: Some(index),
                ancestor,
            },
            Locator::ByText { text, .. } => Locator::ByText {
                text,
                index: Some(index),
            },
        }
    }

    /// The raw index, if one was set.
    pub fn index(&self) -> Option<i32> {
        match self {
            Locator::ById { index, .. } | Locator::ByText { index, .. } => *index,
        }
    }

    /// The effective zero-based match position.
    ///
    /// An absent or negative index selects the first match; a non-negative
    /// index selects the Nth match.
    pub fn selection_index(&self) -> usize {
        match self.index() {
            Some(i) if i >= 0 => i as usize,
            _ => 0,
        }
    }

    /// True if this locator matches by text/label rather than identifier.
    pub fn is_text(&self) -> bool {
        matches!(self, Locator::ByText { .. })
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::ById {
                id,
                index,
                ancestor,
            } => {
                write!(f, "id `{id}`")?;
                if let Some(i) = index {
                    write!(f, "[{i}]")?;
                }
                if let Some(anc) = ancestor {
                    write!(f, " in `{anc}`")?;
                }
                Ok(())
            }
            Locator::ByText { text, index } => {
                write!(f, "text `{text}`")?;
                if let Some(i) = index {
                    write!(f, "[{i}]")?;
                }
                Ok(())
            }
        }
    }
}

/// Direction for scroll and swipe gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    /// Content moves to reveal what is above.
    Up,
    /// Content moves to reveal what is below.
    Down,
    /// Content moves to reveal what is to the left.
    Left,
    /// Content moves to reveal what is to the right.
    Right,
}

impl ScrollDirection {
    /// Short name, for log output and mock call records.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
            ScrollDirection::Left => "left",
            ScrollDirection::Right => "right",
        }
    }
}

impl std::fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge of a scrollable container, for scroll-to-end gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollEdge {
    /// Topmost content position.
    Top,
    /// Bottommost content position.
    Bottom,
    /// Leftmost content position.
    Left,
    /// Rightmost content position.
    Right,
}

impl ScrollEdge {
    /// Short name, for log output and mock call records.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollEdge::Top => "top",
            ScrollEdge::Bottom => "bottom",
            ScrollEdge::Left => "left",
            ScrollEdge::Right => "right",
        }
    }
}

impl std::fmt::Display for ScrollEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gesture speed for swipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeSpeed {
    /// A quick flick. Carousels generally expect this.
    Fast,
    /// A slow drag.
    Slow,
}

impl SwipeSpeed {
    /// Short name, for log output and mock call records.
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeSpeed::Fast => "fast",
            SwipeSpeed::Slow => "slow",
        }
    }
}
