//! Styling capability used by the render engine.
//!
//! The engine never emits escape codes itself. Every piece of text goes through a
//! [`Paint`] handle supplied by the caller, which may wrap it in whatever terminal
//! attributes it likes.

use std::fmt;
use std::sync::Arc;

/// Something that can style a piece of text.
pub trait Paint: Send + Sync {
    fn paint(&self, text: &str) -> String;
}

/// Leaves text untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plain;

impl Paint for Plain {
    fn paint(&self, text: &str) -> String {
        text.to_string()
    }
}

impl<F> Paint for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn paint(&self, text: &str) -> String {
        self(text)
    }
}

/// Shared handle to a [`Paint`] implementation.
#[derive(Clone)]
pub struct StyleRef(Arc<dyn Paint>);

impl StyleRef {
    pub fn new(paint: impl Paint + 'static) -> Self {
        Self(Arc::new(paint))
    }

    pub fn plain() -> Self {
        Self::new(Plain)
    }

    pub fn render(&self, text: &str) -> String {
        // an empty string has nothing to style and must stay zero width
        if text.is_empty() {
            return String::new();
        }
        self.0.paint(text)
    }
}

impl Default for StyleRef {
    fn default() -> Self {
        Self::plain()
    }
}

impl fmt::Debug for StyleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StyleRef(..)")
    }
}

/// Styles for the pieces of one plan line.
#[derive(Debug, Clone, Default)]
pub struct Styles {
    pub gutter: StyleRef,
    pub workers: StyleRef,
    pub everything: StyleRef,
    pub node_name: StyleRef,
    pub relation: StyleRef,
    pub value: StyleRef,
}

/// Styles for the detail panel.
#[derive(Debug, Clone, Default)]
pub struct DetailStyles {
    pub label: StyleRef,
    pub warning: StyleRef,
    pub caution: StyleRef,
}

/// Every style tier the render engine picks from.
#[derive(Debug, Clone, Default)]
pub struct StyleSet {
    /// The line under the cursor.
    pub cursor: Styles,
    /// Direct children of the selected node.
    pub child_of_selected: Styles,
    pub normal: Styles,
    pub detail: DetailStyles,
}

impl StyleSet {
    /// A style set that produces no escape codes at all.
    pub fn plain() -> Self {
        Self::default()
    }
}
