//! Positioned layout primitives produced by the layout analyzer.
//!
//! Contains the LT* types consumed by the capture pass:
//! - LTComponent: a bounding box
//! - LTChar: an actual character with a bounding box
//! - LTAnno: a virtual character (space, newline) with no position
//! - LTTextLine, LTTextBox: lines of text and groups of lines
//! - LTFigure: a figure container (embedded forms, which may hold bare chars)
//! - LTContainer: any other container
//! - LTPage: the root of a page's tree
//! - LTItem: closed enum over every primitive kind

use serde::{Deserialize, Serialize};

use crate::geometry::{HasBBox, Rect};

// ============================================================================
// Base Component
// ============================================================================

/// Base component with a bounding box.
///
/// Unlike [`crate::geometry::BBox`] this is not validated: layout engines can
/// and do emit degenerate boxes, which simply never hit anything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct LTComponent {
    pub(crate) x0: f64,
    pub(crate) y0: f64,
    pub(crate) x1: f64,
    pub(crate) y1: f64,
}

impl LTComponent {
    pub fn new(bbox: Rect) -> Self {
        let (x0, y0, x1, y1) = bbox;
        Self { x0, y0, x1, y1 }
    }

    /// An empty component that any `extend` will replace.
    fn empty() -> Self {
        Self::new((f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY))
    }

    /// Grows this component to cover `other`.
    fn extend(&mut self, other: &impl HasBBox) {
        self.x0 = self.x0.min(other.x0());
        self.y0 = self.y0.min(other.y0());
        self.x1 = self.x1.max(other.x1());
        self.y1 = self.y1.max(other.y1());
    }
}

impl HasBBox for LTComponent {
    fn x0(&self) -> f64 {
        self.x0
    }
    fn y0(&self) -> f64 {
        self.y0
    }
    fn x1(&self) -> f64 {
        self.x1
    }
    fn y1(&self) -> f64 {
        self.y1
    }
}

impl From<[f64; 4]> for LTComponent {
    fn from([x0, y0, x1, y1]: [f64; 4]) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

impl From<LTComponent> for [f64; 4] {
    fn from(c: LTComponent) -> Self {
        [c.x0, c.y0, c.x1, c.y1]
    }
}

macro_rules! impl_has_bbox_delegate {
    ($type:ty, $($field:ident).+) => {
        impl HasBBox for $type {
            fn x0(&self) -> f64 {
                self.$($field).+.x0
            }
            fn y0(&self) -> f64 {
                self.$($field).+.y0
            }
            fn x1(&self) -> f64 {
                self.$($field).+.x1
            }
            fn y1(&self) -> f64 {
                self.$($field).+.y1
            }
        }
    };
}

// ============================================================================
// Characters
// ============================================================================

/// Virtual character inserted by layout analyzer (e.g., space, newline).
///
/// Unlike LTChar, LTAnno has no bounding box as it represents a character
/// inferred from the relationship between real characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LTAnno {
    text: String,
}

impl LTAnno {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }

    pub fn get_text(&self) -> &str {
        &self.text
    }
}

/// Actual character in text with bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LTChar {
    #[serde(rename = "bbox")]
    component: LTComponent,
    text: String,
}

impl LTChar {
    pub fn new(bbox: Rect, text: &str) -> Self {
        Self {
            component: LTComponent::new(bbox),
            text: text.to_string(),
        }
    }

    pub fn get_text(&self) -> &str {
        &self.text
    }
}

impl_has_bbox_delegate!(LTChar, component);

// ============================================================================
// Containers
// ============================================================================

/// A positioned container of further layout items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LTContainer {
    #[serde(rename = "bbox")]
    pub(crate) component: LTComponent,
    #[serde(default)]
    pub(crate) items: Vec<LTItem>,
}

impl LTContainer {
    pub fn new(bbox: Rect) -> Self {
        Self {
            component: LTComponent::new(bbox),
            items: Vec::new(),
        }
    }

    /// Builds a container whose box covers all positioned children.
    pub fn from_items(items: Vec<LTItem>) -> Self {
        let mut component = LTComponent::empty();
        for item in &items {
            if let Some(c) = item.component() {
                component.extend(&c);
            }
        }
        if !component.x0.is_finite() {
            component = LTComponent::new((0.0, 0.0, 0.0, 0.0));
        }
        Self { component, items }
    }

    /// Adds an item to the container.
    pub fn add(&mut self, item: LTItem) {
        self.items.push(item);
    }

    /// Returns an iterator over contained items.
    pub fn iter(&self) -> impl Iterator<Item = &LTItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl_has_bbox_delegate!(LTContainer, component);

/// A line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LTTextLine {
    pub(crate) container: LTContainer,
}

impl LTTextLine {
    pub fn from_items(items: Vec<LTItem>) -> Self {
        Self {
            container: LTContainer::from_items(items),
        }
    }
}

impl_has_bbox_delegate!(LTTextLine, container.component);

/// A group of text lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LTTextBox {
    pub(crate) container: LTContainer,
}

impl LTTextBox {
    pub fn from_lines(lines: Vec<LTTextLine>) -> Self {
        Self {
            container: LTContainer::from_items(lines.into_iter().map(LTItem::TextLine).collect()),
        }
    }
}

impl_has_bbox_delegate!(LTTextBox, container.component);

/// Represents an area used by PDF Form objects.
///
/// LTFigure objects can appear recursively and may hold bare characters that
/// were never grouped into lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LTFigure {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub(crate) container: LTContainer,
}

impl LTFigure {
    pub fn new(name: &str, items: Vec<LTItem>) -> Self {
        Self {
            name: name.to_string(),
            container: LTContainer::from_items(items),
        }
    }
}

impl_has_bbox_delegate!(LTFigure, container.component);

/// Represents an entire page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LTPage {
    /// Page identifier (usually 1-based page number)
    #[serde(default)]
    pub pageid: i32,
    #[serde(flatten)]
    pub(crate) container: LTContainer,
}

impl LTPage {
    pub fn new(pageid: i32, bbox: Rect) -> Self {
        Self {
            pageid,
            container: LTContainer::new(bbox),
        }
    }

    /// Adds an item to the page.
    pub fn add(&mut self, item: LTItem) {
        self.container.add(item);
    }

    /// Returns an iterator over contained items.
    pub fn iter(&self) -> impl Iterator<Item = &LTItem> {
        self.container.iter()
    }
}

impl_has_bbox_delegate!(LTPage, container.component);

// ============================================================================
// LTItem
// ============================================================================

/// Represents any item that can appear in a layout container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LTItem {
    Char(LTChar),
    Anno(LTAnno),
    TextLine(LTTextLine),
    TextBox(LTTextBox),
    Figure(Box<LTFigure>),
    Container(LTContainer),
    /// Curves, rectangles and images: positioned but never captured.
    Graphic(LTComponent),
}

impl LTItem {
    /// Bounding box, or `None` for positionless whitespace.
    pub fn component(&self) -> Option<LTComponent> {
        match self {
            LTItem::Char(c) => Some(c.component),
            LTItem::Anno(_) => None,
            LTItem::TextLine(l) => Some(l.container.component),
            LTItem::TextBox(b) => Some(b.container.component),
            LTItem::Figure(f) => Some(f.container.component),
            LTItem::Container(c) => Some(c.component),
            LTItem::Graphic(g) => Some(*g),
        }
    }

    /// Nested items, for container kinds.
    pub fn children(&self) -> Option<&[LTItem]> {
        match self {
            LTItem::TextLine(l) => Some(&l.container.items),
            LTItem::TextBox(b) => Some(&b.container.items),
            LTItem::Figure(f) => Some(&f.container.items),
            LTItem::Container(c) => Some(&c.items),
            LTItem::Char(_) | LTItem::Anno(_) | LTItem::Graphic(_) => None,
        }
    }

    pub fn char(bbox: Rect, text: &str) -> Self {
        LTItem::Char(LTChar::new(bbox, text))
    }

    pub fn anno(text: &str) -> Self {
        LTItem::Anno(LTAnno::new(text))
    }
}

impl From<LTTextLine> for LTItem {
    fn from(line: LTTextLine) -> Self {
        LTItem::TextLine(line)
    }
}

impl From<LTTextBox> for LTItem {
    fn from(textbox: LTTextBox) -> Self {
        LTItem::TextBox(textbox)
    }
}

impl From<LTFigure> for LTItem {
    fn from(figure: LTFigure) -> Self {
        LTItem::Figure(Box::new(figure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_bbox_covers_positioned_children() {
        let line = LTTextLine::from_items(vec![
            LTItem::char((10.0, 10.0, 15.0, 20.0), "a"),
            LTItem::anno(" "),
            LTItem::char((16.0, 9.0, 21.0, 19.0), "b"),
        ]);
        assert_eq!(line.bbox(), (10.0, 9.0, 21.0, 20.0));
    }

    #[test]
    fn empty_container_has_zero_box() {
        let c = LTContainer::from_items(vec![LTItem::anno("\n")]);
        assert_eq!(c.bbox(), (0.0, 0.0, 0.0, 0.0));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn items_deserialize_from_json() {
        let json = r#"{"TextBox": {"bbox": [0, 0, 10, 10], "items": [
            {"TextLine": {"bbox": [0, 0, 10, 10], "items": [
                {"Char": {"bbox": [0, 0, 5, 10], "text": "h"}},
                {"Anno": {"text": "\n"}}
            ]}}
        ]}}"#;
        let item: LTItem = serde_json::from_str(json).unwrap();
        let lines = item.children().unwrap();
        assert_eq!(lines.len(), 1);
        let chars = lines[0].children().unwrap();
        assert!(matches!(chars[0], LTItem::Char(_)));
        assert!(chars[1].component().is_none());
    }
}
