//! Annotations and the text they capture.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};

use crate::error::{AnnotError, Result};
use crate::geometry::{BBox, HasBBox};
use crate::pdftypes::PDFObjRef;
use crate::pos::{PageRef, Pos};
use crate::utils::merge_lines;

/// A supported annotation type. Variant names match PDF `/Subtype` names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationType {
    /// A "sticky note" comment.
    Text,
    /// Markup annotations that apply to one or more regions on the page.
    Highlight,
    Squiggly,
    StrikeOut,
    Underline,
    /// An insertion point.
    Caret,
    /// A single rectangle, used by some tools to draw custom highlights.
    Square,
    /// Free-form text written somewhere on the page.
    FreeText,
}

impl AnnotationType {
    pub fn name(self) -> &'static str {
        match self {
            AnnotationType::Text => "Text",
            AnnotationType::Highlight => "Highlight",
            AnnotationType::Squiggly => "Squiggly",
            AnnotationType::StrikeOut => "StrikeOut",
            AnnotationType::Underline => "Underline",
            AnnotationType::Caret => "Caret",
            AnnotationType::Square => "Square",
            AnnotationType::FreeText => "FreeText",
        }
    }
}

impl FromStr for AnnotationType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        Ok(match s {
            "Text" => AnnotationType::Text,
            "Highlight" => AnnotationType::Highlight,
            "Squiggly" => AnnotationType::Squiggly,
            "StrikeOut" => AnnotationType::StrikeOut,
            "Underline" => AnnotationType::Underline,
            "Caret" => AnnotationType::Caret,
            "Square" => AnnotationType::Square,
            "FreeText" => AnnotationType::FreeText,
            _ => return Err(()),
        })
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An RGB colour with unit-interval components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl Rgb {
    pub fn new(red: f64, green: f64, blue: f64) -> Result<Self> {
        let valid = |c: f64| (0.0..=1.0).contains(&c);
        if !(valid(red) && valid(green) && valid(blue)) {
            return Err(AnnotError::TypeError {
                expected: "colour components in 0..=1",
                got: "out-of-range component",
            });
        }
        Ok(Self { red, green, blue })
    }

    /// Hex form, e.g. `#ff8000`.
    pub fn as_hexcolor(&self) -> String {
        let byte = |c: f64| (c * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            byte(self.red),
            byte(self.green),
            byte(self.blue)
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_hexcolor())
    }
}

/// A PDF annotation, and its extracted text.
///
/// Relationships to other annotations (`in_reply_to`, `replies`,
/// `group_children`) are indices into the owning page's annotation list,
/// valid once the page has been sorted and post-processed.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub subtype: AnnotationType,
    /// Contents of the annotation (e.g. comment/description)
    pub contents: Option<String>,
    pub author: Option<String>,
    pub created: Option<DateTime<FixedOffset>>,
    pub color: Option<Rgb>,
    /// Stable name (`/NM`), unique within the page.
    pub name: Option<String>,
    /// Regions whose text is captured.
    pub boxes: Vec<BBox>,
    pub pos: Pos,
    /// Text fragments in the order captured (use `gettext` for a cleaner form)
    pub text: Vec<String>,
    /// Text captured just prior to the beginning of `text`
    pub pre_context: Option<String>,
    /// Text captured just after the end of `text`
    pub post_context: Option<String>,
    /// Object id of this annotation's dictionary, for reply resolution.
    pub(crate) objid: Option<u32>,
    /// Unresolved `/IRT` reference.
    pub(crate) reply_ref: Option<PDFObjRef>,
    pub(crate) is_group_child: bool,
    /// Sequence number each `text` fragment was captured at (0 if untracked).
    text_seq: Vec<u64>,
    in_reply_to: Option<usize>,
    replies: Vec<usize>,
    group_children: Vec<usize>,
}

impl Annotation {
    /// Builds an annotation from its quad points and/or rectangle.
    ///
    /// Each group of 8 quad point values becomes one capture box. The
    /// position is the top-left corner of the rectangle if given, otherwise of
    /// the first box.
    pub fn new(
        page: PageRef,
        subtype: AnnotationType,
        quadpoints: Option<&[f64]>,
        rect: Option<BBox>,
    ) -> Result<Self> {
        let mut boxes = Vec::new();
        if let Some(quadpoints) = quadpoints {
            if quadpoints.len() % 8 != 0 {
                return Err(AnnotError::InvalidQuadPoints(quadpoints.len()));
            }
            for quad in quadpoints.chunks_exact(8) {
                let xs = [quad[0], quad[2], quad[4], quad[6]];
                let ys = [quad[1], quad[3], quad[5], quad[7]];
                let min = |v: [f64; 4]| v.into_iter().fold(f64::INFINITY, f64::min);
                let max = |v: [f64; 4]| v.into_iter().fold(f64::NEG_INFINITY, f64::max);
                boxes.push(BBox::new(min(xs), min(ys), max(xs), max(ys))?);
            }
        } else if subtype == AnnotationType::Caret
            && let Some(rect) = rect
        {
            // Carets have no quad points, but their rectangle locates the context.
            boxes.push(rect);
        }

        let anchor = rect
            .or_else(|| boxes.first().copied())
            .ok_or(AnnotError::MissingGeometry)?;
        let (x, y) = anchor.top_left();

        Ok(Self {
            subtype,
            contents: None,
            author: None,
            created: None,
            color: None,
            name: None,
            boxes,
            pos: Pos::new(page, x, y),
            text: Vec::new(),
            pre_context: None,
            post_context: None,
            objid: None,
            reply_ref: None,
            is_group_child: false,
            text_seq: Vec::new(),
            in_reply_to: None,
            replies: Vec::new(),
            group_children: Vec::new(),
        })
    }

    pub fn page(&self) -> &PageRef {
        &self.pos.page
    }

    /// Sequence number of the most recent character captured.
    pub fn last_charseq(&self) -> u64 {
        self.text_seq.iter().copied().max().unwrap_or(0)
    }

    /// Does any capture box take most of the item's area?
    pub fn hit(&self, item: &impl HasBBox) -> bool {
        self.boxes.iter().any(|b| b.hit(item))
    }

    /// Captures text while the page is streamed.
    ///
    /// A non-zero `charseq` must exceed every previously recorded one.
    pub fn capture(&mut self, text: &str, charseq: u64) {
        if charseq != 0 {
            debug_assert!(
                charseq > self.last_charseq(),
                "charseq {charseq} not after {}",
                self.last_charseq()
            );
        }
        self.text.push(text.to_string());
        self.text_seq.push(charseq);
    }

    /// Retrieves cleaned-up text after capture.
    ///
    /// Returns `None` when the annotation has no regions, so no text was ever
    /// expected; an empty string means text was expected but nothing was found.
    pub fn gettext(&self, remove_hyphens: bool) -> Option<String> {
        if self.boxes.is_empty() {
            return None;
        }
        if self.text.is_empty() {
            tracing::warn!("Missing text for {} annotation at {}", self.subtype, self.pos);
            return Some(String::new());
        }
        let captured = self.text.concat();
        Some(merge_lines(&captured, remove_hyphens, !self.has_context()))
    }

    /// Deletion and insertion markups show their surrounding text.
    pub fn wants_context(&self) -> bool {
        matches!(
            self.subtype,
            AnnotationType::StrikeOut | AnnotationType::Caret
        )
    }

    pub fn set_pre_context(&mut self, pre_context: String) {
        debug_assert!(self.pre_context.is_none());
        self.pre_context = Some(pre_context);
    }

    /// Sets the post-context, a window of text that begins right after
    /// `window_start`.
    ///
    /// Trailing whitespace is taken out of the annotation's text. Fragments
    /// captured after `window_start` are already in the window and are
    /// dropped; the rest move to the front of the post-context.
    pub fn set_post_context(&mut self, post_context: String, window_start: u64) {
        debug_assert!(self.post_context.is_none());

        let mut moved = Vec::new();
        while self
            .text
            .last()
            .is_some_and(|last| last.chars().all(char::is_whitespace))
        {
            let Some(fragment) = self.text.pop() else {
                break;
            };
            let seq = self.text_seq.pop().unwrap_or(0);
            if seq != 0 && seq <= window_start {
                moved.push(fragment);
            }
        }
        moved.reverse();
        moved.push(post_context);
        self.post_context = Some(moved.concat());
    }

    pub fn has_context(&self) -> bool {
        self.pre_context.is_some() || self.post_context.is_some()
    }

    /// Returns the captured context as `(pre, post)`, whitespace preserved.
    pub fn get_context(&self, remove_hyphens: bool) -> (String, String) {
        (
            merge_lines(self.pre_context.as_deref().unwrap_or(""), remove_hyphens, false),
            merge_lines(self.post_context.as_deref().unwrap_or(""), remove_hyphens, false),
        )
    }

    /// Index (on the same page) of the annotation this one replies to.
    pub fn in_reply_to(&self) -> Option<usize> {
        self.in_reply_to
    }

    pub fn replies(&self) -> &[usize] {
        &self.replies
    }

    pub fn group_children(&self) -> &[usize] {
        &self.group_children
    }

    pub fn is_group_child(&self) -> bool {
        self.is_group_child
    }

    pub(crate) fn set_in_reply_to(&mut self, target: usize) {
        self.in_reply_to = Some(target);
    }

    pub(crate) fn add_reply(&mut self, reply: usize) {
        self.replies.push(reply);
    }

    pub(crate) fn add_group_child(&mut self, child: usize) {
        self.group_children.push(child);
    }

    /// Clears contents that merely repeat the captured text.
    ///
    /// Some authoring tools pre-fill an annotation's contents with the
    /// selected text.
    pub(crate) fn dedup_contents(&mut self) {
        if let Some(contents) = &self.contents
            && !self.text.is_empty()
            && self.text.concat().trim() == contents.trim()
        {
            self.contents = None;
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} annotation at {}", self.subtype, self.pos)
    }
}
