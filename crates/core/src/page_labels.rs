//! Human page labels from the document's `/PageLabels` number tree.
//!
//! The tree yields one rule per contiguous range of page indices: a numbering
//! style, an optional prefix and a starting number. Labels are produced
//! lazily, one per page in document order. If the tree is malformed, or a
//! number cannot be written in its style, labelling stops for the rest of the
//! document and pages fall back to their 1-based page numbers.

use std::collections::HashMap;

use crate::error::{AnnotError, Result};
use crate::pdftypes::PDFObject;
use crate::source::PdfSource;
use crate::utils::{decode_text, format_int_alpha, format_int_roman};

/// Depth limit for number-tree descent.
const MAX_NUMBER_TREE_DEPTH: usize = 32;

/// Numbering style of a page label range (`/S`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    /// Decimal arabic numerals
    Decimal,
    /// Uppercase roman numerals
    UpperRoman,
    /// Lowercase roman numerals
    LowerRoman,
    /// Uppercase letters (A-Z, AA-ZZ, ...)
    UpperAlpha,
    /// Lowercase letters (a-z, aa-zz, ...)
    LowerAlpha,
}

impl LabelStyle {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "D" => Some(LabelStyle::Decimal),
            "R" => Some(LabelStyle::UpperRoman),
            "r" => Some(LabelStyle::LowerRoman),
            "A" => Some(LabelStyle::UpperAlpha),
            "a" => Some(LabelStyle::LowerAlpha),
            _ => None,
        }
    }

    pub fn format(self, value: u32) -> Result<String> {
        Ok(match self {
            LabelStyle::Decimal => value.to_string(),
            LabelStyle::UpperRoman => format_int_roman(value)?.to_uppercase(),
            LabelStyle::LowerRoman => format_int_roman(value)?,
            LabelStyle::UpperAlpha => format_int_alpha(value)?.to_uppercase(),
            LabelStyle::LowerAlpha => format_int_alpha(value)?,
        })
    }
}

/// Labelling rule for pages starting at `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRange {
    /// First page index covered by the rule.
    pub start: usize,
    /// `None` means the label is just the prefix.
    pub style: Option<LabelStyle>,
    pub prefix: String,
    /// Number of the first page in the range (`/St`).
    pub first: u32,
}

impl LabelRange {
    fn from_dict<S: PdfSource + ?Sized>(
        start: usize,
        dict: &HashMap<String, PDFObject>,
        src: &S,
    ) -> Result<Self> {
        let style = match src.resolve_key(dict, "S")? {
            None => None,
            Some(s) => {
                let name = s.as_name()?;
                let style = LabelStyle::from_name(name);
                if style.is_none() {
                    tracing::warn!("Unknown page label style '{name}' at page index {start}");
                }
                style
            }
        };

        let prefix = match src.resolve_key(dict, "P")? {
            None => String::new(),
            Some(p) => decode_text(p.as_string()?),
        };

        let first = match src.resolve_key(dict, "St")? {
            None => 1,
            Some(st) => {
                let n = st.as_int()?;
                u32::try_from(n)
                    .ok()
                    .filter(|&n| n >= 1)
                    .ok_or_else(|| AnnotError::PageLabel(format!("invalid start number {n}")))?
            }
        };

        Ok(Self {
            start,
            style,
            prefix,
            first,
        })
    }

    fn label(&self, pageno: usize) -> Result<String> {
        let mut label = self.prefix.clone();
        if let Some(style) = self.style {
            let offset = pageno
                .checked_sub(self.start)
                .and_then(|d| u32::try_from(d).ok())
                .ok_or_else(|| AnnotError::PageLabel(format!("page index {pageno} out of range")))?;
            let value = self
                .first
                .checked_add(offset)
                .ok_or_else(|| AnnotError::PageLabel(format!("label number overflow at {pageno}")))?;
            label.push_str(&style.format(value)?);
        }
        Ok(label)
    }
}

/// Parses a number tree of page label dictionaries into ranges sorted by start.
pub fn parse_label_tree<S: PdfSource + ?Sized>(src: &S, tree: &PDFObject) -> Result<Vec<LabelRange>> {
    let mut ranges = Vec::new();
    walk_number_tree(src, tree, 0, &mut ranges)?;
    ranges.sort_by_key(|r| r.start);

    // Pages before the first range get an empty label.
    if ranges.first().is_none_or(|r| r.start != 0) {
        ranges.insert(
            0,
            LabelRange {
                start: 0,
                style: None,
                prefix: String::new(),
                first: 1,
            },
        );
    }
    Ok(ranges)
}

fn walk_number_tree<S: PdfSource + ?Sized>(
    src: &S,
    node: &PDFObject,
    depth: usize,
    out: &mut Vec<LabelRange>,
) -> Result<()> {
    if depth > MAX_NUMBER_TREE_DEPTH {
        return Err(AnnotError::PageLabel("number tree too deep".to_string()));
    }
    let node = src.resolve1(node)?;
    let dict = node.as_dict()?;

    // Leaf: pairs of (page index, label dict)
    if let Some(nums) = src.resolve_key(dict, "Nums")? {
        let nums = nums.as_array()?;
        if nums.len() % 2 != 0 {
            return Err(AnnotError::PageLabel(format!(
                "odd-length Nums array ({} entries)",
                nums.len()
            )));
        }
        for pair in nums.chunks_exact(2) {
            let idx = src.resolve1(&pair[0])?.as_int()?;
            let start = usize::try_from(idx)
                .map_err(|_| AnnotError::PageLabel(format!("negative page index {idx}")))?;
            let label = src.resolve1(&pair[1])?;
            out.push(LabelRange::from_dict(start, label.as_dict()?, src)?);
        }
    }

    // Intermediate node
    if let Some(kids) = src.resolve_key(dict, "Kids")? {
        for kid in kids.as_array()? {
            walk_number_tree(src, kid, depth + 1, out)?;
        }
    }
    Ok(())
}

#[derive(Debug)]
enum LabelState {
    Active { ranges: Vec<LabelRange>, range_idx: usize },
    Exhausted,
    FailedPermanently,
}

/// Produces page labels one page at a time, in document order.
#[derive(Debug)]
pub struct PageLabels {
    state: LabelState,
    next_page: usize,
}

impl PageLabels {
    /// Labels derived from the document's `/PageLabels` tree, if any.
    pub fn from_source<S: PdfSource + ?Sized>(src: &S) -> Self {
        let tree = match src.resolve_key(src.catalog(), "PageLabels") {
            Ok(Some(tree)) => tree,
            Ok(None) => return Self::disabled(),
            Err(e) => {
                tracing::warn!("Failed to read page labels: {e}");
                return Self::failed();
            }
        };
        match parse_label_tree(src, &tree) {
            Ok(ranges) => Self::from_ranges(ranges),
            Err(e) => {
                tracing::warn!("Failed to parse page labels: {e}");
                Self::failed()
            }
        }
    }

    pub fn from_ranges(ranges: Vec<LabelRange>) -> Self {
        let state = if ranges.is_empty() {
            LabelState::Exhausted
        } else {
            LabelState::Active {
                ranges,
                range_idx: 0,
            }
        };
        Self { state, next_page: 0 }
    }

    /// No labels at all.
    pub fn disabled() -> Self {
        Self {
            state: LabelState::Exhausted,
            next_page: 0,
        }
    }

    fn failed() -> Self {
        Self {
            state: LabelState::FailedPermanently,
            next_page: 0,
        }
    }

    #[cfg(test)]
    fn has_failed(&self) -> bool {
        matches!(self.state, LabelState::FailedPermanently)
    }

    /// Label for the next page. Empty labels are reported as `None`.
    pub fn next_label(&mut self) -> Option<String> {
        let pageno = self.next_page;
        self.next_page += 1;

        let LabelState::Active { ranges, range_idx } = &mut self.state else {
            return None;
        };
        while *range_idx + 1 < ranges.len() && ranges[*range_idx + 1].start <= pageno {
            *range_idx += 1;
        }

        match ranges[*range_idx].label(pageno) {
            Ok(label) => Some(label).filter(|l| !l.is_empty()),
            Err(e) => {
                tracing::warn!("Page labels disabled from page #{}: {e}", pageno + 1);
                self.state = LabelState::FailedPermanently;
                None
            }
        }
    }
}

impl Iterator for PageLabels {
    type Item = Option<String>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_label())
    }
}
