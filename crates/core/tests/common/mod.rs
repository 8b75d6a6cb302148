//! Builders for in-memory test documents.
//!
//! Text is laid out on a monospaced grid: every character is `CHAR_W` wide
//! and `LINE_H` tall, lines are `LEADING` apart, and spaces become inferred
//! whitespace as a layout analyzer would emit them.

#![allow(dead_code)]

use std::collections::HashMap;

use pdfannots_core::geometry::BBox;
use pdfannots_core::layout::{LTItem, LTPage, LTTextBox, LTTextLine};
use pdfannots_core::pdftypes::{PDFObjRef, PDFObject};
use pdfannots_core::source::{MemoryDocument, RawPage};

pub const CHAR_W: f64 = 5.0;
pub const LINE_H: f64 = 10.0;
pub const LEADING: f64 = 12.0;
pub const PAGE_BBOX: (f64, f64, f64, f64) = (0.0, 0.0, 612.0, 792.0);

/// Left edges of a two-column page.
pub const LEFT_COL: f64 = 36.0;
pub const RIGHT_COL: f64 = 320.0;
pub const TOP: f64 = 760.0;

/// A column of text lines, top line first.
#[derive(Debug, Clone)]
pub struct Column {
    pub x0: f64,
    pub top: f64,
    pub lines: Vec<String>,
}

impl Column {
    pub fn new(x0: f64, top: f64, lines: &[&str]) -> Self {
        Self {
            x0,
            top,
            lines: lines.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Bottom edge of line `i`.
    pub fn line_y(&self, i: usize) -> f64 {
        self.top - LEADING * (i + 1) as f64
    }

    pub fn text_box(&self) -> LTItem {
        let lines = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, text)| text_line(text, self.x0, self.line_y(i)))
            .collect();
        LTTextBox::from_lines(lines).into()
    }

    /// Quad points covering the first occurrence of `needle` on line `i`.
    pub fn quad_over(&self, i: usize, needle: &str) -> Vec<f64> {
        let line = &self.lines[i];
        let start = line
            .find(needle)
            .unwrap_or_else(|| panic!("{needle:?} not on line {i}: {line:?}"));
        let start = line[..start].chars().count();
        let len = needle.chars().count();
        let x0 = self.x0 + start as f64 * CHAR_W;
        let x1 = x0 + len as f64 * CHAR_W;
        let (y0, y1) = (self.line_y(i), self.line_y(i) + LINE_H);
        vec![x0, y1, x1, y1, x0, y0, x1, y0]
    }
}

pub fn text_line(text: &str, x0: f64, y: f64) -> LTTextLine {
    let mut items = Vec::new();
    for (i, c) in text.chars().enumerate() {
        let x = x0 + i as f64 * CHAR_W;
        if c == ' ' {
            items.push(LTItem::anno(" "));
        } else {
            items.push(LTItem::char((x, y, x + CHAR_W, y + LINE_H), &c.to_string()));
        }
    }
    items.push(LTItem::anno("\n"));
    LTTextLine::from_items(items)
}

pub fn name(s: &str) -> PDFObject {
    PDFObject::Name(s.to_string())
}

pub fn string(s: &str) -> PDFObject {
    PDFObject::String(s.as_bytes().to_vec())
}

pub fn nums(values: &[f64]) -> PDFObject {
    PDFObject::Array(values.iter().map(|&v| PDFObject::Real(v)).collect())
}

pub fn dict(entries: Vec<(&str, PDFObject)>) -> PDFObject {
    PDFObject::Dict(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

/// A raw annotation dictionary under construction.
#[derive(Debug, Clone)]
pub struct AnnotBuilder {
    entries: HashMap<String, PDFObject>,
}

impl AnnotBuilder {
    pub fn new(subtype: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert("Subtype".to_string(), name(subtype));
        Self { entries }
    }

    pub fn set(mut self, key: &str, value: PDFObject) -> Self {
        self.entries.insert(key.to_string(), value);
        self
    }

    pub fn quads(self, quads: Vec<f64>) -> Self {
        self.set("QuadPoints", nums(&quads))
    }

    pub fn rect(self, rect: [f64; 4]) -> Self {
        self.set("Rect", nums(&rect))
    }

    pub fn contents(self, text: &str) -> Self {
        self.set("Contents", string(text))
    }

    pub fn in_reply_to(self, target: PDFObjRef, group: bool) -> Self {
        let s = self.set("IRT", PDFObject::Ref(target));
        if group { s.set("RT", name("Group")) } else { s.set("RT", name("R")) }
    }

    pub fn build(self) -> PDFObject {
        PDFObject::Dict(self.entries)
    }
}

/// Assembles a [`MemoryDocument`] page by page.
#[derive(Debug, Default)]
pub struct DocBuilder {
    pub doc: MemoryDocument,
    next_objid: u32,
}

impl DocBuilder {
    pub fn new() -> Self {
        Self {
            doc: MemoryDocument::new(),
            next_objid: 1,
        }
    }

    /// Stores an object and returns its reference.
    pub fn object(&mut self, obj: PDFObject) -> PDFObjRef {
        let objid = self.next_objid;
        self.next_objid += 1;
        self.doc.add_object(objid, obj)
    }

    /// Adds a page with the given layout items and annotation references.
    pub fn page(&mut self, items: Vec<LTItem>, annots: Vec<PDFObjRef>) -> PDFObjRef {
        let pageid = PDFObjRef::new(1000 + self.doc.pages.len() as u32, 0);
        let mut layout = LTPage::new(self.doc.pages.len() as i32 + 1, PAGE_BBOX);
        for item in items {
            layout.add(item);
        }
        let (x0, y0, x1, y1) = PAGE_BBOX;
        let raw = RawPage {
            pageid,
            mediabox: BBox::new(x0, y0, x1, y1).expect("valid page box"),
            annots: annots.into_iter().map(PDFObject::Ref).collect(),
        };
        self.doc.push_page(raw, layout);
        pageid
    }

    /// Installs a flat outline tree; `page` is the destination's first element.
    pub fn outlines(&mut self, entries: Vec<(&str, PDFObject, Option<f64>, Option<f64>)>) {
        let coord = |c: Option<f64>| c.map_or(PDFObject::Null, PDFObject::Real);
        let mut next: Option<PDFObjRef> = None;
        for (title, page, x, y) in entries.into_iter().rev() {
            let dest = PDFObject::Array(vec![page, name("XYZ"), coord(x), coord(y), PDFObject::Null]);
            let mut item = vec![("Title", string(title)), ("Dest", dest)];
            if let Some(n) = next {
                item.push(("Next", PDFObject::Ref(n)));
            }
            next = Some(self.object(dict(item)));
        }
        if let Some(first) = next {
            self.doc
                .catalog
                .insert("Outlines".to_string(), dict(vec![("First", PDFObject::Ref(first))]));
        }
    }

    pub fn page_labels(&mut self, nums_tree: Vec<(i64, PDFObject)>) {
        let mut nums = Vec::new();
        for (start, label) in nums_tree {
            nums.push(PDFObject::Int(start));
            nums.push(label);
        }
        self.doc.catalog.insert(
            "PageLabels".to_string(),
            dict(vec![("Nums", PDFObject::Array(nums))]),
        );
    }

    pub fn build(self) -> MemoryDocument {
        self.doc
    }
}
