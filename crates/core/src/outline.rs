//! Outlines ("bookmarks") and their resolution to page positions.
//!
//! Outlines are read from the document's bookmark tree before any page is
//! processed. Each one names its target page either by index or by the page
//! object's id; it stays pending until that page is reached, when
//! [`PendingOutline::resolve`] turns it into a positioned [`Outline`].

use std::collections::HashMap;
use std::fmt;

use rustc_hash::FxHashSet;

use crate::error::{AnnotError, Result};
use crate::pdftypes::{PDFObjRef, PDFObject};
use crate::pos::{PageRef, Pos};
use crate::source::PdfSource;
use crate::utils::decode_text;

/// An outline's target page, before the page has been seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageTarget {
    /// Zero-based page index.
    Index(usize),
    /// Object id of the page dictionary.
    ObjId(u32),
}

/// An outline whose page has not yet been reached.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOutline {
    pub title: String,
    pub target_page: PageTarget,
    /// Explicit target coordinates; absent values default to the page's
    /// top-left corner.
    pub target: (Option<f64>, Option<f64>),
}

impl PendingOutline {
    pub fn new(title: impl Into<String>, target_page: PageTarget, target: (Option<f64>, Option<f64>)) -> Self {
        Self {
            title: title.into(),
            target_page,
            target,
        }
    }

    /// Resolves this outline against the page it targets.
    pub fn resolve(self, page: PageRef, page_objid: u32) -> Result<Outline> {
        let matches = match self.target_page {
            PageTarget::Index(pageno) => pageno == page.pageno,
            PageTarget::ObjId(objid) => objid == page_objid,
        };
        if !matches {
            return Err(AnnotError::OutlineInvariant(format!(
                "outline '{}' targets {:?}, resolved against page #{}",
                self.title,
                self.target_page,
                page.pageno + 1
            )));
        }

        // "first" point on the page, assuming left-to-right top-to-bottom order
        let (x0, y1) = page.mediabox.top_left();
        let x = self.target.0.unwrap_or(x0);
        let y = self.target.1.unwrap_or(y1);

        Ok(Outline {
            title: self.title,
            pos: Pos::new(page, x, y),
        })
    }
}

/// A resolved outline: a title and a position on its page.
#[derive(Debug, Clone)]
pub struct Outline {
    pub title: String,
    pos: Pos,
}

impl Outline {
    pub fn pos(&self) -> &Pos {
        &self.pos
    }

    pub(crate) fn pos_mut(&mut self) -> &mut Pos {
        &mut self.pos
    }
}

impl fmt::Display for Outline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "outline '{}' at {}", self.title, self.pos)
    }
}

/// Reads every recognised outline from the document's bookmark tree.
///
/// Returns `Ok(None)` when the document has no outlines. Entries whose
/// destination cannot be used are skipped with a warning.
pub fn get_outlines<S: PdfSource + ?Sized>(src: &S) -> Result<Option<Vec<PendingOutline>>> {
    let Some(root) = src.resolve_key(src.catalog(), "Outlines")? else {
        return Ok(None);
    };
    let root = root.as_dict()?;
    let Some(first) = root.get("First") else {
        return Ok(None);
    };

    let mut outlines = Vec::new();
    let mut visited = FxHashSet::default();
    // Depth-first: children before later siblings.
    let mut stack = vec![first.clone()];

    while let Some(entry) = stack.pop() {
        if let PDFObject::Ref(PDFObjRef { objid, .. }) = entry
            && !visited.insert(objid)
        {
            tracing::warn!("Outline entry {objid} visited twice; ignoring cycle");
            continue;
        }

        let entry = src.resolve1(&entry)?;
        let Ok(dict) = entry.as_dict() else {
            tracing::warn!("Outline entry is a {}, not a dict", entry.type_name());
            continue;
        };

        if let Some(next) = dict.get("Next") {
            stack.push(next.clone());
        }
        if let Some(child) = dict.get("First") {
            stack.push(child.clone());
        }

        let Some(title) = src.resolve_key(dict, "Title")? else {
            continue;
        };
        let title = match title.as_string() {
            Ok(bytes) => decode_text(bytes),
            Err(_) => continue,
        };

        match outline_from_entry(src, title, dict) {
            Ok(Some(outline)) => outlines.push(outline),
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping outline entry: {e}"),
        }
    }

    Ok(Some(outlines))
}

fn outline_from_entry<S: PdfSource + ?Sized>(
    src: &S,
    title: String,
    dict: &HashMap<String, PDFObject>,
) -> Result<Option<PendingOutline>> {
    let mut dest = src.resolve_key(dict, "Dest")?;

    if dest.is_none()
        && let Some(action) = src.resolve_key(dict, "A")?
        && let Ok(action) = action.as_dict()
        && src.resolve_key(action, "S")?.is_some_and(|s| s.as_name().is_ok_and(|n| n == "GoTo"))
    {
        dest = src.resolve_key(action, "D")?;
    }

    let Some(dest) = dest else {
        return Ok(None);
    };

    let dest = resolve_dest(src, dest)?;
    let arr = dest.as_array()?;

    // consider targets of the form [page /XYZ left top zoom]
    let is_xyz = arr
        .get(1)
        .map(|kind| src.resolve1(kind))
        .transpose()?
        .is_some_and(|kind| kind.as_name().is_ok_and(|n| n == "XYZ"));
    if !is_xyz {
        tracing::warn!("Unsupported outline destination for '{title}': {:?}", arr.get(1));
        return Ok(None);
    }

    let target_page = match &arr[0] {
        PDFObject::Ref(r) => PageTarget::ObjId(r.objid),
        PDFObject::Int(n) if *n >= 0 => PageTarget::Index(*n as usize),
        other => {
            return Err(AnnotError::UnsupportedDestination(format!(
                "page reference {} in outline '{title}'",
                other.type_name()
            )));
        }
    };

    let coord = |i: usize| -> Result<Option<f64>> {
        match arr.get(i) {
            None => Ok(None),
            Some(obj) => {
                let obj = src.resolve1(obj)?;
                if obj.is_null() {
                    Ok(None)
                } else {
                    obj.as_num().map(Some)
                }
            }
        }
    };

    Ok(Some(PendingOutline::new(
        title,
        target_page,
        (coord(2)?, coord(3)?),
    )))
}

/// Follows named destinations and destination dictionaries to an explicit
/// destination array.
fn resolve_dest<S: PdfSource + ?Sized>(src: &S, dest: PDFObject) -> Result<PDFObject> {
    let dest = match dest {
        PDFObject::String(name) => src.resolve1(&src.get_dest(&name)?)?,
        PDFObject::Name(name) => src.resolve1(&src.get_dest(name.as_bytes())?)?,
        explicit => explicit,
    };
    if let Ok(dict) = dest.as_dict() {
        return src
            .resolve_key(dict, "D")?
            .ok_or_else(|| AnnotError::KeyError("D".to_string()));
    }
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;
    use crate::source::MemoryDocument;

    fn dict(entries: Vec<(&str, PDFObject)>) -> PDFObject {
        PDFObject::Dict(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    fn string(s: &str) -> PDFObject {
        PDFObject::String(s.as_bytes().to_vec())
    }

    fn xyz(page: PDFObject, x: PDFObject, y: PDFObject) -> PDFObject {
        PDFObject::Array(vec![page, PDFObject::Name("XYZ".into()), x, y, PDFObject::Null])
    }

    fn page_ref(pageno: usize) -> PageRef {
        PageRef {
            pageno,
            mediabox: BBox::new(0.0, 0.0, 612.0, 792.0).unwrap(),
            fixed_columns: None,
        }
    }

    #[test]
    fn no_outline_tree_is_none() {
        let doc = MemoryDocument::new();
        assert_eq!(get_outlines(&doc).unwrap(), None);
    }

    #[test]
    fn walks_children_before_siblings() {
        let mut doc = MemoryDocument::new();
        let page = PDFObject::Ref(PDFObjRef::new(100, 0));
        let child = doc.add_object(
            3,
            dict(vec![
                ("Title", string("1.1 Child")),
                ("Dest", xyz(page.clone(), PDFObject::Int(72), PDFObject::Int(700))),
            ]),
        );
        let second = doc.add_object(
            4,
            dict(vec![
                ("Title", string("2 Second")),
                (
                    "A",
                    dict(vec![
                        ("S", PDFObject::Name("GoTo".into())),
                        ("D", xyz(PDFObject::Int(2), PDFObject::Null, PDFObject::Null)),
                    ]),
                ),
            ]),
        );
        let first = doc.add_object(
            2,
            dict(vec![
                ("Title", string("1 First")),
                ("Dest", xyz(page, PDFObject::Real(0.0), PDFObject::Real(792.0))),
                ("First", PDFObject::Ref(child)),
                ("Next", PDFObject::Ref(second)),
            ]),
        );
        doc.catalog.insert(
            "Outlines".to_string(),
            dict(vec![("First", PDFObject::Ref(first))]),
        );

        let outlines = get_outlines(&doc).unwrap().unwrap();
        let titles: Vec<_> = outlines.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, ["1 First", "1.1 Child", "2 Second"]);
        assert_eq!(outlines[1].target_page, PageTarget::ObjId(100));
        assert_eq!(outlines[1].target, (Some(72.0), Some(700.0)));
        assert_eq!(outlines[2].target_page, PageTarget::Index(2));
        assert_eq!(outlines[2].target, (None, None));
    }

    #[test]
    fn named_destinations_and_unsupported_kinds() {
        let mut doc = MemoryDocument::new();
        doc.catalog.insert(
            "Dests".to_string(),
            dict(vec![(
                "intro",
                dict(vec![("D", xyz(PDFObject::Int(0), PDFObject::Int(10), PDFObject::Int(20)))]),
            )]),
        );
        let fit = doc.add_object(
            6,
            dict(vec![
                ("Title", string("Fit")),
                (
                    "Dest",
                    PDFObject::Array(vec![PDFObject::Int(0), PDFObject::Name("Fit".into())]),
                ),
            ]),
        );
        let named = doc.add_object(
            5,
            dict(vec![
                ("Title", string("Intro")),
                ("Dest", PDFObject::Name("intro".into())),
                ("Next", PDFObject::Ref(fit)),
            ]),
        );
        doc.catalog.insert(
            "Outlines".to_string(),
            dict(vec![("First", PDFObject::Ref(named))]),
        );

        let outlines = get_outlines(&doc).unwrap().unwrap();
        assert_eq!(outlines.len(), 1);
        assert_eq!(outlines[0].title, "Intro");
        assert_eq!(outlines[0].target, (Some(10.0), Some(20.0)));
    }

    #[test]
    fn sibling_cycles_terminate() {
        let mut doc = MemoryDocument::new();
        doc.add_object(
            7,
            dict(vec![
                ("Title", string("Loop")),
                ("Dest", xyz(PDFObject::Int(0), PDFObject::Null, PDFObject::Null)),
                ("Next", PDFObject::Ref(PDFObjRef::new(7, 0))),
            ]),
        );
        doc.catalog.insert(
            "Outlines".to_string(),
            dict(vec![("First", PDFObject::Ref(PDFObjRef::new(7, 0)))]),
        );
        assert_eq!(get_outlines(&doc).unwrap().unwrap().len(), 1);
    }

    #[test]
    fn resolve_defaults_to_top_left() {
        let pending = PendingOutline::new("Top", PageTarget::Index(1), (None, Some(500.0)));
        let outline = pending.resolve(page_ref(1), 42).unwrap();
        assert_eq!((outline.pos().x, outline.pos().y), (0.0, 500.0));
    }

    #[test]
    fn resolve_against_wrong_page_fails() {
        let pending = PendingOutline::new("X", PageTarget::ObjId(9), (None, None));
        assert!(matches!(
            pending.resolve(page_ref(0), 10),
            Err(AnnotError::OutlineInvariant(_))
        ));
    }
}
