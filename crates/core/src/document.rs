//! The extracted document: pages, their annotations and outlines.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::annotation::Annotation;
use crate::error::{AnnotError, Result};
use crate::geometry::BBox;
use crate::outline::Outline;
use crate::pdftypes::PDFObjRef;
use crate::pos::{PageRef, Pos};

/// A page of the document, with the annotations on it and the outlines
/// that point to it.
#[derive(Debug, Clone)]
pub struct Page {
    /// Zero-based page index.
    pub pageno: usize,
    /// Reference to the page object in the source document.
    pub pageid: PDFObjRef,
    /// Human page label (e.g. "iv"), if the document defines one.
    pub label: Option<String>,
    pub mediabox: BBox,
    pub fixed_columns: Option<u32>,
    pub annots: Vec<Annotation>,
    pub outlines: Vec<Outline>,
}

impl Page {
    pub fn new(
        pageno: usize,
        pageid: PDFObjRef,
        label: Option<String>,
        mediabox: BBox,
        fixed_columns: Option<u32>,
    ) -> Result<Self> {
        if fixed_columns == Some(0) {
            return Err(AnnotError::InvalidParams(
                "fixed column count must be positive".to_string(),
            ));
        }
        Ok(Self {
            pageno,
            pageid,
            label,
            mediabox,
            fixed_columns,
            annots: Vec::new(),
            outlines: Vec::new(),
        })
    }

    /// The non-owning view held by positions on this page.
    pub fn page_ref(&self) -> PageRef {
        PageRef {
            pageno: self.pageno,
            mediabox: self.mediabox,
            fixed_columns: self.fixed_columns,
        }
    }

    pub fn annot(&self, idx: usize) -> Option<&Annotation> {
        self.annots.get(idx)
    }

    /// Replies to the annotation at `idx`, in reading order.
    pub fn replies_to(&self, idx: usize) -> impl Iterator<Item = &Annotation> {
        self.related(idx, Annotation::replies)
    }

    /// Group children of the annotation at `idx`, in reading order.
    pub fn group_children_of(&self, idx: usize) -> impl Iterator<Item = &Annotation> {
        self.related(idx, Annotation::group_children)
    }

    fn related<'a>(
        &'a self,
        idx: usize,
        select: fn(&Annotation) -> &[usize],
    ) -> impl Iterator<Item = &'a Annotation> + 'a {
        self.annots
            .get(idx)
            .map(select)
            .unwrap_or_default()
            .iter()
            .filter_map(|&i| self.annots.get(i))
    }

    /// Sorts annotations and outlines into reading order.
    ///
    /// Must run before [`Page::postprocess_annots`], since relationships are
    /// recorded as indices into the sorted list.
    pub(crate) fn sort_objects(&mut self) {
        self.annots.sort_by(|a, b| a.pos.cmp(&b.pos));
        self.outlines.sort_by(|a, b| a.pos().cmp(b.pos()));
    }

    /// Resolves reply and group relationships, and clears auto-populated
    /// contents.
    pub(crate) fn postprocess_annots(&mut self) {
        let by_objid: FxHashMap<u32, usize> = self
            .annots
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.objid.map(|objid| (objid, i)))
            .collect();

        let mut parent: Vec<Option<usize>> = vec![None; self.annots.len()];
        for (i, a) in self.annots.iter_mut().enumerate() {
            let Some(irt) = a.reply_ref else {
                continue;
            };
            match by_objid.get(&irt.objid) {
                Some(&target) if target != i => parent[i] = Some(target),
                Some(_) => {
                    tracing::warn!("{a} is in reply to itself; ignoring");
                    a.is_group_child = false;
                }
                None => {
                    tracing::warn!(
                        "{a} is in reply to object {}, which is not an annotation on {}",
                        irt.objid,
                        PageName(self.pageno, self.label.as_deref())
                    );
                    // Shown as a standalone annotation rather than lost.
                    a.is_group_child = false;
                }
            }
        }

        // A chain of replies that loops back would hide all of its members
        for i in 0..parent.len() {
            let mut cur = parent[i];
            for _ in 0..parent.len() {
                match cur {
                    Some(p) if p != i => cur = parent[p],
                    _ => break,
                }
            }
            if cur == Some(i) {
                tracing::warn!("{} is part of a reply cycle; showing it on its own", self.annots[i]);
                parent[i] = None;
                self.annots[i].is_group_child = false;
            }
        }

        let links: Vec<(usize, usize)> = parent
            .iter()
            .enumerate()
            .filter_map(|(child, target)| target.map(|t| (child, t)))
            .collect();
        for (child, target) in links {
            if self.annots[child].is_group_child {
                self.annots[target].add_group_child(child);
            } else {
                self.annots[child].set_in_reply_to(target);
                self.annots[target].add_reply(child);
            }
        }

        for a in &mut self.annots {
            a.dedup_contents();
            if a.contents.is_none() && a.boxes.is_empty() {
                tracing::warn!("{a} has no contents and no text region");
            }
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        PageName(self.pageno, self.label.as_deref()).fmt(f)
    }
}

/// "page iv", or "page #4" for unlabelled pages.
struct PageName<'a>(usize, Option<&'a str>);

impl fmt::Display for PageName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            Some(label) => write!(f, "page {label}"),
            None => write!(f, "page #{}", self.0 + 1),
        }
    }
}

/// A fully-extracted document: its pages, indexed by zero-based page number.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterates annotations in document order.
    ///
    /// Group children are never yielded on their own; replies only when
    /// `include_replies` is set.
    pub fn iter_annots(&self, include_replies: bool) -> impl Iterator<Item = &Annotation> {
        self.pages.iter().flat_map(move |p| {
            p.annots.iter().filter(move |a| {
                !a.is_group_child() && (include_replies || a.in_reply_to().is_none())
            })
        })
    }

    /// Like [`Document::iter_annots`], also yielding each annotation's page.
    pub fn iter_annots_with_page(&self, include_replies: bool) -> impl Iterator<Item = (&Page, usize, &Annotation)> {
        self.pages.iter().flat_map(move |p| {
            p.annots
                .iter()
                .enumerate()
                .filter(move |(_, a)| {
                    !a.is_group_child() && (include_replies || a.in_reply_to().is_none())
                })
                .map(move |(i, a)| (p, i, a))
        })
    }

    /// Returns the last outline strictly before `pos` in reading order.
    pub fn nearest_outline(&self, pos: &Pos) -> Option<&Outline> {
        let last = pos.page.pageno.min(self.pages.len().checked_sub(1)?);
        // Search pages backwards from the given pos
        for page in self.pages[..=last].iter().rev() {
            debug_assert!(page.pageno <= pos.page.pageno);
            // Outlines are pre-sorted
            let idx = page.outlines.partition_point(|o| o.pos() < pos);
            if idx > 0 {
                return page.outlines.get(idx - 1);
            }
        }
        None
    }
}
