//! Positions on a page and their reading order.
//!
//! Two positions compare by page first. Within a page the order is either
//! geometric (a fixed number of columns, each read top to bottom) or inferred
//! from the layout analyzer: every position adopts the sequence number of
//! the nearest line or figure seen while the page was streamed.

use std::cmp::Ordering;
use std::fmt;

use crate::geometry::{BBox, HasBBox, Point};

/// The parts of a page that positions need in order to compare themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRef {
    /// Zero-based page index.
    pub pageno: usize,
    pub mediabox: BBox,
    /// Fixed column count; `None` means infer order from the layout.
    pub fixed_columns: Option<u32>,
}

impl PageRef {
    /// Column containing `point`, after clamping it into the mediabox.
    fn column_of(&self, columns: u32, point: Point) -> (i64, f64) {
        let (x, y) = self.mediabox.closest_point(point);
        let colwidth = self.mediabox.width() / f64::from(columns);
        let col = if colwidth > 0.0 {
            ((x - self.mediabox.x0()) / colwidth).floor() as i64
        } else {
            0
        };
        (col, y)
    }
}

/// An x,y point on a particular page, comparable in reading order.
#[derive(Debug, Clone)]
pub struct Pos {
    pub page: PageRef,
    pub x: f64,
    pub y: f64,
    pageseq: u32,
    pageseq_distance: f64,
}

impl Pos {
    pub fn new(page: PageRef, x: f64, y: f64) -> Self {
        Self {
            page,
            x,
            y,
            pageseq: 0,
            pageseq_distance: 0.0,
        }
    }

    /// Sequence number of the nearest line or figure (0 = unassigned).
    pub fn pageseq(&self) -> u32 {
        self.pageseq
    }

    /// Is this position within the bounding box of the given component?
    pub fn item_hit(&self, item: &impl HasBBox) -> bool {
        item.contains_point((self.x, self.y))
    }

    /// Adopts `pageseq` if the component contains this position, or is the
    /// closest component offered so far. Returns true on containment.
    pub fn update_pageseq(&mut self, component: &impl HasBBox, pageseq: u32) -> bool {
        debug_assert!(pageseq > 0);
        if self.item_hit(component) {
            self.pageseq = pageseq;
            self.pageseq_distance = 0.0;
            return true;
        }

        let d = component.sq_dist_closest((self.x, self.y));
        if self.pageseq == 0 || self.pageseq_distance > d {
            self.pageseq = pageseq;
            self.pageseq_distance = d;
        }
        false
    }

    /// Forgets `pageseq` if it is the one currently held.
    pub fn discard_pageseq(&mut self, pageseq: u32) {
        if self.pageseq == pageseq {
            self.pageseq = 0;
            self.pageseq_distance = 0.0;
        }
    }

    /// Compares in reading order.
    pub fn cmp_reading_order(&self, other: &Pos) -> Ordering {
        if self.page.pageno != other.page.pageno {
            return self.page.pageno.cmp(&other.page.pageno);
        }

        if let Some(columns) = self.page.fixed_columns.filter(|&n| n > 0) {
            // Fixed layout: left-to-right columns, each read top-to-bottom
            let (scol, sy) = self.page.column_of(columns, (self.x, self.y));
            let (ocol, oy) = self.page.column_of(columns, (other.x, other.y));
            scol.cmp(&ocol).then_with(|| oy.total_cmp(&sy))
        } else if self.pageseq == other.pageseq {
            // On or closest to the same line; assume top-to-bottom left-to-right
            if self.y == other.y {
                self.x.total_cmp(&other.x)
            } else {
                other.y.total_cmp(&self.y)
            }
        } else {
            self.pageseq.cmp(&other.pageseq)
        }
    }
}

impl PartialEq for Pos {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_reading_order(other) == Ordering::Equal
    }
}

impl Eq for Pos {}

impl PartialOrd for Pos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pos {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_reading_order(other)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page #{} ({:.3},{:.3})",
            self.page.pageno + 1,
            self.x,
            self.y
        )
    }
}
