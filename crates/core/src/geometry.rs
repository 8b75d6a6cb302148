//! Axis-aligned box arithmetic in PDF user space (origin at bottom left).

use serde::{Deserialize, Serialize};

use crate::error::{AnnotError, Result};

/// An (x, y) point in PDF coordinates.
pub type Point = (f64, f64);

/// Bounding box coordinates (x0, y0, x1, y1).
pub type Rect = (f64, f64, f64, f64);

/// Trait for objects that have a bounding box.
pub trait HasBBox {
    fn x0(&self) -> f64;
    fn y0(&self) -> f64;
    fn x1(&self) -> f64;
    fn y1(&self) -> f64;

    fn bbox(&self) -> Rect {
        (self.x0(), self.y0(), self.x1(), self.y1())
    }

    fn width(&self) -> f64 {
        self.x1() - self.x0()
    }

    fn height(&self) -> f64 {
        self.y1() - self.y0()
    }

    fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Is the point within (or on the edge of) this bounding box?
    fn contains_point(&self, (px, py): Point) -> bool {
        px >= self.x0() && px <= self.x1() && py >= self.y0() && py <= self.y1()
    }

    /// Computes the closest point in this box to the given point.
    fn closest_point(&self, (px, py): Point) -> Point {
        let (x0, y0, x1, y1) = self.bbox();
        (
            px.clamp(x0.min(x1), x0.max(x1)),
            py.clamp(y0.min(y1), y0.max(y1)),
        )
    }

    /// Squared distance from the point to its closest point in this box.
    fn sq_dist_closest(&self, point: Point) -> f64 {
        let (x, y) = self.closest_point(point);
        let (px, py) = point;
        (px - x).powi(2) + (py - y).powi(2)
    }
}

/// A validated rectangle with `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl BBox {
    /// Creates a box, rejecting inverted or non-finite coordinates.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Result<Self> {
        let finite = x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite();
        if !finite || x0 > x1 || y0 > y1 {
            return Err(AnnotError::InvalidBox { x0, y0, x1, y1 });
        }
        Ok(Self { x0, y0, x1, y1 })
    }

    /// Creates a box from two opposite corners given in any order.
    pub fn normalized(x0: f64, y0: f64, x1: f64, y1: f64) -> Result<Self> {
        Self::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    pub fn from_rect(rect: Rect) -> Result<Self> {
        let (x0, y0, x1, y1) = rect;
        Self::new(x0, y0, x1, y1)
    }

    /// Computes the overlapping area (if any) with another bounding box.
    pub fn overlap_area(&self, other: &impl HasBBox) -> f64 {
        let x_overlap = (self.x1.min(other.x1()) - self.x0.max(other.x0())).max(0.0);
        let y_overlap = (self.y1.min(other.y1()) - self.y0.max(other.y0())).max(0.0);
        x_overlap * y_overlap
    }

    /// Does most of the area of `item` lie inside this box?
    ///
    /// The threshold is half of the item's area, not of this box's: a large
    /// annotation region fully covering a small glyph is a hit, while a small
    /// region inside a large glyph needs to cover half the glyph.
    pub fn hit(&self, item: &impl HasBBox) -> bool {
        let item_area = item.area();
        if item_area <= 0.0 {
            return false;
        }
        let overlap = self.overlap_area(item);
        if overlap > 0.0 {
            tracing::trace!(
                item = ?item.bbox(),
                region = ?self.bbox(),
                percent = 100.0 * overlap / item_area,
                "box hit"
            );
        }
        overlap >= 0.5 * item_area
    }

    /// The top-left corner, assuming left-to-right top-to-bottom text.
    pub fn top_left(&self) -> Point {
        (self.x0, self.y1)
    }
}

impl HasBBox for BBox {
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

impl TryFrom<[f64; 4]> for BBox {
    type Error = AnnotError;

    fn try_from([x0, y0, x1, y1]: [f64; 4]) -> Result<Self> {
        Self::new(x0, y0, x1, y1)
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        [b.x0, b.y0, b.x1, b.y1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x0: f64, y0: f64, x1: f64, y1: f64) -> BBox {
        BBox::new(x0, y0, x1, y1).unwrap()
    }

    #[test]
    fn rejects_inverted_coordinates() {
        assert!(BBox::new(10.0, 0.0, 5.0, 5.0).is_err());
        assert!(BBox::new(0.0, 10.0, 5.0, 5.0).is_err());
        assert!(BBox::new(f64::NAN, 0.0, 5.0, 5.0).is_err());
        let b = BBox::normalized(10.0, 10.0, 0.0, 0.0).unwrap();
        assert_eq!(b.bbox(), (0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn overlap_area_of_disjoint_boxes_is_zero() {
        let a = bbox(0.0, 0.0, 10.0, 10.0);
        assert_eq!(a.overlap_area(&bbox(20.0, 20.0, 30.0, 30.0)), 0.0);
        assert_eq!(a.overlap_area(&bbox(5.0, 5.0, 15.0, 15.0)), 25.0);
    }

    #[test]
    fn hit_is_relative_to_item_area() {
        // Small glyph fully inside a large region: hit.
        let region = bbox(0.0, 0.0, 100.0, 100.0);
        let glyph = bbox(10.0, 10.0, 12.0, 15.0);
        assert!(region.hit(&glyph));

        // Small region inside a large glyph: the region covers 10 of 10,000.
        let region = bbox(10.0, 10.0, 12.0, 15.0);
        let glyph = bbox(0.0, 0.0, 100.0, 100.0);
        assert!(!region.hit(&glyph));

        // Exactly half covered counts.
        let region = bbox(0.0, 0.0, 50.0, 100.0);
        assert!(region.hit(&glyph));
    }

    #[test]
    fn degenerate_items_never_hit() {
        let region = bbox(0.0, 0.0, 100.0, 100.0);
        assert!(!region.hit(&bbox(5.0, 5.0, 5.0, 10.0)));
    }

    #[test]
    fn closest_point_clamps() {
        let b = bbox(0.0, 0.0, 10.0, 10.0);
        assert_eq!(b.closest_point((5.0, 5.0)), (5.0, 5.0));
        assert_eq!(b.closest_point((-3.0, 20.0)), (0.0, 10.0));
        assert_eq!(b.sq_dist_closest((13.0, 14.0)), 9.0 + 16.0);
        assert_eq!(b.sq_dist_closest((5.0, 5.0)), 0.0);
    }
}
