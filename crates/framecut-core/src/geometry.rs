//! Rectangle types shared by every stage of the pipeline
//!
//! Two representations are used: [`RotatedRect`] is what contour fitting
//! produces, [`Rect`] is the axis-aligned integer box the operator edits and
//! the extractor crops. Overlap and clamping logic always works on the
//! axis-aligned bounds.

use serde::{Deserialize, Serialize};

/// Tolerance used when snapping floating-point bounds onto the pixel grid.
const GRID_EPSILON: f32 = 1e-3;

/// A point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Divide both coordinates by `scale` (display space to image space).
    pub fn unscaled(self, scale: f32) -> Self {
        Self::new(self.x / scale, self.y / scale)
    }

    pub fn distance_squared(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

// ============================================================================
// Axis-aligned rectangles
// ============================================================================

/// Axis-aligned rectangle in integer pixel coordinates.
///
/// Width and height are always strictly positive: every constructor returns
/// `None` instead of producing a degenerate rectangle, so code that edits a
/// box keeps the previous value whenever an update would be invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRect")]
pub struct Rect {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

#[derive(Deserialize)]
struct RawRect {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl TryFrom<RawRect> for Rect {
    type Error = String;

    fn try_from(raw: RawRect) -> Result<Self, Self::Error> {
        Rect::new(raw.x, raw.y, raw.width, raw.height).ok_or_else(|| {
            format!(
                "rectangle must have positive size, got {}x{}",
                raw.width, raw.height
            )
        })
    }
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Build a rectangle from its top-left and bottom-right corners.
    pub fn from_corners(left: i32, top: i32, right: i32, bottom: i32) -> Option<Self> {
        Self::new(left, top, right - left, bottom - top)
    }

    /// A `width` x `height` rectangle centered on `center`.
    pub fn centered_at(center: Point, width: i32, height: i32) -> Option<Self> {
        let cx = center.x.floor() as i32;
        let cy = center.y.floor() as i32;
        Self::new(cx - width / 2, cy - height / 2, width, height)
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    /// Long side divided by short side (always >= 1).
    pub fn elongation(&self) -> f32 {
        let long = self.width.max(self.height) as f32;
        let short = self.width.min(self.height) as f32;
        long / short
    }

    /// Inclusive containment test, matching how operators expect clicks on
    /// the outline itself to hit the box.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x as f32
            && point.x <= self.right() as f32
            && point.y >= self.y as f32
            && point.y <= self.bottom() as f32
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        Rect::from_corners(
            self.x.max(other.x),
            self.y.max(other.y),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        )
    }

    /// Intersection-over-union of two rectangles (0.0 when disjoint).
    pub fn iou(&self, other: &Rect) -> f64 {
        let inter = self.intersection(other).map_or(0, |r| r.area());
        if inter == 0 {
            return 0.0;
        }
        let union = self.area() + other.area() - inter;
        inter as f64 / union as f64
    }

    /// Clamp to `[0, width] x [0, height]`; `None` if nothing is left.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Rect> {
        let max_x = i32::try_from(width).unwrap_or(i32::MAX);
        let max_y = i32::try_from(height).unwrap_or(i32::MAX);
        Rect::from_corners(
            self.x.clamp(0, max_x),
            self.y.clamp(0, max_y),
            self.right().clamp(0, max_x),
            self.bottom().clamp(0, max_y),
        )
    }
}

// ============================================================================
// Rotated rectangles
// ============================================================================

/// Rectangle not constrained to the image axes.
///
/// `width` is measured along the direction given by `angle` (degrees,
/// counter-clockwise from the x axis), `height` perpendicular to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotatedRect {
    pub center: Point,
    pub width: f32,
    pub height: f32,
    pub angle: f32,
}

impl RotatedRect {
    /// Rectangle through four corners given in order around it. `width`
    /// runs from the first corner to the second.
    pub fn from_corners(corners: [Point; 4]) -> Self {
        let [a, b, c, d] = corners;
        let (ex, ey) = (b.x - a.x, b.y - a.y);
        Self {
            center: Point::new((a.x + b.x + c.x + d.x) / 4.0, (a.y + b.y + c.y + d.y) / 4.0),
            width: ex.hypot(ey),
            height: (c.x - b.x).hypot(c.y - b.y),
            angle: if ex == 0.0 && ey == 0.0 {
                0.0
            } else {
                ey.atan2(ex).to_degrees()
            },
        }
    }

    /// Move every side outwards by `by` (inwards when negative), keeping
    /// the center and angle. Sides never go below zero.
    pub fn inflate(self, by: f32) -> Self {
        Self {
            width: (self.width + 2.0 * by).max(0.0),
            height: (self.height + 2.0 * by).max(0.0),
            ..self
        }
    }

    pub fn short_side(&self) -> f32 {
        self.width.min(self.height)
    }

    pub fn long_side(&self) -> f32 {
        self.width.max(self.height)
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Corner points, in order around the rectangle.
    pub fn corners(&self) -> [Point; 4] {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        let corner = |sx: f32, sy: f32| {
            Point::new(
                self.center.x + sx * hw * cos - sy * hh * sin,
                self.center.y + sx * hw * sin + sy * hh * cos,
            )
        };
        [
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        ]
    }

    /// Axis-aligned bounds snapped to the pixel grid.
    pub fn bounds(&self) -> Option<Rect> {
        let corners = self.corners();
        let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        for p in &corners {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Rect::from_corners(
            (min_x + GRID_EPSILON).floor() as i32,
            (min_y + GRID_EPSILON).floor() as i32,
            (max_x - GRID_EPSILON).ceil() as i32,
            (max_y - GRID_EPSILON).ceil() as i32,
        )
    }
}

impl From<Rect> for RotatedRect {
    fn from(rect: Rect) -> Self {
        Self {
            center: rect.center(),
            width: rect.width() as f32,
            height: rect.height() as f32,
            angle: 0.0,
        }
    }
}

/// Greedy overlap suppression in input order.
///
/// An item is kept only if the IoU of its bounds with every item kept so far
/// is below `threshold`, so earlier items win. Items without valid bounds are
/// dropped. Applying the function to its own output changes nothing.
pub fn dedup_by_iou<T, F>(items: Vec<T>, threshold: f64, bounds: F) -> Vec<T>
where
    F: Fn(&T) -> Option<Rect>,
{
    let mut kept: Vec<(Rect, T)> = Vec::with_capacity(items.len());
    for item in items {
        let Some(rect) = bounds(&item) else {
            continue;
        };
        if kept.iter().all(|(other, _)| rect.iou(other) < threshold) {
            kept.push((rect, item));
        }
    }
    kept.into_iter().map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Rect {
        Rect::new(x, y, w, h).unwrap()
    }

    #[test]
    fn test_rect_rejects_non_positive_size() {
        assert!(Rect::new(0, 0, 0, 10).is_none());
        assert!(Rect::new(0, 0, 10, -1).is_none());
        assert!(Rect::from_corners(10, 10, 5, 20).is_none());
        assert!(Rect::new(-5, -5, 1, 1).is_some());
    }

    #[test]
    fn test_rect_deserialize_validates_size() {
        let ok: Rect = serde_json::from_str(r#"{"x":1,"y":2,"width":3,"height":4}"#).unwrap();
        assert_eq!(ok, rect(1, 2, 3, 4));
        let bad = serde_json::from_str::<Rect>(r#"{"x":1,"y":2,"width":0,"height":4}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_contains_is_inclusive() {
        let r = rect(10, 10, 20, 20);
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(30.0, 30.0)));
        assert!(!r.contains(Point::new(30.5, 15.0)));
    }

    #[test]
    fn test_iou() {
        let a = rect(0, 0, 10, 10);
        assert!((a.iou(&a) - 1.0).abs() < 1e-9);
        assert_eq!(a.iou(&rect(20, 20, 5, 5)), 0.0);
        // Half overlap: 50 / 150
        let b = rect(5, 0, 10, 10);
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_to_image() {
        let r = rect(-10, -5, 30, 30);
        assert_eq!(r.clamp_to(15, 100), Some(rect(0, 0, 15, 25)));
        assert_eq!(rect(200, 0, 10, 10).clamp_to(100, 100), None);
    }

    #[test]
    fn test_dedup_keeps_earlier_and_is_idempotent() {
        let boxes = vec![
            rect(0, 0, 10, 10),
            rect(1, 1, 10, 10),  // overlaps the first heavily
            rect(50, 50, 10, 10),
            rect(52, 50, 10, 10), // overlaps the third
            rect(8, 0, 10, 10),   // small overlap with the first, kept
        ];
        let once = dedup_by_iou(boxes, 0.5, |r| Some(*r));
        assert_eq!(
            once,
            vec![rect(0, 0, 10, 10), rect(50, 50, 10, 10), rect(8, 0, 10, 10)]
        );
        let twice = dedup_by_iou(once.clone(), 0.5, |r| Some(*r));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rotated_rect_from_axis_corners() {
        let r = RotatedRect::from_corners([
            Point::new(10.0, 20.0),
            Point::new(29.0, 20.0),
            Point::new(29.0, 47.0),
            Point::new(10.0, 47.0),
        ]);
        assert!((r.width - 19.0).abs() < 1e-4);
        assert!((r.height - 27.0).abs() < 1e-4);
        assert!(r.angle.abs() < 1e-4);
        assert_eq!(r.bounds(), Some(rect(10, 20, 19, 27)));
    }

    #[test]
    fn test_rotated_rect_from_tilted_corners() {
        let r = RotatedRect::from_corners([
            Point::new(10.0, 0.0),
            Point::new(20.0, 10.0),
            Point::new(10.0, 20.0),
            Point::new(0.0, 10.0),
        ]);
        let side = 200f32.sqrt();
        assert!((r.width - side).abs() < 1e-3);
        assert!((r.height - side).abs() < 1e-3);
        assert!((r.angle - 45.0).abs() < 1e-3);
        assert_eq!(r.center, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_rotated_rect_from_degenerate_corners() {
        let p = Point::new(3.0, 4.0);
        let line = RotatedRect::from_corners([p, Point::new(9.0, 4.0), Point::new(9.0, 4.0), p]);
        assert_eq!(line.short_side(), 0.0);
        assert!(line.bounds().is_none());
    }

    #[test]
    fn test_inflate_keeps_center_and_stops_at_zero() {
        let r = RotatedRect::from(rect(45, 95, 139, 209));
        let grown = r.inflate(6.0);
        assert_eq!(grown.center, r.center);
        assert_eq!(grown.bounds(), Some(rect(39, 89, 151, 221)));

        let gone = r.inflate(-100.0);
        assert_eq!(gone.short_side(), 0.0);
        assert!((gone.long_side() - 9.0).abs() < 1e-4);
    }
}
