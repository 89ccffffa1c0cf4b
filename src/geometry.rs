//! Pointer-space geometry
//!
//! Points, velocities and axis-aligned rectangles share one coordinate space
//! (the host's pointer coordinates, typically CSS pixels relative to the
//! viewport).
//!
//! # Distance to a rectangle
//!
//! ```text
//! closest = (clamp(p.x, left, right), clamp(p.y, top, bottom))
//! distance = |p - closest|
//! ```
//!
//! A point inside (or on the edge of) the rectangle is at distance zero.

use serde::{Deserialize, Serialize};

/// A position in pointer space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The origin, which hosts report before the pointer has moved
    pub const ORIGIN: Point = Point::new(0.0, 0.0);

    /// Check if this point is exactly the origin
    pub fn is_origin(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Project this point along a velocity scaled by `factor`
    pub fn project(&self, velocity: Velocity, factor: f64) -> Point {
        Point {
            x: self.x + velocity.vx * factor,
            y: self.y + velocity.vy * factor,
        }
    }
}

/// Per-update displacement of the pointer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    /// Horizontal displacement since the previous update
    pub vx: f64,
    /// Vertical displacement since the previous update
    pub vy: f64,
}

impl Velocity {
    /// No motion
    pub const ZERO: Velocity = Velocity { vx: 0.0, vy: 0.0 };

    /// First difference between two samples
    pub fn between(previous: Point, current: Point) -> Self {
        Self {
            vx: current.x - previous.x,
            vy: current.y - previous.y,
        }
    }

    /// Magnitude of the velocity vector
    pub fn speed(&self) -> f64 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }
}

/// Axis-aligned bounding rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub left: f64,
    /// Top edge
    pub top: f64,
    /// Right edge
    pub right: f64,
    /// Bottom edge
    pub bottom: f64,
}

impl Rect {
    /// Create a rectangle from its edges
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a rectangle from origin and size
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Width of the rectangle
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Height of the rectangle
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Check if a point lies inside or on the edge
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Closest point on (or in) the rectangle to `p`, by per-axis clamping
    ///
    /// Uses `max(lo, min(v, hi))` rather than `f64::clamp` so degenerate
    /// rectangles (`left > right`) never panic.
    pub fn closest_point(&self, p: Point) -> Point {
        Point {
            x: self.left.max(p.x.min(self.right)),
            y: self.top.max(p.y.min(self.bottom)),
        }
    }

    /// Euclidean distance from `p` to the closest point of the rectangle
    pub fn distance_to(&self, p: Point) -> f64 {
        p.distance_to(self.closest_point(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_closest_point_outside() {
        let rect = Rect::new(200.0, 0.0, 300.0, 100.0);
        let closest = rect.closest_point(Point::new(20.0, 50.0));
        assert_eq!(closest, Point::new(200.0, 50.0));
        assert_eq!(rect.distance_to(Point::new(20.0, 50.0)), 180.0);
    }

    #[test]
    fn test_closest_point_inside() {
        let rect = Rect::new(200.0, 0.0, 300.0, 100.0);
        let p = Point::new(290.0, 50.0);
        assert_eq!(rect.closest_point(p), p);
        assert_eq!(rect.distance_to(p), 0.0);
    }

    #[test]
    fn test_corner_distance() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        // 3-4-5 triangle off the bottom-right corner
        assert_eq!(rect.distance_to(Point::new(13.0, 14.0)), 5.0);
    }

    #[test]
    fn test_degenerate_rect_does_not_panic() {
        let rect = Rect::new(10.0, 10.0, 0.0, 0.0);
        let d = rect.distance_to(Point::new(5.0, 5.0));
        assert!(d.is_finite());
    }

    #[test]
    fn test_velocity_and_projection() {
        let v = Velocity::between(Point::new(0.0, 50.0), Point::new(10.0, 50.0));
        assert_eq!(v, Velocity { vx: 10.0, vy: 0.0 });
        assert_eq!(v.speed(), 10.0);

        let projected = Point::new(10.0, 50.0).project(v, 1.0);
        assert_eq!(projected, Point::new(20.0, 50.0));

        let projected = Point::new(10.0, 50.0).project(v, 0.5);
        assert_eq!(projected, Point::new(15.0, 50.0));
    }

    #[test]
    fn test_origin_detection() {
        assert!(Point::ORIGIN.is_origin());
        assert!(!Point::new(0.0, 1.0).is_origin());
    }

    #[test]
    fn test_from_origin_size() {
        let rect = Rect::from_origin_size(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect, Rect::new(10.0, 20.0, 40.0, 60.0));
        assert_eq!(rect.width(), 30.0);
        assert_eq!(rect.height(), 40.0);
    }

    proptest! {
        #[test]
        fn prop_closest_point_lies_in_rect(
            left in -1000.0f64..1000.0,
            top in -1000.0f64..1000.0,
            w in 0.0f64..500.0,
            h in 0.0f64..500.0,
            px in -3000.0f64..3000.0,
            py in -3000.0f64..3000.0,
        ) {
            let rect = Rect::from_origin_size(left, top, w, h);
            let closest = rect.closest_point(Point::new(px, py));
            prop_assert!(rect.contains(closest));
        }

        #[test]
        fn prop_distance_zero_iff_inside(
            left in -1000.0f64..1000.0,
            top in -1000.0f64..1000.0,
            w in 0.0f64..500.0,
            h in 0.0f64..500.0,
            px in -3000.0f64..3000.0,
            py in -3000.0f64..3000.0,
        ) {
            let rect = Rect::from_origin_size(left, top, w, h);
            let p = Point::new(px, py);
            prop_assert_eq!(rect.distance_to(p) == 0.0, rect.contains(p));
        }
    }
}
