//! Collision shapes and their intersection tests.
//!
//! Overlap tests are strict: shapes that only touch along an edge or at a
//! point do not overlap. Ray tests are inclusive so a ray grazing a shape
//! still reports it.

use crate::geometry::RectangleExt;
use raylib::prelude::{Rectangle, Vector2};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Rect(Rectangle),
    Circle { center: Vector2, radius: f32 },
    Line { a: Vector2, b: Vector2 },
}

impl Shape {
    pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Shape::Rect(Rectangle::new(x, y, width, height))
    }

    pub fn circle(center: Vector2, radius: f32) -> Self {
        Shape::Circle { center, radius }
    }

    pub fn line(a: Vector2, b: Vector2) -> Self {
        Shape::Line { a, b }
    }

    /// Axis aligned bounding box.
    pub fn aabb(&self) -> Rectangle {
        match *self {
            Shape::Rect(r) => r,
            Shape::Circle { center, radius } => Rectangle::new(
                center.x - radius,
                center.y - radius,
                radius * 2.0,
                radius * 2.0,
            ),
            Shape::Line { a, b } => Rectangle::from_min_max(
                Vector2::new(a.x.min(b.x), a.y.min(b.y)),
                Vector2::new(a.x.max(b.x), a.y.max(b.y)),
            ),
        }
    }

    /// Reference point: rectangle min corner, circle center or line start.
    pub fn position(&self) -> Vector2 {
        match *self {
            Shape::Rect(r) => r.min(),
            Shape::Circle { center, .. } => center,
            Shape::Line { a, .. } => a,
        }
    }

    pub fn translate(&mut self, d: Vector2) {
        *self = self.translated(d);
    }

    pub fn translated(&self, d: Vector2) -> Shape {
        match *self {
            Shape::Rect(r) => Shape::Rect(r.translated(d)),
            Shape::Circle { center, radius } => Shape::Circle {
                center: center + d,
                radius,
            },
            Shape::Line { a, b } => Shape::Line { a: a + d, b: b + d },
        }
    }

    pub fn overlaps(&self, other: &Shape) -> bool {
        use Shape::*;
        match (*self, *other) {
            (Rect(a), Rect(b)) => a.overlaps(&b),
            (Circle { center: c1, radius: r1 }, Circle { center: c2, radius: r2 }) => {
                dist_sqr(c1, c2) < (r1 + r2) * (r1 + r2)
            }
            (Rect(r), Circle { center, radius }) | (Circle { center, radius }, Rect(r)) => {
                rect_circle(r, center, radius)
            }
            (Line { a, b }, Rect(r)) | (Rect(r), Line { a, b }) => segment_rect(a, b, r),
            (Line { a, b }, Circle { center, radius }) | (Circle { center, radius }, Line { a, b }) => {
                point_segment_dist_sqr(center, a, b) < radius * radius
            }
            (Line { a: a1, b: b1 }, Line { a: a2, b: b2 }) => segments_cross(a1, b1, a2, b2),
        }
    }

    /// Whether moving this shape by `d` overlaps `other` at any point of
    /// the move, both ends included.
    ///
    /// A moving circle is a capsule around its center's path. Moving a
    /// polygon past a circle is the circle moving the opposite way.
    /// Rectangles and lines sweep a convex hull, tested with separating
    /// axes.
    pub fn sweep_overlaps(&self, d: Vector2, other: &Shape) -> bool {
        match (*self, *other) {
            (Shape::Circle { center, radius }, _) => other.near_segment(center, center + d, radius),
            (_, Shape::Circle { center, radius }) => self.near_segment(center, center - d, radius),
            _ => {
                let (points, mut axes) = self.polygon();
                let swept: SmallVec<[Vector2; 8]> =
                    points.iter().copied().chain(points.iter().map(|&p| p + d)).collect();
                let (other_points, other_axes) = other.polygon();
                axes.extend(other_axes);
                axes.push(perp(d));
                !axes
                    .into_iter()
                    .any(|axis| separated(axis, &swept, &other_points))
            }
        }
    }

    /// Whether the segment `a..b` comes closer than `radius` to the
    /// interior of this shape.
    fn near_segment(&self, a: Vector2, b: Vector2, radius: f32) -> bool {
        let r2 = radius * radius;
        match *self {
            Shape::Rect(r) => {
                let wide = Rectangle::new(r.x - radius, r.y, r.width + 2.0 * radius, r.height);
                let tall = Rectangle::new(r.x, r.y - radius, r.width, r.height + 2.0 * radius);
                let max = r.max();
                segment_rect(a, b, wide)
                    || segment_rect(a, b, tall)
                    || [r.min(), Vector2::new(max.x, r.y), max, Vector2::new(r.x, max.y)]
                        .into_iter()
                        .any(|c| point_segment_dist_sqr(c, a, b) < r2)
            }
            Shape::Circle { center, radius: own } => {
                point_segment_dist_sqr(center, a, b) < (own + radius) * (own + radius)
            }
            Shape::Line { a: la, b: lb } => {
                segments_cross(a, b, la, lb)
                    || point_segment_dist_sqr(la, a, b) < r2
                    || point_segment_dist_sqr(lb, a, b) < r2
                    || point_segment_dist_sqr(a, la, lb) < r2
                    || point_segment_dist_sqr(b, la, lb) < r2
            }
        }
    }

    /// Vertices and edge normals of a rectangle or line. A circle yields
    /// its bounding box.
    fn polygon(&self) -> (SmallVec<[Vector2; 4]>, SmallVec<[Vector2; 4]>) {
        match *self {
            Shape::Line { a, b } => (
                SmallVec::from_slice(&[a, b]),
                SmallVec::from_slice(&[perp(b - a)]),
            ),
            _ => {
                let r = self.aabb();
                let max = r.max();
                (
                    SmallVec::from_slice(&[r.min(), Vector2::new(max.x, r.y), max, Vector2::new(r.x, max.y)]),
                    SmallVec::from_slice(&[Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)]),
                )
            }
        }
    }

    /// Parameter `t` in `[0, 1]` where the segment `from..to` first meets
    /// this shape, `0` when `from` is already inside.
    pub fn ray_entry(&self, from: Vector2, to: Vector2) -> Option<f32> {
        match *self {
            Shape::Rect(r) => clip_segment(r, from, to).map(|(t0, _)| t0),
            Shape::Circle { center, radius } => segment_circle_entry(from, to, center, radius),
            Shape::Line { a, b } => segment_intersection(from, to, a, b),
        }
    }
}

fn dist_sqr(a: Vector2, b: Vector2) -> f32 {
    let (dx, dy) = (a.x - b.x, a.y - b.y);
    dx * dx + dy * dy
}

fn perp(v: Vector2) -> Vector2 {
    Vector2::new(-v.y, v.x)
}

/// `axis` strictly separates the two point sets. Touching projections
/// count as separated; a zero axis separates nothing.
fn separated(axis: Vector2, a: &[Vector2], b: &[Vector2]) -> bool {
    if axis.x == 0.0 && axis.y == 0.0 {
        return false;
    }
    let project = |points: &[Vector2]| {
        points.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
            let d = p.x * axis.x + p.y * axis.y;
            (lo.min(d), hi.max(d))
        })
    };
    let (a_min, a_max) = project(a);
    let (b_min, b_max) = project(b);
    a_max <= b_min || b_max <= a_min
}

fn cross(o: Vector2, a: Vector2, b: Vector2) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn rect_circle(r: Rectangle, center: Vector2, radius: f32) -> bool {
    let closest = Vector2::new(
        center.x.clamp(r.x, r.x + r.width),
        center.y.clamp(r.y, r.y + r.height),
    );
    dist_sqr(center, closest) < radius * radius
}

fn point_segment_dist_sqr(p: Vector2, a: Vector2, b: Vector2) -> f32 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let len_sqr = abx * abx + aby * aby;
    if len_sqr == 0.0 {
        return dist_sqr(p, a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sqr).clamp(0.0, 1.0);
    dist_sqr(p, Vector2::new(a.x + abx * t, a.y + aby * t))
}

/// Proper crossing of two segments; touching or collinear segments do not count.
fn segments_cross(a1: Vector2, b1: Vector2, a2: Vector2, b2: Vector2) -> bool {
    let d1 = cross(a2, b2, a1);
    let d2 = cross(a2, b2, b1);
    let d3 = cross(a1, b1, a2);
    let d4 = cross(a1, b1, b2);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

/// Liang-Barsky clip of the segment `a..b` against the closed rectangle.
fn clip_segment(r: Rectangle, a: Vector2, b: Vector2) -> Option<(f32, f32)> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    let edges = [
        (-dx, a.x - r.x),
        (dx, r.x + r.width - a.x),
        (-dy, a.y - r.y),
        (dy, r.y + r.height - a.y),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > t1 {
                return None;
            }
            t0 = t0.max(t);
        } else {
            if t < t0 {
                return None;
            }
            t1 = t1.min(t);
        }
    }
    Some((t0, t1))
}

/// The segment passes through the rectangle interior.
fn segment_rect(a: Vector2, b: Vector2, r: Rectangle) -> bool {
    let Some((t0, t1)) = clip_segment(r, a, b) else {
        return false;
    };
    let t = (t0 + t1) / 2.0;
    let mid = Vector2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t);
    r.x < mid.x && mid.x < r.x + r.width && r.y < mid.y && mid.y < r.y + r.height
}

fn segment_circle_entry(from: Vector2, to: Vector2, center: Vector2, radius: f32) -> Option<f32> {
    if dist_sqr(from, center) <= radius * radius {
        return Some(0.0);
    }
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let (fx, fy) = (from.x - center.x, from.y - center.y);
    let a = dx * dx + dy * dy;
    if a == 0.0 {
        return None;
    }
    let b = 2.0 * (fx * dx + fy * dy);
    let c = fx * fx + fy * fy - radius * radius;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t).then_some(t)
}

fn segment_intersection(p: Vector2, p2: Vector2, q: Vector2, q2: Vector2) -> Option<f32> {
    let (rx, ry) = (p2.x - p.x, p2.y - p.y);
    let (sx, sy) = (q2.x - q.x, q2.y - q.y);
    let denom = rx * sy - ry * sx;
    if denom == 0.0 {
        return None;
    }
    let (qpx, qpy) = (q.x - p.x, q.y - p.y);
    let t = (qpx * sy - qpy * sx) / denom;
    let u = (qpx * ry - qpy * rx) / denom;
    ((0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> Vector2 {
        Vector2::new(x, y)
    }

    #[test]
    fn rect_overlaps_are_strict() {
        let a = Shape::rect(0.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(&Shape::rect(5.0, 5.0, 10.0, 10.0)));
        assert!(!a.overlaps(&Shape::rect(10.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn circle_overlaps() {
        let c = Shape::circle(v(0.0, 0.0), 5.0);
        assert!(c.overlaps(&Shape::circle(v(9.0, 0.0), 5.0)));
        assert!(!c.overlaps(&Shape::circle(v(10.0, 0.0), 5.0)));
        assert!(c.overlaps(&Shape::rect(4.0, -1.0, 2.0, 2.0)));
        assert!(!Shape::rect(4.0, 4.0, 2.0, 2.0).overlaps(&c));
    }

    #[test]
    fn line_against_rect_needs_interior() {
        let wall = Shape::line(v(0.0, 100.0), v(0.0, 0.0));
        assert!(wall.overlaps(&Shape::rect(-5.0, 5.0, 10.0, 10.0)));
        // Flush against the line is not an overlap.
        assert!(!wall.overlaps(&Shape::rect(0.0, 5.0, 10.0, 10.0)));
        assert!(!Shape::rect(1.0, 5.0, 10.0, 10.0).overlaps(&wall));
    }

    #[test]
    fn line_against_circle_and_line() {
        let wall = Shape::line(v(0.0, 0.0), v(10.0, 0.0));
        assert!(wall.overlaps(&Shape::circle(v(5.0, 1.0), 2.0)));
        assert!(!wall.overlaps(&Shape::circle(v(5.0, 2.0), 2.0)));
        assert!(wall.overlaps(&Shape::line(v(5.0, -1.0), v(5.0, 1.0))));
        assert!(!wall.overlaps(&Shape::line(v(5.0, 0.0), v(5.0, 1.0))));
    }

    #[test]
    fn aabb_and_translation() {
        let l = Shape::line(v(10.0, 0.0), v(0.0, 5.0));
        assert_eq!(l.aabb(), Rectangle::new(0.0, 0.0, 10.0, 5.0));
        let c = Shape::circle(v(1.0, 1.0), 1.0).translated(v(2.0, 3.0));
        assert_eq!(c.position(), v(3.0, 4.0));
        assert_eq!(c.aabb(), Rectangle::new(2.0, 3.0, 2.0, 2.0));
    }

    #[test]
    fn diagonal_sweep_misses_shapes_off_its_path() {
        let mover = Shape::rect(20.0, 20.0, 10.0, 10.0);
        let d = v(20.0, 20.0);
        // Inside the bounding box of the move, but never crossed.
        assert!(!mover.sweep_overlaps(d, &Shape::rect(40.0, 20.0, 5.0, 5.0)));
        assert!(!mover.sweep_overlaps(d, &Shape::circle(v(45.0, 22.0), 2.0)));
        assert!(!mover.sweep_overlaps(d, &Shape::line(v(42.0, 20.0), v(48.0, 26.0))));
        // On the path.
        assert!(mover.sweep_overlaps(d, &Shape::rect(33.0, 33.0, 2.0, 2.0)));
        assert!(mover.sweep_overlaps(d, &Shape::circle(v(35.0, 35.0), 1.0)));
        assert!(mover.sweep_overlaps(d, &Shape::line(v(30.0, 40.0), v(40.0, 30.0))));
    }

    #[test]
    fn circle_sweeps_are_capsules() {
        let ball = Shape::circle(v(0.0, 0.0), 5.0);
        let d = v(100.0, 0.0);
        assert!(ball.sweep_overlaps(d, &Shape::rect(50.0, 4.0, 2.0, 2.0)));
        assert!(!ball.sweep_overlaps(d, &Shape::rect(50.0, 5.0, 2.0, 2.0)));
        assert!(ball.sweep_overlaps(d, &Shape::circle(v(50.0, 9.0), 5.0)));
        assert!(!ball.sweep_overlaps(d, &Shape::circle(v(50.0, 10.0), 5.0)));
        assert!(ball.sweep_overlaps(d, &Shape::line(v(60.0, -10.0), v(60.0, 10.0))));
        // Rounded corner: (103, 3) is within 5 of the end center, (104, 4) is not.
        assert!(ball.sweep_overlaps(d, &Shape::rect(103.0, 3.0, 10.0, 10.0)));
        assert!(!ball.sweep_overlaps(d, &Shape::rect(104.0, 4.0, 10.0, 10.0)));
    }

    #[test]
    fn sweeping_is_strict_like_overlap() {
        let mover = Shape::rect(0.0, 0.0, 10.0, 10.0);
        // Sliding along a wall does not hit it.
        assert!(!mover.sweep_overlaps(v(50.0, 0.0), &Shape::line(v(0.0, 10.0), v(100.0, 10.0))));
        assert!(!mover.sweep_overlaps(v(50.0, 0.0), &Shape::rect(20.0, 10.0, 5.0, 5.0)));
        // No displacement is a plain overlap test.
        let other = Shape::rect(5.0, 5.0, 10.0, 10.0);
        assert_eq!(mover.sweep_overlaps(v(0.0, 0.0), &other), mover.overlaps(&other));
    }

    #[test]
    fn ray_entry_points() {
        let from = v(0.0, 5.0);
        let to = v(100.0, 5.0);
        assert_eq!(Shape::rect(50.0, 0.0, 10.0, 10.0).ray_entry(from, to), Some(0.5));
        assert_eq!(Shape::circle(v(30.0, 5.0), 5.0).ray_entry(from, to), Some(0.25));
        assert_eq!(Shape::line(v(80.0, 0.0), v(80.0, 10.0)).ray_entry(from, to), Some(0.8));
        assert_eq!(Shape::rect(50.0, 20.0, 10.0, 10.0).ray_entry(from, to), None);
        assert_eq!(Shape::rect(-5.0, 0.0, 10.0, 10.0).ray_entry(from, to), Some(0.0));
    }
}
