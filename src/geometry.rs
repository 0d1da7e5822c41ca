//! Small geometry helpers shared by the camera, collision and drawing code.
//!
//! Runtime math uses raylib's [`Vector2`] and [`Rectangle`]. The serde
//! structs here ([`Point`], [`Size`], [`Vector`]) are the on-disk shapes
//! used by the JSON asset formats.

use raylib::prelude::{Rectangle, Vector2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer pixel coordinates, e.g. a sprite origin inside a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Integer pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.w, self.h)
    }
}

/// Floating point vector as stored in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
}

impl From<Vector> for Vector2 {
    fn from(v: Vector) -> Self {
        Vector2::new(v.x, v.y)
    }
}

/// Min/max style helpers on top of raylib's x/y/width/height rectangle.
pub trait RectangleExt {
    fn from_min_max(min: Vector2, max: Vector2) -> Self
    where
        Self: Sized;
    fn min(&self) -> Vector2;
    fn max(&self) -> Vector2;
    fn center(&self) -> Vector2;
    /// True when the rectangle has no area.
    fn is_empty(&self) -> bool;
    /// Half-open containment `[min, max)`, with the max corner itself also
    /// accepted. Other points on the max edges are outside.
    fn contains_or_on_max(&self, p: Vector2) -> bool;
    /// Strict overlap: rectangles that only share an edge do not overlap.
    fn overlaps(&self, other: &Rectangle) -> bool;
    /// Overlap that also accepts shared edges and corners.
    fn touches(&self, other: &Rectangle) -> bool;
    fn union(&self, other: &Rectangle) -> Rectangle;
    fn intersect(&self, other: &Rectangle) -> Option<Rectangle>;
    fn translated(&self, d: Vector2) -> Rectangle;
}

impl RectangleExt for Rectangle {
    fn from_min_max(min: Vector2, max: Vector2) -> Self {
        Rectangle::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    fn min(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    fn max(&self) -> Vector2 {
        Vector2::new(self.x + self.width, self.y + self.height)
    }

    fn center(&self) -> Vector2 {
        Vector2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    fn contains_or_on_max(&self, p: Vector2) -> bool {
        let max = self.max();
        let inside = self.x <= p.x && p.x < max.x && self.y <= p.y && p.y < max.y;
        inside || p == max
    }

    fn overlaps(&self, other: &Rectangle) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    fn touches(&self, other: &Rectangle) -> bool {
        self.x <= other.x + other.width
            && self.x + self.width >= other.x
            && self.y <= other.y + other.height
            && self.y + self.height >= other.y
    }

    fn union(&self, other: &Rectangle) -> Rectangle {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        Rectangle::from_min_max(
            Vector2::new(a_min.x.min(b_min.x), a_min.y.min(b_min.y)),
            Vector2::new(a_max.x.max(b_max.x), a_max.y.max(b_max.y)),
        )
    }

    fn intersect(&self, other: &Rectangle) -> Option<Rectangle> {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        let r = Rectangle::from_min_max(
            Vector2::new(a_min.x.max(b_min.x), a_min.y.max(b_min.y)),
            Vector2::new(a_max.x.min(b_max.x), a_max.y.min(b_max.y)),
        );
        if r.is_empty() { None } else { Some(r) }
    }

    fn translated(&self, d: Vector2) -> Rectangle {
        Rectangle::new(self.x + d.x, self.y + d.y, self.width, self.height)
    }
}
