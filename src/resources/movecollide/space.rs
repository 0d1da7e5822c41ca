//! Uniform grid spatial index for collision shapes.
//!
//! Every collider is stored in a slot map and listed in each grid cell its
//! bounding box touches. Queries only test shapes found in the cells
//! covered by the query area.
//!
//! Movement is two phase: [`CollisionSpace::would_be_collided_by`] reports
//! contacts for a hypothetical displacement without changing anything, then
//! the caller applies the displacement it settled on with
//! [`CollisionSpace::translate`] and re-indexes with
//! [`CollisionSpace::update`].

use crate::geometry::RectangleExt;
use crate::resources::movecollide::shape::Shape;
use log::trace;
use raylib::prelude::{Rectangle, Vector2};
use rustc_hash::FxHashMap;
use slotmap::{SecondaryMap, SlotMap, new_key_type};
use smallvec::SmallVec;
use thiserror::Error;

new_key_type! {
    /// Handle of a collider inside a [`CollisionSpace`].
    pub struct ShapeKey;
}

/// Identity bit of sensor shapes.
pub const TRIGGER: u32 = 1 << 0;
/// Identity bit of physical shapes, including world boundaries.
pub const COLLIDER: u32 = 1 << 1;
pub const ALL: u32 = u32::MAX;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollisionError {
    #[error("collision space bounds {width} x {height} must be positive")]
    InvalidBounds { width: f32, height: f32 },
    #[error("collision space needs at least one subdivision")]
    NoSubdivisions,
    #[error("shape {0:?} is not in the collision space")]
    UnknownShape(ShapeKey),
    #[error("shape at ({x}, {y}) lies outside the collision space")]
    OutOfBounds { x: f32, y: f32 },
    #[error("ray direction must be non-zero")]
    ZeroDirection,
    #[error("ray distance {0} must be positive")]
    InvalidDistance(f32),
}

/// What a collider belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColliderData {
    /// A registered entity id.
    Entity(String),
    /// A world edge: "north", "south", "east" or "west".
    Boundary(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    pub shape: Shape,
    /// Category bits of this collider.
    pub identity: u32,
    /// Categories this collider interacts with.
    pub mask: u32,
    pub data: ColliderData,
}

impl Collider {
    pub fn new(shape: Shape, identity: u32, mask: u32, data: ColliderData) -> Self {
        Self {
            shape,
            identity,
            mask,
            data,
        }
    }

    /// Both sides must accept each other's category.
    pub fn interacts_with(&self, other: &Collider) -> bool {
        self.mask & other.identity != 0 && other.mask & self.identity != 0
    }
}

/// Another collider reported by a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub key: ShapeKey,
    pub identity: u32,
    pub shape: Shape,
    pub data: ColliderData,
}

impl Contact {
    fn from_collider(key: ShapeKey, c: &Collider) -> Self {
        Self {
            key,
            identity: c.identity,
            shape: c.shape,
            data: c.data.clone(),
        }
    }

    /// Entity id of the contact, `None` for world boundaries.
    pub fn entity_id(&self) -> Option<&str> {
        match &self.data {
            ColliderData::Entity(id) => Some(id),
            ColliderData::Boundary(_) => None,
        }
    }
}

/// Closest collider hit by a ray.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeHit {
    pub key: ShapeKey,
    pub data: ColliderData,
    pub position: Vector2,
    pub distance: f32,
}

type Cell = (i32, i32);

pub struct CollisionSpace {
    bounds: Rectangle,
    cell_size: f32,
    colliders: SlotMap<ShapeKey, Collider>,
    cells: FxHashMap<Cell, SmallVec<[ShapeKey; 4]>>,
    occupied: SecondaryMap<ShapeKey, SmallVec<[Cell; 4]>>,
}

impl CollisionSpace {
    /// `bounds` is split into `subdivisions` cells along its longer side.
    pub fn new(bounds: Rectangle, subdivisions: u32) -> Result<Self, CollisionError> {
        if bounds.is_empty() {
            return Err(CollisionError::InvalidBounds {
                width: bounds.width,
                height: bounds.height,
            });
        }
        if subdivisions == 0 {
            return Err(CollisionError::NoSubdivisions);
        }
        Ok(Self {
            bounds,
            cell_size: bounds.width.max(bounds.height) / subdivisions as f32,
            colliders: SlotMap::with_key(),
            cells: FxHashMap::default(),
            occupied: SecondaryMap::new(),
        })
    }

    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn get(&self, key: ShapeKey) -> Option<&Collider> {
        self.colliders.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShapeKey, &Collider)> {
        self.colliders.iter()
    }

    pub fn insert(&mut self, collider: Collider) -> Result<ShapeKey, CollisionError> {
        self.check_bounds(&collider.shape)?;
        let key = self.colliders.insert(collider);
        self.index(key);
        Ok(key)
    }

    pub fn remove(&mut self, key: ShapeKey) -> Option<Collider> {
        self.unindex(key);
        self.colliders.remove(key)
    }

    /// Contacts `key` would have after moving by `displacement`.
    ///
    /// A contact is any collider of a category in `mask` that the moved
    /// shape overlaps, or that the shape passes through on its way there
    /// without overlapping it now. The second rule keeps fast movers from
    /// passing through thin obstacles.
    pub fn would_be_collided_by(
        &self,
        key: ShapeKey,
        displacement: Vector2,
        mask: u32,
    ) -> Result<Vec<Contact>, CollisionError> {
        let mover = self
            .colliders
            .get(key)
            .ok_or(CollisionError::UnknownShape(key))?;
        let current = mover.shape;
        let moved = current.translated(displacement);
        let swept = current.aabb().union(&moved.aabb());
        let sweeping = displacement.x != 0.0 || displacement.y != 0.0;

        let contacts = self
            .candidates(swept)
            .into_iter()
            .filter(|&other| other != key)
            .filter_map(|other| self.colliders.get(other).map(|c| (other, c)))
            .filter(|(_, c)| c.identity & mask != 0 && mover.interacts_with(c))
            .filter(|(_, c)| {
                moved.overlaps(&c.shape)
                    || (sweeping
                        && !current.overlaps(&c.shape)
                        && current.sweep_overlaps(displacement, &c.shape))
            })
            .map(|(other, c)| Contact::from_collider(other, c))
            .collect::<Vec<_>>();
        trace!("{} contacts for {:?}", contacts.len(), key);
        Ok(contacts)
    }

    /// Colliders of a category in `mask` overlapping `key` where it is now.
    pub fn overlapping(&self, key: ShapeKey, mask: u32) -> Result<Vec<Contact>, CollisionError> {
        self.would_be_collided_by(key, Vector2::zero(), mask)
    }

    /// Move a shape without re-indexing it; call [`CollisionSpace::update`]
    /// afterwards.
    pub fn translate(&mut self, key: ShapeKey, displacement: Vector2) -> Result<(), CollisionError> {
        let collider = self
            .colliders
            .get_mut(key)
            .ok_or(CollisionError::UnknownShape(key))?;
        collider.shape.translate(displacement);
        Ok(())
    }

    /// Re-index a shape after it moved. Fails if it left the space.
    pub fn update(&mut self, key: ShapeKey) -> Result<(), CollisionError> {
        let collider = self
            .colliders
            .get(key)
            .ok_or(CollisionError::UnknownShape(key))?;
        self.check_bounds(&collider.shape)?;
        self.unindex(key);
        self.index(key);
        Ok(())
    }

    /// First collider of a category in `mask` hit by the segment from
    /// `origin` along `direction` for `distance` units.
    pub fn raycast(
        &self,
        origin: Vector2,
        direction: Vector2,
        distance: f32,
        mask: u32,
    ) -> Result<Option<ShapeHit>, CollisionError> {
        let len = (direction.x * direction.x + direction.y * direction.y).sqrt();
        if len == 0.0 || len.is_nan() {
            return Err(CollisionError::ZeroDirection);
        }
        if distance.is_nan() || distance <= 0.0 {
            return Err(CollisionError::InvalidDistance(distance));
        }
        let end = Vector2::new(
            origin.x + direction.x / len * distance,
            origin.y + direction.y / len * distance,
        );
        let area = Shape::line(origin, end).aabb();

        let mut best: Option<(f32, ShapeKey)> = None;
        for key in self.candidates(area) {
            let Some(c) = self.colliders.get(key) else {
                continue;
            };
            if c.identity & mask == 0 {
                continue;
            }
            if let Some(t) = c.shape.ray_entry(origin, end) {
                if best.is_none_or(|(bt, _)| t < bt) {
                    best = Some((t, key));
                }
            }
        }

        Ok(best.and_then(|(t, key)| {
            let c = self.colliders.get(key)?;
            Some(ShapeHit {
                key,
                data: c.data.clone(),
                position: Vector2::new(origin.x + (end.x - origin.x) * t, origin.y + (end.y - origin.y) * t),
                distance: t * distance,
            })
        }))
    }

    fn check_bounds(&self, shape: &Shape) -> Result<(), CollisionError> {
        if shape.aabb().touches(&self.bounds) {
            Ok(())
        } else {
            let p = shape.position();
            Err(CollisionError::OutOfBounds { x: p.x, y: p.y })
        }
    }

    fn cells_of(&self, area: Rectangle) -> CellRange {
        let Some(area) = area_within(area, self.bounds) else {
            return CellRange::empty();
        };
        let cs = self.cell_size;
        let min = area.min();
        let max = area.max();
        CellRange::new(
            ((min.x / cs).floor() as i32, (min.y / cs).floor() as i32),
            ((max.x / cs).floor() as i32, (max.y / cs).floor() as i32),
        )
    }

    fn candidates(&self, area: Rectangle) -> SmallVec<[ShapeKey; 16]> {
        let mut out: SmallVec<[ShapeKey; 16]> = SmallVec::new();
        for cell in self.cells_of(area) {
            if let Some(keys) = self.cells.get(&cell) {
                out.extend(keys.iter().copied());
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    fn index(&mut self, key: ShapeKey) {
        let Some(collider) = self.colliders.get(key) else {
            return;
        };
        let cells: SmallVec<[Cell; 4]> = self.cells_of(collider.shape.aabb()).collect();
        for cell in &cells {
            self.cells.entry(*cell).or_default().push(key);
        }
        self.occupied.insert(key, cells);
    }

    fn unindex(&mut self, key: ShapeKey) {
        let Some(cells) = self.occupied.remove(key) else {
            return;
        };
        for cell in cells {
            if let Some(keys) = self.cells.get_mut(&cell) {
                keys.retain(|k| *k != key);
                if keys.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
    }
}

/// Clip `area` to `bounds`, keeping degenerate (zero width or height)
/// results so lines still map to cells.
fn area_within(area: Rectangle, bounds: Rectangle) -> Option<Rectangle> {
    if !area.touches(&bounds) {
        return None;
    }
    let (a_min, a_max) = (area.min(), area.max());
    let (b_min, b_max) = (bounds.min(), bounds.max());
    Some(Rectangle::from_min_max(
        Vector2::new(a_min.x.max(b_min.x), a_min.y.max(b_min.y)),
        Vector2::new(a_max.x.min(b_max.x), a_max.y.min(b_max.y)),
    ))
}

/// Row-major iterator over an inclusive range of cells.
struct CellRange {
    min: Cell,
    max: Cell,
    next: Option<Cell>,
}

impl CellRange {
    fn new(min: Cell, max: Cell) -> Self {
        Self {
            min,
            max,
            next: Some(min),
        }
    }

    fn empty() -> Self {
        Self {
            min: (0, 0),
            max: (0, 0),
            next: None,
        }
    }
}

impl Iterator for CellRange {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        let cur = self.next?;
        self.next = if cur.0 < self.max.0 {
            Some((cur.0 + 1, cur.1))
        } else if cur.1 < self.max.1 {
            Some((self.min.0, cur.1 + 1))
        } else {
            None
        };
        Some(cur)
    }
}
