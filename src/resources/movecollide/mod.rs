//! Movement with collision resolution and trigger zones.
//!
//! Objects take part by registering capabilities under an id:
//!
//! - [`Movable`] plans a displacement each tick and applies the one it is
//!   finally allowed.
//! - [`Collidable`] owns a physical shape. When a planned move would make
//!   it collide, it is asked to resolve the collision into an adjusted
//!   displacement.
//! - [`Triggerable`] owns a sensor shape and is told when physical shapes
//!   enter, stay in or leave it.
//!
//! The world rectangle is fenced by four boundary lines, so every moving
//! collidable is kept inside the world unless its resolver lets it through.

pub mod shape;
pub mod space;

use log::{debug, warn};
use raylib::prelude::{Rectangle, Vector2};
use rustc_hash::FxHashMap;
use shape::Shape;
use space::{ALL, COLLIDER, Collider, ColliderData, CollisionError, CollisionSpace, Contact, ShapeKey, TRIGGER};
use std::cell::RefCell;
use std::rc::Rc;

pub const SPACE_SUBDIVISIONS: u32 = 10;

pub trait Movable {
    /// Displacement wanted for this tick.
    fn plan_movement(&mut self, delta_seconds: f32) -> Vector2;
    /// Apply the displacement the system settled on.
    fn move_by(&mut self, displacement: Vector2);
}

pub trait Collidable {
    /// Physical shape, read once when the object is registered.
    fn collider_shape(&self) -> Shape;
    /// Return the displacement to use instead of `planned`, given the
    /// shapes the planned move would collide with.
    fn resolve_collision(&mut self, planned: Vector2, contacts: &[Contact]) -> Vector2;
}

pub trait Triggerable {
    /// Sensor shape, read once when the object is registered.
    fn trigger_shape(&self) -> Shape;
    fn trigger_enter(&mut self, other: &Contact);
    fn trigger_remain(&mut self, other: &Contact);
    fn trigger_exit(&mut self, other: &Contact);
}

/// Capabilities registered together under one id.
#[derive(Default)]
pub struct Capabilities {
    pub movable: Option<Rc<RefCell<dyn Movable>>>,
    pub collidable: Option<Rc<RefCell<dyn Collidable>>>,
    pub triggerable: Option<Rc<RefCell<dyn Triggerable>>>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn movable(mut self, m: Rc<RefCell<dyn Movable>>) -> Self {
        self.movable = Some(m);
        self
    }

    pub fn collidable(mut self, c: Rc<RefCell<dyn Collidable>>) -> Self {
        self.collidable = Some(c);
        self
    }

    pub fn triggerable(mut self, t: Rc<RefCell<dyn Triggerable>>) -> Self {
        self.triggerable = Some(t);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vector2,
    pub direction: Vector2,
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
    /// Id of the collidable that was hit.
    pub id: String,
    pub position: Vector2,
    pub distance: f32,
}

struct CollidableEntry {
    object: Rc<RefCell<dyn Collidable>>,
    key: ShapeKey,
}

struct TriggerEntry {
    object: Rc<RefCell<dyn Triggerable>>,
    key: ShapeKey,
    inside: FxHashMap<ShapeKey, Contact>,
}

/// Non-send resource driving movement, collision and triggers.
pub struct MoveCollideSystem {
    world_area: Rectangle,
    space: CollisionSpace,
    movables: FxHashMap<String, Rc<RefCell<dyn Movable>>>,
    collidables: FxHashMap<String, CollidableEntry>,
    triggerables: FxHashMap<String, TriggerEntry>,
}

impl MoveCollideSystem {
    /// System for a world spanning `(0, 0)` to `(world_width, world_height)`.
    pub fn new(world_width: f32, world_height: f32) -> Result<Self, CollisionError> {
        if world_width.is_nan() || world_height.is_nan() || world_width <= 0.0 || world_height <= 0.0 {
            return Err(CollisionError::InvalidBounds {
                width: world_width,
                height: world_height,
            });
        }
        debug!("creating collision space {} x {}", world_width, world_height);

        // Twice the world size, centered on it, so shapes may poke past the edges.
        let bounds = Rectangle::new(
            -world_width / 2.0,
            -world_height / 2.0,
            world_width * 2.0,
            world_height * 2.0,
        );
        let mut space = CollisionSpace::new(bounds, SPACE_SUBDIVISIONS)?;

        let nw = Vector2::new(0.0, 0.0);
        let ne = Vector2::new(world_width, 0.0);
        let se = Vector2::new(world_width, world_height);
        let sw = Vector2::new(0.0, world_height);
        for (a, b, name) in [(nw, ne, "north"), (ne, se, "east"), (se, sw, "south"), (sw, nw, "west")] {
            space.insert(Collider::new(
                Shape::line(a, b),
                COLLIDER,
                ALL,
                ColliderData::Boundary(name),
            ))?;
        }

        Ok(Self {
            world_area: Rectangle::new(0.0, 0.0, world_width, world_height),
            space,
            movables: FxHashMap::default(),
            collidables: FxHashMap::default(),
            triggerables: FxHashMap::default(),
        })
    }

    pub fn world_area(&self) -> Rectangle {
        self.world_area
    }

    pub fn space(&self) -> &CollisionSpace {
        &self.space
    }

    /// Register the given capabilities under `id`, replacing any of the
    /// same kind already registered for it.
    pub fn add(&mut self, id: impl Into<String>, caps: Capabilities) -> Result<(), CollisionError> {
        let id = id.into();

        if let Some(object) = caps.collidable {
            let shape = object.borrow().collider_shape();
            let key = self.space.insert(Collider::new(
                shape,
                COLLIDER,
                ALL,
                ColliderData::Entity(id.clone()),
            ))?;
            if let Some(old) = self.collidables.insert(id.clone(), CollidableEntry { object, key }) {
                self.space.remove(old.key);
            }
            debug!("added collidable '{}'", id);
        }

        if let Some(object) = caps.triggerable {
            let shape = object.borrow().trigger_shape();
            let key = self.space.insert(Collider::new(
                shape,
                TRIGGER,
                ALL & !TRIGGER,
                ColliderData::Entity(id.clone()),
            ))?;
            let entry = TriggerEntry {
                object,
                key,
                inside: FxHashMap::default(),
            };
            if let Some(old) = self.triggerables.insert(id.clone(), entry) {
                self.space.remove(old.key);
            }
            debug!("added triggerable '{}'", id);
        }

        if let Some(m) = caps.movable {
            self.movables.insert(id.clone(), m);
            debug!("added movable '{}'", id);
        }
        Ok(())
    }

    /// Forget every capability registered under `id`.
    pub fn remove(&mut self, id: &str) {
        self.movables.remove(id);
        if let Some(entry) = self.collidables.remove(id) {
            self.space.remove(entry.key);
        }
        if let Some(entry) = self.triggerables.remove(id) {
            self.space.remove(entry.key);
        }
    }

    /// Forget every registered object. World boundaries stay.
    pub fn clear(&mut self) {
        for (_, entry) in self.collidables.drain() {
            self.space.remove(entry.key);
        }
        for (_, entry) in self.triggerables.drain() {
            self.space.remove(entry.key);
        }
        self.movables.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.movables.contains_key(id) || self.collidables.contains_key(id) || self.triggerables.contains_key(id)
    }

    /// Closest collidable hit by `ray`. World boundaries and triggers are
    /// not reported.
    pub fn raycast(&self, ray: &Ray) -> Option<RayHit> {
        let hit = match self
            .space
            .raycast(ray.origin, ray.direction, ray.distance, COLLIDER)
        {
            Ok(hit) => hit?,
            Err(e) => {
                warn!("raycast failed: {}", e);
                return None;
            }
        };
        let ColliderData::Entity(id) = hit.data else {
            debug!("ray hit a world boundary");
            return None;
        };
        if !self.collidables.contains_key(&id) {
            debug!("ray hit '{}', which is not a registered collidable", id);
            return None;
        }
        Some(RayHit {
            id,
            position: hit.position,
            distance: hit.distance,
        })
    }

    /// Run one tick: move every movable, resolving collisions, then report
    /// trigger transitions.
    pub fn move_collide(&mut self, delta_seconds: f32) {
        let Self {
            space,
            movables,
            collidables,
            triggerables,
            ..
        } = self;

        for (id, movable) in movables.iter() {
            let planned = movable.borrow_mut().plan_movement(delta_seconds);
            if planned.x == 0.0 && planned.y == 0.0 {
                continue;
            }

            let Some(entry) = collidables.get(id) else {
                movable.borrow_mut().move_by(planned);
                follow(space, triggerables.get(id).map(|t| t.key), planned);
                continue;
            };

            let contacts = match space.would_be_collided_by(entry.key, planned, COLLIDER) {
                Ok(contacts) => contacts,
                Err(e) => {
                    warn!("failed to check move of '{}': {}", id, e);
                    continue;
                }
            };
            let adjusted = if contacts.is_empty() {
                planned
            } else {
                entry.object.borrow_mut().resolve_collision(planned, &contacts)
            };

            movable.borrow_mut().move_by(adjusted);

            if let Err(e) = space.translate(entry.key, adjusted).and_then(|_| space.update(entry.key)) {
                warn!("failed to update collision space for '{}': {}", id, e);
                continue;
            }
            follow(space, triggerables.get(id).map(|t| t.key), adjusted);
        }

        dispatch_triggers(space, triggerables);
    }
}

/// Keep a trigger shape attached to the object that moved.
fn follow(space: &mut CollisionSpace, key: Option<ShapeKey>, displacement: Vector2) {
    let Some(key) = key else {
        return;
    };
    if let Err(e) = space.translate(key, displacement).and_then(|_| space.update(key)) {
        warn!("failed to move trigger shape: {}", e);
    }
}

fn dispatch_triggers(space: &CollisionSpace, triggerables: &mut FxHashMap<String, TriggerEntry>) {
    for (id, entry) in triggerables.iter_mut() {
        let contacts = match space.overlapping(entry.key, COLLIDER) {
            Ok(contacts) => contacts,
            Err(e) => {
                warn!("failed to check trigger '{}': {}", id, e);
                continue;
            }
        };

        let mut now_inside = FxHashMap::default();
        for contact in contacts {
            if contact.entity_id().is_none_or(|other| other == id.as_str()) {
                continue;
            }
            if entry.inside.contains_key(&contact.key) {
                entry.object.borrow_mut().trigger_remain(&contact);
            } else {
                entry.object.borrow_mut().trigger_enter(&contact);
            }
            now_inside.insert(contact.key, contact);
        }
        for (key, contact) in entry.inside.iter() {
            if !now_inside.contains_key(key) {
                entry.object.borrow_mut().trigger_exit(contact);
            }
        }
        entry.inside = now_inside;
    }
}
