//! Registry of objects animated once per tick.

use log::debug;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

pub trait Animatable {
    fn update_animation(&mut self, delta: Duration);
}

/// Non-send resource holding every registered [`Animatable`].
#[derive(Default)]
pub struct AnimationSystem {
    animatables: FxHashMap<String, Rc<RefCell<dyn Animatable>>>,
}

impl AnimationSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: impl Into<String>, a: Rc<RefCell<dyn Animatable>>) {
        let id = id.into();
        debug!("added animatable '{}'", id);
        self.animatables.insert(id, a);
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.animatables.remove(id).is_some()
    }

    pub fn clear(&mut self) {
        self.animatables.clear();
    }

    pub fn len(&self) -> usize {
        self.animatables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animatables.is_empty()
    }

    pub fn animate(&mut self, delta_seconds: f32) {
        let delta = Duration::from_secs_f32(delta_seconds.max(0.0));
        for a in self.animatables.values() {
            a.borrow_mut().update_animation(delta);
        }
    }
}
