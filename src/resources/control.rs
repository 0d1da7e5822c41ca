//! Input driven control of registered objects.

use crate::resources::input::{KeySource, KeyWatcher};
use log::debug;
use raylib::prelude::KeyboardKey;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

pub trait Controllable {
    /// Keys this object reacts to. Read when it is added and removed.
    fn watch_keys(&self) -> Vec<KeyboardKey>;
    fn control(&mut self, delta_seconds: f32, keys: &KeyWatcher);
}

/// Non-send resource owning the key watcher and the controllables.
#[derive(Default)]
pub struct ControlSystem {
    controllables: FxHashMap<String, Rc<RefCell<dyn Controllable>>>,
    keys: KeyWatcher,
}

impl ControlSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: impl Into<String>, c: Rc<RefCell<dyn Controllable>>) {
        let id = id.into();
        self.remove(&id);
        for key in c.borrow().watch_keys() {
            self.keys.watch(key);
        }
        debug!("added controllable '{}'", id);
        self.controllables.insert(id, c);
    }

    pub fn remove(&mut self, id: &str) {
        if let Some(c) = self.controllables.remove(id) {
            for key in c.borrow().watch_keys() {
                self.keys.unwatch(key);
            }
        }
    }

    pub fn clear(&mut self) {
        for (_, c) in self.controllables.drain() {
            for key in c.borrow().watch_keys() {
                self.keys.unwatch(key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.controllables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllables.is_empty()
    }

    pub fn keys(&self) -> &KeyWatcher {
        &self.keys
    }

    /// Poll the watched keys.
    pub fn update_keys(&mut self, delta_seconds: f32, source: &dyn KeySource) {
        self.keys
            .update(Duration::from_secs_f32(delta_seconds.max(0.0)), source);
    }

    /// Let every controllable react to the current key state.
    pub fn control(&mut self, delta_seconds: f32) {
        for c in self.controllables.values() {
            c.borrow_mut().control(delta_seconds, &self.keys);
        }
    }
}
