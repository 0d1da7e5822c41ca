//! Watched keyboard state.
//!
//! Only keys somebody asked for are tracked. Each watched key remembers
//! whether it is down and for how long it has been in that state, which
//! gives "just pressed" (down, duration zero) and hold times for free.
//! Keys are reference counted: a key stays watched until every watcher has
//! unwatched it.

use log::trace;
use raylib::prelude::{KeyboardKey, RaylibHandle};
use rustc_hash::FxHashMap;
use std::time::Duration;

/// Source of raw key state, normally the raylib handle.
pub trait KeySource {
    fn is_key_down(&self, key: KeyboardKey) -> bool;
}

impl KeySource for RaylibHandle {
    fn is_key_down(&self, key: KeyboardKey) -> bool {
        RaylibHandle::is_key_down(self, key)
    }
}

/// Key source with every key released, for headless runs.
pub struct NoInput;

impl KeySource for NoInput {
    fn is_key_down(&self, _key: KeyboardKey) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KeyState {
    pub key: KeyboardKey,
    pub pressed: bool,
    /// Time spent in the current pressed/released state.
    pub duration: Duration,
    watchers: u32,
}

#[derive(Debug, Default)]
pub struct KeyWatcher {
    keys: FxHashMap<i32, KeyState>,
}

impl KeyWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watch(&mut self, key: KeyboardKey) {
        self.keys
            .entry(key as i32)
            .and_modify(|s| s.watchers += 1)
            .or_insert(KeyState {
                key,
                pressed: false,
                duration: Duration::ZERO,
                watchers: 1,
            });
    }

    pub fn unwatch(&mut self, key: KeyboardKey) {
        let id = key as i32;
        if let Some(state) = self.keys.get_mut(&id) {
            state.watchers = state.watchers.saturating_sub(1);
            if state.watchers == 0 {
                self.keys.remove(&id);
            }
        }
    }

    pub fn is_watched(&self, key: KeyboardKey) -> bool {
        self.keys.contains_key(&(key as i32))
    }

    /// Poll every watched key. A key whose state did not change accumulates
    /// `delta`; one that changed restarts at zero.
    pub fn update(&mut self, delta: Duration, source: &dyn KeySource) {
        for state in self.keys.values_mut() {
            let pressed = source.is_key_down(state.key);
            if pressed == state.pressed {
                state.duration += delta;
            } else {
                trace!("key {:?} pressed={}", state.key, pressed);
                state.pressed = pressed;
                state.duration = Duration::ZERO;
            }
        }
    }

    pub fn state(&self, key: KeyboardKey) -> Option<&KeyState> {
        self.keys.get(&(key as i32))
    }

    /// Unwatched keys always read as released.
    pub fn pressed(&self, key: KeyboardKey) -> bool {
        self.state(key).is_some_and(|s| s.pressed)
    }

    pub fn just_pressed(&self, key: KeyboardKey) -> bool {
        self.state(key)
            .is_some_and(|s| s.pressed && s.duration.is_zero())
    }

    /// How long a pressed key has been held, `None` if it is not down.
    pub fn held_for(&self, key: KeyboardKey) -> Option<Duration> {
        self.state(key).filter(|s| s.pressed).map(|s| s.duration)
    }
}
