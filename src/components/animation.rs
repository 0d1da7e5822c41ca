//! Frame animation playback state.
//!
//! An [`AnimationController`] plays one tagged frame list in a loop. It can
//! live on an ECS entity as a component, or inside any object implementing
//! [`Animatable`](crate::resources::animation::Animatable).

use crate::assets::animations::Animations;
use crate::assets::spritesheet::SpriteRef;
use bevy_ecs::prelude::Component;
use log::debug;
use std::time::Duration;

#[derive(Debug, Clone, Default, Component)]
pub struct AnimationController {
    tag: String,
    frames: Vec<SpriteRef>,
    frame_duration: Duration,
    index: usize,
    offset: Duration,
}

impl AnimationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start playing `frames` from the first one.
    ///
    /// Returns `false`, leaving the current animation untouched, when there
    /// are no frames or the frame duration is zero.
    pub fn start_animation(
        &mut self,
        tag: impl Into<String>,
        frames: Vec<SpriteRef>,
        frame_duration: Duration,
    ) -> bool {
        let tag = tag.into();
        if frames.is_empty() || frame_duration.is_zero() {
            debug!("animation '{}' not started: no frames", tag);
            return false;
        }
        self.tag = tag;
        self.frames = frames;
        self.frame_duration = frame_duration;
        self.index = 0;
        self.offset = Duration::ZERO;
        true
    }

    /// Start the `tag` animation of an animations asset.
    pub fn start_from(&mut self, animations: &Animations, tag: &str) -> bool {
        let frames = animations.frames(tag).map(<[_]>::to_vec).unwrap_or_default();
        self.start_animation(tag, frames, animations.frame_duration())
    }

    /// Advance by `delta`, stepping over as many whole frames as fit.
    pub fn update(&mut self, delta: Duration) {
        if self.frames.is_empty() {
            return;
        }
        self.offset += delta;
        while self.offset >= self.frame_duration {
            self.offset -= self.frame_duration;
            self.index = (self.index + 1) % self.frames.len();
        }
    }

    pub fn is_playing(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn current_tag(&self) -> &str {
        &self.tag
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Time already spent on the current frame.
    pub fn current_offset(&self) -> Duration {
        self.offset
    }

    pub fn current_frame(&self) -> Option<&SpriteRef> {
        self.frames.get(self.index)
    }
}
