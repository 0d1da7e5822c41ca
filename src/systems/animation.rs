//! Animation systems.
//!
//! - [`animate`] advances every registered
//!   [`Animatable`](crate::resources::animation::Animatable).
//! - [`advance_animation_controllers`] advances
//!   [`AnimationController`] components attached to entities.

use bevy_ecs::prelude::*;
use std::time::Duration;

use crate::components::animation::AnimationController;
use crate::resources::animation::AnimationSystem;
use crate::resources::worldtime::WorldTime;

pub fn animate(time: Res<WorldTime>, system: Option<NonSendMut<AnimationSystem>>) {
    if let Some(mut system) = system {
        system.animate(time.delta);
    }
}

pub fn advance_animation_controllers(
    time: Res<WorldTime>,
    mut query: Query<&mut AnimationController>,
) {
    let delta = Duration::from_secs_f32(time.delta.max(0.0));
    for mut controller in query.iter_mut() {
        controller.update(delta);
    }
}
