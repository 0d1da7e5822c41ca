//! Movement and collision system.
//!
//! Runs one [`MoveCollideSystem::move_collide`] pass per tick when the
//! current mode has a world to simulate.

use bevy_ecs::prelude::*;

use crate::resources::movecollide::MoveCollideSystem;
use crate::resources::worldtime::WorldTime;

pub fn move_collide(time: Res<WorldTime>, system: Option<NonSendMut<MoveCollideSystem>>) {
    if let Some(mut system) = system {
        system.move_collide(time.delta);
    }
}
