//! Control system.
//!
//! Lets every registered [`Controllable`](crate::resources::control::Controllable)
//! react to the watched keys. Keys are polled by the engine before the
//! schedule runs.

use bevy_ecs::prelude::*;

use crate::resources::control::ControlSystem;
use crate::resources::worldtime::WorldTime;

pub fn control(time: Res<WorldTime>, controls: Option<NonSendMut<ControlSystem>>) {
    if let Some(mut controls) = controls {
        controls.control(time.delta);
    }
}
