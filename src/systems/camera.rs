//! Camera follow system.

use bevy_ecs::prelude::*;

use crate::resources::camera::{Camera, CameraFocus};

/// Center the camera on the focused object, if any.
pub fn camera_follow(focus: Option<NonSend<CameraFocus>>, mut camera: ResMut<Camera>) {
    if let Some(focus) = focus {
        let target = focus.position();
        if target != camera.world_position() {
            camera.move_to(target);
        }
    }
}
