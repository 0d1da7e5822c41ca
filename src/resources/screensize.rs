//! Screen size resource.
//!
//! Stores the current framebuffer dimensions in pixels. The engine keeps it
//! in sync with the window and resizes the camera when it changes.

use bevy_ecs::prelude::Resource;

/// Current screen size in pixels.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    /// Width in pixels.
    pub w: i32,
    /// Height in pixels.
    pub h: i32,
}
