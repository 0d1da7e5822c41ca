//! Engine systems.
//!
//! Submodules overview
//! - [`animation`] – advance animatables and animation controllers
//! - [`camera`] – keep the camera on its focus
//! - [`control`] – let controllables react to input
//! - [`movecollide`] – move, collide and fire triggers
//! - [`render`] – draw world, overlay and debug UI using raylib
//! - [`time`] – update simulation time and delta

pub mod animation;
pub mod camera;
pub mod control;
pub mod movecollide;
pub mod render;
pub mod time;
