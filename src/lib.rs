//! Topdown engine library.
//!
//! A small component based engine for top-down 2D games built on raylib and
//! bevy_ecs. It provides a lazily loading asset manager over a scanned
//! asset directory, a camera, a grid indexed movement and collision system,
//! layered drawing, keyboard control and frame animation.

pub mod assets;
pub mod components;
pub mod engine;
pub mod geometry;
pub mod resources;
pub mod systems;
pub mod viewer;
