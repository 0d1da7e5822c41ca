//! ECS components for entities.
//!
//! - [`animation`] – looping frame animation state
//! - [`persistent`] – marker for entities that survive mode changes

pub mod animation;
pub mod persistent;
