//! Persistent entity marker component.
//!
//! Entities with the [`Persistent`] component survive mode changes. Every
//! other entity is despawned when the engine switches modes.

use bevy_ecs::prelude::Component;

#[derive(Component, Clone, Debug)]
pub struct Persistent;
