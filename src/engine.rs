//! Engine and game modes.
//!
//! The [`Engine`] owns the ECS world, the update schedule and the current
//! [`Mode`]. A mode is one screen of the game (title, level, viewer...). It
//! fills the world's registries in [`Mode::initialize`] and may ask for the
//! next mode from [`Mode::update`].
//!
//! On every mode change the engine drops everything the previous mode
//! registered: cached assets, drawables, controllables, animatables,
//! non-[`Persistent`] entities and the movement system.
//!
//! # Tick order
//!
//! 1. [`update_world_time`]
//! 2. `control` → `move_collide` → `camera_follow` → `animate` →
//!    `advance_animation_controllers`
//! 3. [`Mode::update`], possibly switching modes
//!
//! Rendering happens after the tick in [`Engine::run`].

use bevy_ecs::prelude::*;
use log::{info, warn};
use raylib::prelude::*;
use thiserror::Error;

use crate::assets::standard_types;
use crate::components::persistent::Persistent;
use crate::resources::animation::AnimationSystem;
use crate::resources::assetmanager::{AssetError, AssetManager, AssetType, TypeRegistry};
use crate::resources::camera::{Camera, CameraError, CameraFocus};
use crate::resources::control::ControlSystem;
use crate::resources::debugmode::DebugMode;
use crate::resources::drawing::{Canvas, OverlayDrawing, WorldDrawing};
use crate::resources::gameconfig::{ConfigError, GameConfig};
use crate::resources::input::KeySource;
use crate::resources::movecollide::MoveCollideSystem;
use crate::resources::movecollide::space::CollisionError;
use crate::resources::screensize::ScreenSize;
use crate::resources::texturestore::TextureStore;
use crate::resources::worldtime::WorldTime;
use crate::systems::animation::{advance_animation_controllers, animate};
use crate::systems::camera::camera_follow;
use crate::systems::control::control;
use crate::systems::movecollide::move_collide;
use crate::systems::render::{
    RaylibCanvas, prepare_textures, render_debug_ui, render_overlay, render_pass,
};
use crate::systems::time::update_world_time;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Assets(#[from] AssetError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Collision(#[from] CollisionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("mode '{mode}' failed: {message}")]
    Mode { mode: String, message: String },
}

pub trait Mode {
    fn name(&self) -> &str;

    /// Populate the world for this mode. Any error aborts the mode change.
    fn initialize(&mut self, world: &mut World) -> Result<(), EngineError>;

    /// Called once per tick after the systems ran. Returning a mode switches
    /// to it.
    fn update(&mut self, _world: &mut World) -> Result<Option<Box<dyn Mode>>, EngineError> {
        Ok(None)
    }

    /// Screen space drawing on top of the overlay layers.
    fn draw(&self, _world: &World, _canvas: &mut dyn Canvas) {}
}

pub struct Engine {
    world: World,
    schedule: Schedule,
    mode: Option<Box<dyn Mode>>,
}

impl Engine {
    /// Build the world from `config`. `extra_types` are registered after the
    /// standard asset types; a name clash keeps the standard type.
    pub fn new(
        config: GameConfig,
        extra_types: Vec<Box<dyn AssetType>>,
    ) -> Result<Self, EngineError> {
        let mut types = TypeRegistry::new("asset type");
        types.add(standard_types());
        types.add(extra_types);

        let mut assets = AssetManager::new(&config.assets_root, types);
        assets.initialize()?;

        let mut camera = Camera::new(config.window_width, config.window_height)?;
        camera.zoom(config.camera_zoom);

        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        world.insert_resource(ScreenSize {
            w: config.window_width as i32,
            h: config.window_height as i32,
        });
        world.insert_resource(camera);
        world.insert_resource(assets);
        world.insert_resource(config);
        world.insert_non_send_resource(ControlSystem::new());
        world.insert_non_send_resource(AnimationSystem::new());
        world.insert_non_send_resource(WorldDrawing::new());
        world.insert_non_send_resource(OverlayDrawing::new());
        world.insert_non_send_resource(TextureStore::new());

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                control,
                move_collide,
                camera_follow,
                animate,
                advance_animation_controllers,
            )
                .chain(),
        );

        Ok(Self {
            world,
            schedule,
            mode: None,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn mode_name(&self) -> Option<&str> {
        self.mode.as_ref().map(|m| m.name())
    }

    pub fn start(&mut self, mode: Box<dyn Mode>) -> Result<(), EngineError> {
        self.switch_mode(mode)
    }

    /// Drop the current mode's state and initialize `mode`. If that fails the
    /// engine is left without a mode.
    pub fn switch_mode(&mut self, mut mode: Box<dyn Mode>) -> Result<(), EngineError> {
        if let Some(old) = self.mode.take() {
            info!("leaving mode '{}'", old.name());
        }
        self.reset_mode_state();
        info!("entering mode '{}'", mode.name());
        mode.initialize(&mut self.world)?;
        self.mode = Some(mode);
        Ok(())
    }

    fn reset_mode_state(&mut self) {
        let world = &mut self.world;
        if let Some(mut assets) = world.get_resource_mut::<AssetManager>() {
            assets.clear();
        }
        if let Some(mut textures) = world.get_non_send_resource_mut::<TextureStore>() {
            textures.clear();
        }
        if let Some(mut drawing) = world.get_non_send_resource_mut::<WorldDrawing>() {
            drawing.clear();
        }
        if let Some(mut overlay) = world.get_non_send_resource_mut::<OverlayDrawing>() {
            overlay.clear();
        }
        if let Some(mut controls) = world.get_non_send_resource_mut::<ControlSystem>() {
            controls.clear();
        }
        if let Some(mut animations) = world.get_non_send_resource_mut::<AnimationSystem>() {
            animations.clear();
        }
        world.remove_non_send_resource::<MoveCollideSystem>();
        world.remove_non_send_resource::<CameraFocus>();

        let doomed: Vec<Entity> = world
            .query_filtered::<Entity, Without<Persistent>>()
            .iter(world)
            .collect();
        for entity in doomed {
            world.despawn(entity);
        }
    }

    /// Feed the current key state to the control system.
    pub fn poll_input(&mut self, delta_seconds: f32, source: &dyn KeySource) {
        if let Some(mut controls) = self.world.get_non_send_resource_mut::<ControlSystem>() {
            controls.update_keys(delta_seconds, source);
        }
    }

    /// Advance one frame without touching the window.
    pub fn tick(&mut self, dt: f32) -> Result<(), EngineError> {
        update_world_time(&mut self.world, dt);
        self.schedule.run(&mut self.world);
        self.world.clear_trackers();

        let next = match self.mode.as_mut() {
            Some(mode) => mode.update(&mut self.world)?,
            None => None,
        };
        if let Some(next) = next {
            self.switch_mode(next)?;
        }
        Ok(())
    }

    /// Resize the camera and screen. A rejected size leaves both unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        self.world.resource_mut::<Camera>().resize(width, height)?;
        let mut screen = self.world.resource_mut::<ScreenSize>();
        screen.w = width as i32;
        screen.h = height as i32;
        Ok(())
    }

    pub fn toggle_debug(&mut self) {
        if self.world.contains_resource::<DebugMode>() {
            self.world.remove_resource::<DebugMode>();
        } else {
            self.world.insert_resource(DebugMode {});
        }
    }

    /// Drive the engine from a raylib window until it is closed.
    pub fn run(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread) -> Result<(), EngineError> {
        while !rl.window_should_close() {
            let dt = rl.get_frame_time();

            if rl.is_window_resized() {
                let (w, h) = (rl.get_screen_width(), rl.get_screen_height());
                if let Err(e) = self.resize(w.max(0) as u32, h.max(0) as u32) {
                    warn!("window resize to {}x{} ignored: {}", w, h, e);
                }
            }
            if rl.is_key_pressed(KeyboardKey::KEY_F11) {
                self.toggle_debug();
            }

            self.poll_input(dt, &*rl);
            self.tick(dt)?;

            prepare_textures(&mut self.world, rl, thread);

            let mut d = rl.begin_drawing(thread);
            d.clear_background(Color::RAYWHITE);
            render_pass(&self.world, &mut d);
            render_overlay(&self.world, &mut d);
            if let Some(mode) = self.mode.as_ref() {
                let textures = self.world.get_non_send_resource::<TextureStore>();
                let mut canvas = RaylibCanvas::new(&mut d, textures);
                mode.draw(&self.world, &mut canvas);
            }
            render_debug_ui(&self.world, &mut d);
        }
        Ok(())
    }
}
