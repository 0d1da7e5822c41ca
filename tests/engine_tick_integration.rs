//! Engine tick integration tests: schedule order, input, movement, camera,
//! animation and mode transitions, all headless.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use bevy_ecs::prelude::*;
use raylib::prelude::{KeyboardKey, Rectangle, Vector2};
use tempfile::TempDir;

use topdown::assets::image::ImageAsset;
use topdown::assets::spritesheet::SpriteRef;
use topdown::components::animation::AnimationController;
use topdown::components::persistent::Persistent;
use topdown::engine::{Engine, EngineError, Mode};
use topdown::resources::animation::{Animatable, AnimationSystem};
use topdown::resources::assetmanager::{AssetError, AssetManager};
use topdown::resources::camera::{Camera, CameraFocus, CameraTarget};
use topdown::resources::control::{ControlSystem, Controllable};
use topdown::resources::debugmode::DebugMode;
use topdown::resources::gameconfig::GameConfig;
use topdown::resources::input::{KeySource, KeyWatcher};
use topdown::resources::movecollide::shape::Shape;
use topdown::resources::movecollide::space::Contact;
use topdown::resources::movecollide::{Capabilities, Collidable, MoveCollideSystem, Movable};
use topdown::resources::screensize::ScreenSize;
use topdown::resources::worldtime::WorldTime;

struct Keys(Vec<KeyboardKey>);

impl KeySource for Keys {
    fn is_key_down(&self, key: KeyboardKey) -> bool {
        self.0.iter().any(|k| *k as i32 == key as i32)
    }
}

struct Player {
    position: Vector2,
    velocity: Vector2,
}

impl Controllable for Player {
    fn watch_keys(&self) -> Vec<KeyboardKey> {
        vec![KeyboardKey::KEY_RIGHT]
    }

    fn control(&mut self, _delta_seconds: f32, keys: &KeyWatcher) {
        self.velocity.x = if keys.pressed(KeyboardKey::KEY_RIGHT) { 100.0 } else { 0.0 };
    }
}

impl Movable for Player {
    fn plan_movement(&mut self, delta_seconds: f32) -> Vector2 {
        Vector2::new(self.velocity.x * delta_seconds, self.velocity.y * delta_seconds)
    }

    fn move_by(&mut self, displacement: Vector2) {
        self.position = self.position + displacement;
    }
}

impl Collidable for Player {
    fn collider_shape(&self) -> Shape {
        Shape::rect(self.position.x, self.position.y, 10.0, 10.0)
    }

    fn resolve_collision(&mut self, _planned: Vector2, _contacts: &[Contact]) -> Vector2 {
        Vector2::zero()
    }
}

impl CameraTarget for Player {
    fn camera_target(&self) -> Vector2 {
        self.position
    }
}

#[derive(Default)]
struct Clock(Duration);

impl Animatable for Clock {
    fn update_animation(&mut self, delta: Duration) {
        self.0 += delta;
    }
}

/// Level with a player in a 1000x1000 world. Switches to [`Menu`] after
/// `ticks` ticks.
struct Level {
    start: Vector2,
    ticks: u32,
    clock: Rc<RefCell<Clock>>,
}

impl Level {
    fn new(start: Vector2, ticks: u32) -> Self {
        Self {
            start,
            ticks,
            clock: Rc::new(RefCell::new(Clock::default())),
        }
    }
}

impl Mode for Level {
    fn name(&self) -> &str {
        "level"
    }

    fn initialize(&mut self, world: &mut World) -> Result<(), EngineError> {
        world
            .resource_mut::<AssetManager>()
            .get_as::<ImageAsset>("hero.png")?;

        let player = Rc::new(RefCell::new(Player {
            position: self.start,
            velocity: Vector2::zero(),
        }));
        let mut system = MoveCollideSystem::new(1000.0, 1000.0)?;
        system.add(
            "player",
            Capabilities::new()
                .movable(player.clone())
                .collidable(player.clone()),
        )?;
        world.insert_non_send_resource(system);
        world
            .non_send_resource_mut::<ControlSystem>()
            .add("player", player.clone());
        world
            .non_send_resource_mut::<AnimationSystem>()
            .add("clock", self.clock.clone());
        world.insert_non_send_resource(CameraFocus::new(player));
        Ok(())
    }

    fn update(&mut self, _world: &mut World) -> Result<Option<Box<dyn Mode>>, EngineError> {
        self.ticks = self.ticks.saturating_sub(1);
        if self.ticks == 0 {
            return Ok(Some(Box::new(Menu)));
        }
        Ok(None)
    }
}

struct Menu;

impl Mode for Menu {
    fn name(&self) -> &str {
        "menu"
    }

    fn initialize(&mut self, _world: &mut World) -> Result<(), EngineError> {
        Ok(())
    }
}

struct Broken;

impl Mode for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn initialize(&mut self, world: &mut World) -> Result<(), EngineError> {
        world.resource_mut::<AssetManager>().get("missing.png")?;
        Ok(())
    }
}

fn asset_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    image::RgbaImage::new(16, 16)
        .save(dir.path().join("hero.png"))
        .unwrap();
    dir
}

fn engine(root: &Path) -> Engine {
    let config = GameConfig {
        assets_root: root.to_path_buf(),
        window_width: 800,
        window_height: 600,
        ..GameConfig::new()
    };
    Engine::new(config, Vec::new()).unwrap()
}

fn frames(n: usize) -> Vec<SpriteRef> {
    let image = Arc::new(ImageAsset {
        path: "hero.png".into(),
        width: 16 * n as u32,
        height: 16,
    });
    (0..n)
        .map(|i| SpriteRef {
            image: image.clone(),
            source: Rectangle::new(16.0 * i as f32, 0.0, 16.0, 16.0),
            id: format!("f{i}"),
        })
        .collect()
}

#[test]
fn input_drives_movement_and_the_camera_follows() {
    let dir = asset_dir();
    let mut engine = engine(dir.path());
    let level = Level::new(Vector2::new(100.0, 100.0), 100);
    let clock = level.clock.clone();
    engine.start(Box::new(level)).unwrap();
    assert_eq!(engine.mode_name(), Some("level"));

    engine.poll_input(0.5, &Keys(vec![KeyboardKey::KEY_RIGHT]));
    engine.tick(0.5).unwrap();

    let world = engine.world();
    assert_eq!(world.resource::<Camera>().world_position(), Vector2::new(150.0, 100.0));
    assert_eq!(world.resource::<WorldTime>().frame_count, 1);
    assert_eq!(clock.borrow().0, Duration::from_millis(500));

    engine.poll_input(0.5, &Keys(Vec::new()));
    engine.tick(0.5).unwrap();
    assert_eq!(
        engine.world().resource::<Camera>().world_position(),
        Vector2::new(150.0, 100.0)
    );
}

#[test]
fn world_boundary_stops_the_player() {
    let dir = asset_dir();
    let mut engine = engine(dir.path());
    engine
        .start(Box::new(Level::new(Vector2::new(985.0, 100.0), 100)))
        .unwrap();

    engine.poll_input(0.25, &Keys(vec![KeyboardKey::KEY_RIGHT]));
    engine.tick(0.25).unwrap();

    // Moving 25 to the right would cross the east boundary at x = 1000.
    assert_eq!(
        engine.world().resource::<Camera>().world_position(),
        Vector2::new(985.0, 100.0)
    );
}

#[test]
fn animation_controllers_advance_with_world_time() {
    let dir = asset_dir();
    let mut engine = engine(dir.path());
    engine.start(Box::new(Menu)).unwrap();

    let mut controller = AnimationController::new();
    assert!(controller.start_animation("walk", frames(3), Duration::from_millis(250)));
    let entity = engine.world_mut().spawn(controller).id();

    engine.tick(0.5).unwrap();
    let controller = engine.world().get::<AnimationController>(entity).unwrap();
    assert_eq!(controller.current_index(), 2);
    assert_eq!(controller.current_offset(), Duration::ZERO);
}

#[test]
fn mode_change_drops_the_previous_mode_state() {
    let dir = asset_dir();
    let mut engine = engine(dir.path());
    engine
        .start(Box::new(Level::new(Vector2::new(100.0, 100.0), 2)))
        .unwrap();

    let doomed = engine.world_mut().spawn(AnimationController::new()).id();
    let kept = engine
        .world_mut()
        .spawn((AnimationController::new(), Persistent))
        .id();
    assert_eq!(engine.world().resource::<AssetManager>().len(), 1);

    engine.tick(0.1).unwrap();
    assert_eq!(engine.mode_name(), Some("level"));
    engine.tick(0.1).unwrap();
    assert_eq!(engine.mode_name(), Some("menu"));

    let world = engine.world();
    assert!(world.resource::<AssetManager>().is_empty());
    assert!(world.get_non_send_resource::<MoveCollideSystem>().is_none());
    assert!(world.get_non_send_resource::<CameraFocus>().is_none());
    assert!(world.non_send_resource::<ControlSystem>().is_empty());
    assert!(world.non_send_resource::<AnimationSystem>().is_empty());
    assert!(world.get_entity(doomed).is_err());
    assert!(world.get_entity(kept).is_ok());
}

#[test]
fn failed_mode_initialization_is_reported() {
    let dir = asset_dir();
    let mut engine = engine(dir.path());
    engine.start(Box::new(Menu)).unwrap();

    let err = engine.switch_mode(Box::new(Broken)).unwrap_err();
    assert!(matches!(err, EngineError::Assets(AssetError::NotFound(ref p)) if p == "missing.png"));
    assert_eq!(engine.mode_name(), None);

    // Ticking without a mode still runs the systems.
    engine.tick(0.1).unwrap();
}

#[test]
fn resize_and_debug_toggle() {
    let dir = asset_dir();
    let mut engine = engine(dir.path());

    engine.resize(1024, 768).unwrap();
    assert_eq!(*engine.world().resource::<ScreenSize>(), ScreenSize { w: 1024, h: 768 });
    assert_eq!(engine.world().resource::<Camera>().size(), (1024, 768));

    assert!(engine.resize(4096, 768).is_err());
    assert_eq!(*engine.world().resource::<ScreenSize>(), ScreenSize { w: 1024, h: 768 });

    assert!(!engine.world().contains_resource::<DebugMode>());
    engine.toggle_debug();
    assert!(engine.world().contains_resource::<DebugMode>());
    engine.toggle_debug();
    assert!(!engine.world().contains_resource::<DebugMode>());
}

#[test]
fn missing_asset_root_fails_engine_creation() {
    let dir = tempfile::tempdir().unwrap();
    let config = GameConfig {
        assets_root: dir.path().join("nope"),
        ..GameConfig::new()
    };
    assert!(matches!(
        Engine::new(config, Vec::new()),
        Err(EngineError::Assets(AssetError::Index(_)))
    ));
}
