//! Tile grid viewer mode.
//!
//! Shows one tile grid and lets the user pan with the arrow keys and zoom
//! with `+`/`-`. The camera follows an invisible cursor kept inside the
//! grid.

use bevy_ecs::prelude::*;
use raylib::prelude::{Color, KeyboardKey, Rectangle, Vector2};
use std::cell::RefCell;
use std::rc::Rc;

use crate::assets::tilegrid::TileGrid;
use crate::engine::{EngineError, Mode};
use crate::geometry::RectangleExt;
use crate::resources::assetmanager::AssetManager;
use crate::resources::camera::{Camera, CameraFocus, CameraTarget};
use crate::resources::control::{ControlSystem, Controllable};
use crate::resources::drawing::{Canvas, WorldDrawing};
use crate::resources::input::KeyWatcher;

/// Pan speed in screen pixels per second.
const PAN_SPEED: f32 = 400.0;
const ZOOM_STEP: f32 = 1.25;

struct Cursor {
    position: Vector2,
    area: Rectangle,
    zoom_steps: i32,
    zoom_level: f32,
}

impl Controllable for Cursor {
    fn watch_keys(&self) -> Vec<KeyboardKey> {
        vec![
            KeyboardKey::KEY_UP,
            KeyboardKey::KEY_DOWN,
            KeyboardKey::KEY_LEFT,
            KeyboardKey::KEY_RIGHT,
            KeyboardKey::KEY_KP_ADD,
            KeyboardKey::KEY_KP_SUBTRACT,
        ]
    }

    fn control(&mut self, delta_seconds: f32, keys: &KeyWatcher) {
        let mut dir = Vector2::zero();
        if keys.pressed(KeyboardKey::KEY_LEFT) {
            dir.x -= 1.0;
        }
        if keys.pressed(KeyboardKey::KEY_RIGHT) {
            dir.x += 1.0;
        }
        if keys.pressed(KeyboardKey::KEY_UP) {
            dir.y -= 1.0;
        }
        if keys.pressed(KeyboardKey::KEY_DOWN) {
            dir.y += 1.0;
        }
        let step = PAN_SPEED * delta_seconds / self.zoom_level;
        let max = self.area.max();
        self.position = Vector2::new(
            (self.position.x + dir.x * step).clamp(self.area.x, max.x),
            (self.position.y + dir.y * step).clamp(self.area.y, max.y),
        );

        if keys.just_pressed(KeyboardKey::KEY_KP_ADD) {
            self.zoom_steps += 1;
        }
        if keys.just_pressed(KeyboardKey::KEY_KP_SUBTRACT) {
            self.zoom_steps -= 1;
        }
    }
}

impl CameraTarget for Cursor {
    fn camera_target(&self) -> Vector2 {
        self.position
    }
}

pub struct ViewerMode {
    grid_path: String,
    cursor: Option<Rc<RefCell<Cursor>>>,
}

impl ViewerMode {
    pub fn new(grid_path: impl Into<String>) -> Self {
        Self {
            grid_path: grid_path.into(),
            cursor: None,
        }
    }
}

impl Mode for ViewerMode {
    fn name(&self) -> &str {
        "viewer"
    }

    fn initialize(&mut self, world: &mut World) -> Result<(), EngineError> {
        let grid = world
            .resource_mut::<AssetManager>()
            .get_as::<TileGrid>(&self.grid_path)?;

        let cursor = Rc::new(RefCell::new(Cursor {
            position: grid.center(),
            area: grid.world_area(),
            zoom_steps: 0,
            zoom_level: world.resource::<Camera>().zoom_level(),
        }));

        world
            .non_send_resource_mut::<WorldDrawing>()
            .add(self.grid_path.clone(), Rc::new(grid));
        world
            .non_send_resource_mut::<ControlSystem>()
            .add("cursor", cursor.clone());
        world.insert_non_send_resource(CameraFocus::new(cursor.clone()));
        self.cursor = Some(cursor);
        Ok(())
    }

    fn update(&mut self, world: &mut World) -> Result<Option<Box<dyn Mode>>, EngineError> {
        let Some(cursor) = &self.cursor else {
            return Ok(None);
        };
        let steps = std::mem::take(&mut cursor.borrow_mut().zoom_steps);
        if steps != 0 {
            let mut camera = world.resource_mut::<Camera>();
            let level = camera.zoom_level() * ZOOM_STEP.powi(steps);
            camera.zoom(level);
            cursor.borrow_mut().zoom_level = camera.zoom_level();
        }
        Ok(None)
    }

    fn draw(&self, _world: &World, canvas: &mut dyn Canvas) {
        let help = format!("{} | arrows: pan, +/-: zoom, F11: debug", self.grid_path);
        canvas.draw_text(&help, Vector2::new(10.0, 10.0), 10, Color::DARKGRAY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::input::tests::FakeKeys;

    fn cursor() -> Cursor {
        Cursor {
            position: Vector2::new(50.0, 50.0),
            area: Rectangle::new(0.0, 0.0, 100.0, 100.0),
            zoom_steps: 0,
            zoom_level: 1.0,
        }
    }

    #[test]
    fn cursor_pans_and_stays_inside_the_grid() {
        let mut c = cursor();
        let mut keys = KeyWatcher::new();
        for k in c.watch_keys() {
            keys.watch(k);
        }
        let down = FakeKeys {
            down: vec![KeyboardKey::KEY_RIGHT, KeyboardKey::KEY_UP],
        };
        keys.update(std::time::Duration::ZERO, &down);

        c.control(0.0625, &keys);
        assert_eq!(c.position, Vector2::new(75.0, 25.0));
        c.control(1.0, &keys);
        assert_eq!(c.position, Vector2::new(100.0, 0.0));
    }

    #[test]
    fn zoom_keys_count_presses() {
        let mut c = cursor();
        let mut keys = KeyWatcher::new();
        keys.watch(KeyboardKey::KEY_KP_ADD);
        let down = FakeKeys {
            down: vec![KeyboardKey::KEY_KP_ADD],
        };
        keys.update(std::time::Duration::ZERO, &down);
        c.control(0.0, &keys);
        keys.update(std::time::Duration::from_millis(16), &down);
        c.control(0.0, &keys);
        assert_eq!(c.zoom_steps, 1);
    }
}
