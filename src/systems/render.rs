//! Rendering with raylib.
//!
//! Rendering runs outside the update schedule, inside raylib's drawing
//! scopes, and only reads the ECS [`World`]:
//!
//! 1. [`prepare_textures`] uploads textures for every cached image asset
//!    (needs the raylib handle, so it runs before `begin_drawing`).
//! 2. [`render_pass`] draws the [`WorldDrawing`] layers through the camera.
//! 3. [`render_overlay`] draws the [`OverlayDrawing`] layers in screen space.
//! 4. [`render_debug_ui`] adds collider outlines and camera info when
//!    [`DebugMode`] is present.

use bevy_ecs::prelude::*;
use raylib::prelude::*;

use crate::assets::image::ImageAsset;
use crate::resources::assetmanager::AssetManager;
use crate::resources::camera::Camera;
use crate::resources::debugmode::{DebugMode, DebugPrintable};
use crate::resources::drawing::{Canvas, OverlayDrawing, WorldDrawing};
use crate::resources::movecollide::MoveCollideSystem;
use crate::resources::movecollide::shape::Shape;
use crate::resources::texturestore::TextureStore;

/// [`Canvas`] over any raylib draw handle.
pub struct RaylibCanvas<'a, D: RaylibDraw> {
    d: &'a mut D,
    textures: Option<&'a TextureStore>,
}

impl<'a, D: RaylibDraw> RaylibCanvas<'a, D> {
    pub fn new(d: &'a mut D, textures: Option<&'a TextureStore>) -> Self {
        Self { d, textures }
    }
}

impl<D: RaylibDraw> Canvas for RaylibCanvas<'_, D> {
    fn draw_image_region(&mut self, image: &ImageAsset, source: Rectangle, dest: Rectangle) {
        if let Some(tex) = self.textures.and_then(|t| t.get(image)) {
            self.d
                .draw_texture_pro(tex, source, dest, Vector2::zero(), 0.0, Color::WHITE);
        }
    }

    fn draw_rectangle_lines(&mut self, area: Rectangle, color: Color) {
        self.d.draw_rectangle_lines(
            area.x as i32,
            area.y as i32,
            area.width as i32,
            area.height as i32,
            color,
        );
    }

    fn draw_text(&mut self, text: &str, position: Vector2, size: i32, color: Color) {
        self.d
            .draw_text(text, position.x as i32, position.y as i32, size, color);
    }
}

/// Load a texture for every image the asset manager holds.
pub fn prepare_textures(world: &mut World, rl: &mut RaylibHandle, thread: &RaylibThread) {
    let images = match world.get_resource::<AssetManager>() {
        Some(assets) => assets.cached::<ImageAsset>(),
        None => return,
    };
    if let Some(mut textures) = world.get_non_send_resource_mut::<TextureStore>() {
        for (_, image) in images {
            textures.ensure_loaded(rl, thread, &image);
        }
    }
}

/// Draw the world layers through the camera.
pub fn render_pass(world: &World, d: &mut RaylibDrawHandle) {
    let Some(camera) = world.get_resource::<Camera>() else {
        return;
    };
    let textures = world.get_non_send_resource::<TextureStore>();
    let mut d2 = d.begin_mode2D(camera.to_camera2d());
    let mut canvas = RaylibCanvas::new(&mut d2, textures);

    if let Some(drawing) = world.get_non_send_resource::<WorldDrawing>() {
        drawing.draw(&mut canvas, camera.world_area());
    }

    if world.contains_resource::<DebugMode>() {
        if let Some(system) = world.get_non_send_resource::<MoveCollideSystem>() {
            draw_colliders(&mut canvas, system);
        }
    }
}

/// Draw the screen space layers.
pub fn render_overlay(world: &World, d: &mut RaylibDrawHandle) {
    let textures = world.get_non_send_resource::<TextureStore>();
    let mut canvas = RaylibCanvas::new(d, textures);
    if let Some(overlay) = world.get_non_send_resource::<OverlayDrawing>() {
        overlay.draw(&mut canvas);
    }
}

pub fn render_debug_ui(world: &World, d: &mut RaylibDrawHandle) {
    if !world.contains_resource::<DebugMode>() {
        return;
    }
    let fps = d.get_fps();
    let text = format!("DEBUG MODE (press F11 to toggle) | FPS: {}", fps);
    d.draw_text(&text, 10, 10, 10, Color::BLACK);

    if let Some(camera) = world.get_resource::<Camera>() {
        let cam_text = format!("Camera {}", camera.debug_info());
        let (_, h) = camera.size();
        d.draw_text(&cam_text, 10, h as i32 - 30, 10, Color::BLACK);

        let mouse = d.get_mouse_position();
        if let Some(world_pos) = camera.convert_screen_to_world(mouse) {
            let mouse_text = format!(
                "Mouse screen: ({:.1}, {:.1}) World: ({:.1}, {:.1})",
                mouse.x, mouse.y, world_pos.x, world_pos.y
            );
            d.draw_text(&mouse_text, 10, 30, 10, Color::BLACK);
        }
    }
}

fn draw_colliders(canvas: &mut dyn Canvas, system: &MoveCollideSystem) {
    for (_, collider) in system.space().iter() {
        if matches!(collider.shape, Shape::Line { .. }) {
            continue;
        }
        canvas.draw_rectangle_lines(collider.shape.aabb(), Color::RED);
    }
}
