//! Shared 2D camera resource.
//!
//! The camera has a position in world space, a screen size in pixels and a
//! zoom level. Together they define two rectangles: the screen area
//! (`0,0` to `width,height`) and the world area the camera currently sees,
//! centered on the camera position and `1/zoom` times the screen size.
//! Points are converted between the two by linear interpolation.
//!
//! The world area is never allowed to exceed [`MAX_WIDTH`] x [`MAX_HEIGHT`],
//! which puts a lower bound on the zoom level: see [`min_zoom_level`].

use crate::geometry::RectangleExt;
use crate::resources::debugmode::{DebugInfo, DebugPrintable};
use bevy_ecs::prelude::Resource;
use log::warn;
use raylib::prelude::{Camera2D, Rectangle, Vector2};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

pub const MAX_WIDTH: u32 = 2048;
pub const MAX_HEIGHT: u32 = 2048;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("camera size {width} x {height} is too big")]
    TooBig { width: u32, height: u32 },
    #[error("camera size {width} x {height} must be non-zero")]
    Empty { width: u32, height: u32 },
}

/// Smallest zoom that keeps the world area of a `width` x `height` camera
/// within the maximum size.
pub fn min_zoom_level(width: u32, height: u32) -> f32 {
    let by_width = width as f32 / MAX_WIDTH as f32;
    let by_height = height as f32 / MAX_HEIGHT as f32;
    by_width.max(by_height)
}

/// World rectangle seen by a camera centered on `position`.
pub fn world_area(zoom: f32, width: u32, height: u32, position: Vector2) -> Rectangle {
    let w = width as f32 / zoom;
    let h = height as f32 / zoom;
    Rectangle::new(position.x - w / 2.0, position.y - h / 2.0, w, h)
}

#[derive(Resource, Debug, Clone)]
pub struct Camera {
    position: Vector2,
    zoom: f32,
    width: u32,
    height: u32,
    world_area: Rectangle,
    screen_area: Rectangle,
}

impl Camera {
    /// Camera at the world origin with zoom 1.
    pub fn new(width: u32, height: u32) -> Result<Self, CameraError> {
        let mut cam = Self {
            position: Vector2::zero(),
            zoom: 1.0,
            width: 0,
            height: 0,
            world_area: Rectangle::new(0.0, 0.0, 0.0, 0.0),
            screen_area: Rectangle::new(0.0, 0.0, 0.0, 0.0),
        };
        cam.resize(width, height)?;
        Ok(cam)
    }

    /// Camera position in screen space, always the screen center.
    pub fn screen_position(&self) -> Vector2 {
        Vector2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    pub fn screen_area(&self) -> Rectangle {
        self.screen_area
    }

    pub fn world_position(&self) -> Vector2 {
        self.position
    }

    pub fn world_area(&self) -> Rectangle {
        self.world_area
    }

    pub fn zoom_level(&self) -> f32 {
        self.zoom
    }

    pub fn min_zoom_level(&self) -> f32 {
        min_zoom_level(self.width, self.height)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// `None` when `world_pos` lies outside the world area.
    pub fn convert_world_to_screen(&self, world_pos: Vector2) -> Option<Vector2> {
        convert(world_pos, self.world_area, self.screen_area)
    }

    /// `None` when `screen_pos` lies outside the screen area.
    pub fn convert_screen_to_world(&self, screen_pos: Vector2) -> Option<Vector2> {
        convert(screen_pos, self.screen_area, self.world_area)
    }

    /// Change the screen size. The zoom is raised to the new minimum if
    /// needed. On error the camera is unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), CameraError> {
        if width > MAX_WIDTH || height > MAX_HEIGHT {
            return Err(CameraError::TooBig { width, height });
        }
        if width == 0 || height == 0 {
            return Err(CameraError::Empty { width, height });
        }
        self.width = width;
        self.height = height;
        self.screen_area = Rectangle::new(0.0, 0.0, width as f32, height as f32);
        self.zoom = self.zoom.max(self.min_zoom_level());
        self.update_world_area();
        Ok(())
    }

    /// Center the camera on `position`.
    pub fn move_to(&mut self, position: Vector2) {
        self.position = position;
        self.update_world_area();
    }

    /// Set the zoom level, clamped to the minimum. Non-positive and
    /// non-finite levels are ignored.
    pub fn zoom(&mut self, level: f32) {
        if !level.is_finite() || level <= 0.0 {
            warn!("ignoring invalid camera zoom {}", level);
            return;
        }
        self.zoom = level.max(self.min_zoom_level());
        self.update_world_area();
    }

    /// raylib camera drawing the world area onto the whole screen.
    pub fn to_camera2d(&self) -> Camera2D {
        Camera2D {
            offset: self.screen_position(),
            target: self.position,
            rotation: 0.0,
            zoom: self.zoom,
        }
    }

    fn update_world_area(&mut self) {
        self.world_area = world_area(self.zoom, self.width, self.height, self.position);
    }
}

impl DebugPrintable for Camera {
    fn debug_info(&self) -> DebugInfo {
        DebugInfo::new()
            .with("x", format!("{:.0}", self.position.x))
            .with("y", format!("{:.0}", self.position.y))
            .with("zoom", format!("{:.2}", self.zoom))
            .with("w", format!("{:.0}", self.world_area.width))
            .with("h", format!("{:.0}", self.world_area.height))
    }
}

fn convert(p: Vector2, from: Rectangle, to: Rectangle) -> Option<Vector2> {
    if !from.contains_or_on_max(p) {
        return None;
    }
    let frac_x = (p.x - from.x) / from.width;
    let frac_y = (p.y - from.y) / from.height;
    Some(Vector2::new(
        to.x + to.width * frac_x,
        to.y + to.height * frac_y,
    ))
}

/// Something the camera can follow.
pub trait CameraTarget {
    fn camera_target(&self) -> Vector2;
}

/// Non-send resource naming the object the camera keeps centered.
pub struct CameraFocus {
    pub target: Rc<RefCell<dyn CameraTarget>>,
}

impl CameraFocus {
    pub fn new(target: Rc<RefCell<dyn CameraTarget>>) -> Self {
        Self { target }
    }

    pub fn position(&self) -> Vector2 {
        self.target.borrow().camera_target()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> Vector2 {
        Vector2::new(x, y)
    }

    fn assert_round_trip(cam: &Camera, world: Vector2, screen: Vector2) {
        assert_eq!(cam.convert_world_to_screen(world), Some(screen), "world {world:?}");
        assert_eq!(cam.convert_screen_to_world(screen), Some(world), "screen {screen:?}");
    }

    #[test]
    fn defaults() {
        let cam = Camera::new(500, 300).unwrap();
        assert_eq!(cam.world_position(), v(0.0, 0.0));
        assert_eq!(cam.zoom_level(), 1.0);
        assert_eq!(cam.screen_position(), v(250.0, 150.0));
        assert_eq!(cam.world_area(), Rectangle::new(-250.0, -150.0, 500.0, 300.0));
    }

    #[test]
    fn too_big_or_empty_is_rejected() {
        assert_eq!(
            Camera::new(MAX_WIDTH + 1, 300).unwrap_err(),
            CameraError::TooBig { width: MAX_WIDTH + 1, height: 300 }
        );
        assert!(Camera::new(300, MAX_HEIGHT + 1).is_err());
        assert!(Camera::new(0, 300).is_err());

        let mut cam = Camera::new(200, 200).unwrap();
        assert!(cam.resize(MAX_WIDTH + 1, 200).is_err());
        assert!(cam.resize(200, MAX_HEIGHT + 1).is_err());
        assert_eq!(cam.size(), (200, 200));
    }

    #[test]
    fn min_zoom_levels() {
        assert_eq!(min_zoom_level(MAX_WIDTH, MAX_HEIGHT), 1.0);
        assert_eq!(min_zoom_level(800, 600), 800.0 / MAX_WIDTH as f32);
        assert_eq!(min_zoom_level(400, 600), 600.0 / MAX_HEIGHT as f32);
    }

    #[test]
    fn zoom_is_clamped_and_world_area_follows() {
        let cases = [
            (v(0.0, 0.0), 400, 200, 1.0, 1.0),
            (v(-10.0, 150.0), 640, 480, 2.0, 2.0),
            (v(250.0, -170.0), 320, 240, 0.5, 0.5),
            (v(-25.0, -50.0), 800, 600, min_zoom_level(800, 600), min_zoom_level(800, 600)),
            (v(44.0, 26.0), 1200, 900, min_zoom_level(1200, 900) / 2.0, min_zoom_level(1200, 900)),
        ];
        for (center, w, h, zoom, expected) in cases {
            let mut cam = Camera::new(w, h).unwrap();
            cam.move_to(center);
            cam.zoom(zoom);
            assert_eq!(cam.zoom_level(), expected);
            assert_eq!(cam.world_position(), center);
            assert_eq!(cam.world_area(), world_area(expected, w, h, center));
            assert!(cam.world_area().width <= MAX_WIDTH as f32);
            assert!(cam.world_area().height <= MAX_HEIGHT as f32);
        }
    }

    #[test]
    fn invalid_zoom_is_ignored() {
        let mut cam = Camera::new(500, 300).unwrap();
        cam.zoom(2.0);
        cam.zoom(0.0);
        cam.zoom(-1.0);
        cam.zoom(f32::NAN);
        cam.zoom(f32::INFINITY);
        assert_eq!(cam.zoom_level(), 2.0);
        assert_eq!(cam.world_area(), Rectangle::new(-125.0, -75.0, 250.0, 150.0));
    }

    #[test]
    fn resize_raises_zoom_to_new_minimum() {
        let mut cam = Camera::new(200, 200).unwrap();
        let min = cam.min_zoom_level();
        cam.zoom(min);
        cam.resize(400, 400).unwrap();
        assert_eq!(cam.zoom_level(), min * 2.0);
    }

    #[test]
    fn conversions_outside_area_fail() {
        let cam = Camera::new(500, 300).unwrap();
        assert_eq!(cam.convert_world_to_screen(v(-251.0, -150.0)), None);
        assert_eq!(cam.convert_world_to_screen(v(-250.0, -151.0)), None);
        assert_eq!(cam.convert_world_to_screen(v(251.0, 0.0)), None);
        // Only the max corner is included, not the rest of the max edges.
        assert_eq!(cam.convert_world_to_screen(v(250.0, 0.0)), None);
        assert_eq!(cam.convert_world_to_screen(v(0.0, 150.0)), None);
        assert_eq!(cam.convert_world_to_screen(v(250.0, 150.0)), Some(v(500.0, 300.0)));
        assert_eq!(cam.convert_screen_to_world(v(500.0, 0.0)), None);
        assert_eq!(cam.convert_screen_to_world(v(-1.0, 0.0)), None);
        assert_eq!(cam.convert_screen_to_world(v(0.0, -1.0)), None);
        assert_eq!(cam.convert_screen_to_world(v(501.0, 0.0)), None);
    }

    #[test]
    fn conversions_at_default_zoom() {
        let mut cam = Camera::new(500, 300).unwrap();
        assert_round_trip(&cam, cam.world_position(), cam.screen_position());
        assert_round_trip(&cam, v(-250.0, -150.0), v(0.0, 0.0));
        assert_round_trip(&cam, v(250.0, 150.0), v(500.0, 300.0));

        cam.move_to(v(100.0, 50.0));
        assert_round_trip(&cam, v(100.0, 50.0), cam.screen_position());
        assert_round_trip(&cam, v(-150.0, -100.0), v(0.0, 0.0));
        assert_round_trip(&cam, v(350.0, 200.0), v(500.0, 300.0));
    }

    #[test]
    fn conversions_at_half_zoom() {
        let mut cam = Camera::new(500, 300).unwrap();
        cam.zoom(0.5);
        assert_round_trip(&cam, cam.world_position(), cam.screen_position());
        assert_round_trip(&cam, v(-500.0, -300.0), v(0.0, 0.0));
        assert_round_trip(&cam, v(500.0, 300.0), v(500.0, 300.0));

        cam.move_to(v(100.0, 50.0));
        assert_round_trip(&cam, v(100.0, 50.0), cam.screen_position());
        assert_round_trip(&cam, v(-400.0, -250.0), v(0.0, 0.0));
        assert_round_trip(&cam, v(600.0, 350.0), v(500.0, 300.0));
    }

    #[test]
    fn camera2d_matches_conversion() {
        let mut cam = Camera::new(500, 300).unwrap();
        cam.zoom(2.0);
        cam.move_to(v(10.0, 20.0));
        let c = cam.to_camera2d();
        let world = v(-52.5, -17.5);
        let by_raylib = v(
            (world.x - c.target.x) * c.zoom + c.offset.x,
            (world.y - c.target.y) * c.zoom + c.offset.y,
        );
        assert_eq!(cam.convert_world_to_screen(world), Some(by_raylib));
    }

    #[test]
    fn debug_info_lists_position_and_zoom() {
        let cam = Camera::new(500, 300).unwrap();
        let info = cam.debug_info();
        assert_eq!(info.get("zoom"), Some("1.00"));
        assert_eq!(info.get("w"), Some("500"));
    }
}
