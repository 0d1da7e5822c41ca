//! Layered drawing registries.
//!
//! [`WorldDrawing`] holds drawables positioned in world space. Layers are
//! drawn in ascending order; inside a layer, drawables are drawn by
//! ascending sort value, which for a top-down view is usually the y of the
//! entity's feet. Drawables reporting bounds that miss the camera's world
//! area are skipped. [`OverlayDrawing`] holds screen space drawables (HUD,
//! debug text) and draws them after the world.
//!
//! Both only talk to a [`Canvas`], so they can be exercised without a
//! window. The raylib backed canvas lives in `systems::render`.

use crate::assets::image::ImageAsset;
use crate::geometry::RectangleExt;
use log::debug;
use raylib::prelude::{Color, Rectangle, Vector2};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

pub const WORLD_BACKGROUND: i32 = 0;
pub const WORLD_FLOOR: i32 = 100;
pub const WORLD_OBJECTS: i32 = 200;
pub const WORLD_ABOVE: i32 = 300;
pub const WORLD_DEBUG: i32 = 400;

pub const OVERLAY_HUD: i32 = 0;
pub const OVERLAY_MENU: i32 = 100;
pub const OVERLAY_DEBUG: i32 = 400;

/// Minimal set of drawing primitives used by drawables.
pub trait Canvas {
    /// Draw the `source` region of `image` stretched over `dest`.
    fn draw_image_region(&mut self, image: &ImageAsset, source: Rectangle, dest: Rectangle);
    fn draw_rectangle_lines(&mut self, area: Rectangle, color: Color);
    fn draw_text(&mut self, text: &str, position: Vector2, size: i32, color: Color);
}

pub trait WorldDrawable {
    fn world_layer(&self) -> i32;
    /// Order inside the layer, lower values first.
    fn world_sort_value(&self) -> f32;
    /// World area the drawable may paint. `None` means anywhere.
    fn world_bounds(&self) -> Option<Rectangle> {
        None
    }
    /// `visible` is the world area currently covered by the camera.
    fn world_draw(&self, canvas: &mut dyn Canvas, visible: Rectangle);
}

pub trait OverlayDrawable {
    fn overlay_layer(&self) -> i32;
    fn overlay_draw(&self, canvas: &mut dyn Canvas);
}

impl<T: WorldDrawable + ?Sized> WorldDrawable for RefCell<T> {
    fn world_layer(&self) -> i32 {
        self.borrow().world_layer()
    }

    fn world_sort_value(&self) -> f32 {
        self.borrow().world_sort_value()
    }

    fn world_bounds(&self) -> Option<Rectangle> {
        self.borrow().world_bounds()
    }

    fn world_draw(&self, canvas: &mut dyn Canvas, visible: Rectangle) {
        self.borrow().world_draw(canvas, visible)
    }
}

impl<T: WorldDrawable + ?Sized> WorldDrawable for Arc<T> {
    fn world_layer(&self) -> i32 {
        (**self).world_layer()
    }

    fn world_sort_value(&self) -> f32 {
        (**self).world_sort_value()
    }

    fn world_bounds(&self) -> Option<Rectangle> {
        (**self).world_bounds()
    }

    fn world_draw(&self, canvas: &mut dyn Canvas, visible: Rectangle) {
        (**self).world_draw(canvas, visible)
    }
}

impl<T: OverlayDrawable + ?Sized> OverlayDrawable for RefCell<T> {
    fn overlay_layer(&self) -> i32 {
        self.borrow().overlay_layer()
    }

    fn overlay_draw(&self, canvas: &mut dyn Canvas) {
        self.borrow().overlay_draw(canvas)
    }
}

#[derive(Default)]
struct WorldLayer {
    entries: Vec<(String, Rc<dyn WorldDrawable>)>,
}

/// World space drawables grouped by layer.
#[derive(Default)]
pub struct WorldDrawing {
    layers: BTreeMap<i32, WorldLayer>,
}

impl WorldDrawing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a drawable under `id` in the layer it reports. An existing
    /// drawable with the same id is replaced.
    pub fn add(&mut self, id: impl Into<String>, drawable: Rc<dyn WorldDrawable>) {
        let id = id.into();
        self.remove(&id);
        let layer = drawable.world_layer();
        self.layers
            .entry(layer)
            .or_default()
            .entries
            .push((id, drawable));
    }

    /// Remove the drawable registered under `id`, wherever it is.
    pub fn remove(&mut self, id: &str) -> bool {
        let mut removed = false;
        for layer in self.layers.values_mut() {
            let before = layer.entries.len();
            layer.entries.retain(|(i, _)| i != id);
            removed |= layer.entries.len() != before;
        }
        self.layers.retain(|_, l| !l.entries.is_empty());
        removed
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    pub fn len(&self) -> usize {
        self.layers.values().map(|l| l.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer numbers in drawing order.
    pub fn layers(&self) -> Vec<i32> {
        self.layers.keys().copied().collect()
    }

    /// Draw every drawable that may show inside `visible`.
    pub fn draw(&self, canvas: &mut dyn Canvas, visible: Rectangle) {
        for layer in self.layers.values() {
            let mut ordered: Vec<(f32, &Rc<dyn WorldDrawable>)> = layer
                .entries
                .iter()
                .filter(|(_, d)| d.world_bounds().is_none_or(|b| b.touches(&visible)))
                .map(|(_, d)| (d.world_sort_value(), d))
                .collect();
            ordered.sort_by(|a, b| a.0.total_cmp(&b.0));
            for (_, drawable) in ordered {
                drawable.world_draw(canvas, visible);
            }
        }
    }
}

/// Screen space drawables grouped by layer, drawn by id within a layer.
#[derive(Default)]
pub struct OverlayDrawing {
    layers: BTreeMap<i32, BTreeMap<String, Rc<dyn OverlayDrawable>>>,
}

impl OverlayDrawing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: impl Into<String>, drawable: Rc<dyn OverlayDrawable>) {
        let id = id.into();
        self.remove(&id);
        let layer = drawable.overlay_layer();
        debug!("overlay '{}' added to layer {}", id, layer);
        self.layers.entry(layer).or_default().insert(id, drawable);
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let mut removed = false;
        for layer in self.layers.values_mut() {
            removed |= layer.remove(id).is_some();
        }
        self.layers.retain(|_, l| !l.is_empty());
        removed
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    pub fn len(&self) -> usize {
        self.layers.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn draw(&self, canvas: &mut dyn Canvas) {
        for layer in self.layers.values() {
            for drawable in layer.values() {
                drawable.overlay_draw(canvas);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Canvas that records what was drawn.
    #[derive(Default)]
    pub(crate) struct RecordingCanvas {
        pub images: Vec<(Rectangle, Rectangle)>,
        pub rects: Vec<Rectangle>,
        pub texts: Vec<String>,
    }

    impl Canvas for RecordingCanvas {
        fn draw_image_region(&mut self, _image: &ImageAsset, source: Rectangle, dest: Rectangle) {
            self.images.push((source, dest));
        }

        fn draw_rectangle_lines(&mut self, area: Rectangle, _color: Color) {
            self.rects.push(area);
        }

        fn draw_text(&mut self, text: &str, _position: Vector2, _size: i32, _color: Color) {
            self.texts.push(text.to_string());
        }
    }

    struct Label {
        layer: i32,
        sort: f32,
        text: &'static str,
    }

    struct Sign {
        area: Rectangle,
        text: &'static str,
    }

    impl WorldDrawable for Sign {
        fn world_layer(&self) -> i32 {
            WORLD_OBJECTS
        }

        fn world_sort_value(&self) -> f32 {
            self.area.y
        }

        fn world_bounds(&self) -> Option<Rectangle> {
            Some(self.area)
        }

        fn world_draw(&self, canvas: &mut dyn Canvas, _visible: Rectangle) {
            canvas.draw_text(self.text, self.area.min(), 10, Color::WHITE);
        }
    }

    impl WorldDrawable for Label {
        fn world_layer(&self) -> i32 {
            self.layer
        }

        fn world_sort_value(&self) -> f32 {
            self.sort
        }

        fn world_draw(&self, canvas: &mut dyn Canvas, _visible: Rectangle) {
            canvas.draw_text(self.text, Vector2::zero(), 10, Color::WHITE);
        }
    }

    impl OverlayDrawable for Label {
        fn overlay_layer(&self) -> i32 {
            self.layer
        }

        fn overlay_draw(&self, canvas: &mut dyn Canvas) {
            canvas.draw_text(self.text, Vector2::zero(), 10, Color::WHITE);
        }
    }

    fn label(layer: i32, sort: f32, text: &'static str) -> Rc<Label> {
        Rc::new(Label { layer, sort, text })
    }

    #[test]
    fn world_draws_by_layer_then_sort_value() {
        let mut drawing = WorldDrawing::new();
        drawing.add("tree", label(WORLD_OBJECTS, 50.0, "tree"));
        drawing.add("ground", label(WORLD_BACKGROUND, 999.0, "ground"));
        drawing.add("hero", label(WORLD_OBJECTS, 20.0, "hero"));
        drawing.add("roof", label(WORLD_ABOVE, 0.0, "roof"));

        let mut canvas = RecordingCanvas::default();
        drawing.draw(&mut canvas, Rectangle::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(canvas.texts, vec!["ground", "hero", "tree", "roof"]);
        assert_eq!(drawing.layers(), vec![WORLD_BACKGROUND, WORLD_OBJECTS, WORLD_ABOVE]);
    }

    #[test]
    fn world_skips_drawables_outside_the_visible_area() {
        let mut drawing = WorldDrawing::new();
        let sign = |x: f32, text| {
            Rc::new(Sign {
                area: Rectangle::new(x, 10.0, 20.0, 20.0),
                text,
            })
        };
        drawing.add("near", sign(50.0, "near"));
        drawing.add("edge", sign(100.0, "edge"));
        drawing.add("far", sign(500.0, "far"));
        drawing.add("label", label(WORLD_OBJECTS, 0.0, "label"));

        let mut canvas = RecordingCanvas::default();
        drawing.draw(&mut canvas, Rectangle::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(canvas.texts, vec!["label", "near", "edge"]);
    }

    #[test]
    fn world_remove_and_replace() {
        let mut drawing = WorldDrawing::new();
        drawing.add("a", label(WORLD_OBJECTS, 0.0, "a"));
        drawing.add("a", label(WORLD_FLOOR, 0.0, "a2"));
        assert_eq!(drawing.len(), 1);
        assert_eq!(drawing.layers(), vec![WORLD_FLOOR]);

        assert!(drawing.remove("a"));
        assert!(!drawing.remove("a"));
        assert!(drawing.is_empty());

        drawing.add("b", label(WORLD_FLOOR, 0.0, "b"));
        drawing.clear();
        assert_eq!(drawing.len(), 0);
    }

    #[test]
    fn refcell_drawables_are_accepted() {
        let mut drawing = WorldDrawing::new();
        let shared = Rc::new(RefCell::new(Label {
            layer: WORLD_OBJECTS,
            sort: 1.0,
            text: "shared",
        }));
        drawing.add("shared", shared.clone());
        shared.borrow_mut().text = "changed";

        let mut canvas = RecordingCanvas::default();
        drawing.draw(&mut canvas, Rectangle::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(canvas.texts, vec!["changed"]);
    }

    #[test]
    fn overlay_draws_layers_in_order() {
        let mut overlay = OverlayDrawing::new();
        overlay.add("fps", label(OVERLAY_DEBUG, 0.0, "fps"));
        overlay.add("score", label(OVERLAY_HUD, 0.0, "score"));
        overlay.add("lives", label(OVERLAY_HUD, 0.0, "lives"));
        assert_eq!(overlay.len(), 3);

        let mut canvas = RecordingCanvas::default();
        overlay.draw(&mut canvas);
        assert_eq!(canvas.texts, vec!["lives", "score", "fps"]);

        assert!(overlay.remove("fps"));
        overlay.clear();
        assert!(overlay.is_empty());
    }
}
