//! Tile grids drawn as world backgrounds.
//!
//! ```json
//! {
//!   "minPosition": { "x": 0, "y": 0 },
//!   "tileSize": { "w": 32, "h": 32 },
//!   "tileDefs": { "g": "terrain.spritesheet#grass", "w": "terrain.spritesheet:(16,0)" },
//!   "tileRows": ["g g w", "g w w"]
//! }
//! ```
//!
//! Rows are whitespace separated tile keys. Every key must be defined in
//! `tileDefs` and every row must have the same number of tiles. Sprites are
//! scaled to the tile size when drawn.

use crate::assets::read_json;
use crate::assets::spritesheet::{SpriteLink, SpriteRef};
use crate::geometry::{RectangleExt, Size, Vector};
use crate::resources::assetmanager::{Asset, AssetError, AssetManager, AssetType, LoadError};
use crate::resources::drawing::{Canvas, WORLD_BACKGROUND, WorldDrawable};
use crate::resources::registry::Named;
use log::debug;
use raylib::prelude::{Rectangle, Vector2};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub key: String,
    pub sprite: SpriteRef,
    pub scale_x: f32,
    pub scale_y: f32,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileGrid {
    #[serde(default)]
    pub min_position: Vector,
    pub tile_size: Size,
    pub tile_defs: BTreeMap<String, String>,
    pub tile_rows: Vec<String>,
    #[serde(skip)]
    tiles: Vec<Vec<Tile>>,
}

impl TileGrid {
    pub fn rows(&self) -> usize {
        self.tiles.len()
    }

    pub fn cols(&self) -> usize {
        self.tiles.first().map_or(0, Vec::len)
    }

    pub fn tile(&self, row: usize, col: usize) -> Option<&Tile> {
        self.tiles.get(row)?.get(col)
    }

    /// World area covered by the grid.
    pub fn world_area(&self) -> Rectangle {
        Rectangle::new(
            self.min_position.x,
            self.min_position.y,
            self.cols() as f32 * self.tile_size.w as f32,
            self.rows() as f32 * self.tile_size.h as f32,
        )
    }

    pub fn center(&self) -> Vector2 {
        self.world_area().center()
    }

    /// World rectangle of the tile at `row`, `col`.
    pub fn tile_area(&self, row: usize, col: usize) -> Rectangle {
        let (w, h) = (self.tile_size.w as f32, self.tile_size.h as f32);
        Rectangle::new(
            self.min_position.x + col as f32 * w,
            self.min_position.y + row as f32 * h,
            w,
            h,
        )
    }

    /// Row and column ranges of the tiles overlapping `visible`.
    pub fn visible_range(&self, visible: Rectangle) -> Option<(Range<usize>, Range<usize>)> {
        let area = self.world_area().intersect(&visible)?;
        let (w, h) = (self.tile_size.w as f32, self.tile_size.h as f32);
        let rel_min = Vector2::new(area.x - self.min_position.x, area.y - self.min_position.y);
        let rel_max = Vector2::new(rel_min.x + area.width, rel_min.y + area.height);
        let first_col = (rel_min.x / w).floor() as usize;
        let first_row = (rel_min.y / h).floor() as usize;
        let last_col = ((rel_max.x / w).ceil() as usize).min(self.cols());
        let last_row = ((rel_max.y / h).ceil() as usize).min(self.rows());
        Some((first_row..last_row, first_col..last_col))
    }

    fn build(&self, defs: &FxHashMap<&str, SpriteRef>) -> Result<Vec<Vec<Tile>>, AssetError> {
        if self.tile_size.w == 0 || self.tile_size.h == 0 {
            return Err(AssetError::Invalid(format!(
                "tile size {} must be positive",
                self.tile_size
            )));
        }
        let mut tiles = Vec::with_capacity(self.tile_rows.len());
        for line in &self.tile_rows {
            let mut row = Vec::new();
            for key in line.split_whitespace() {
                let sprite = defs.get(key).ok_or_else(|| {
                    AssetError::Invalid(format!("tile key '{key}' has no definition"))
                })?;
                row.push(Tile {
                    key: key.to_string(),
                    scale_x: self.tile_size.w as f32 / sprite.width(),
                    scale_y: self.tile_size.h as f32 / sprite.height(),
                    sprite: sprite.clone(),
                });
            }
            tiles.push(row);
        }
        check_shape(&tiles)?;
        Ok(tiles)
    }
}

fn check_shape(tiles: &[Vec<Tile>]) -> Result<(), AssetError> {
    let Some(first) = tiles.first() else {
        return Err(AssetError::Invalid("tile grid has no rows".into()));
    };
    if first.is_empty() {
        return Err(AssetError::Invalid("tile grid has no columns".into()));
    }
    let counts: Vec<usize> = tiles.iter().map(Vec::len).collect();
    if counts.iter().any(|&c| c != first.len()) {
        return Err(AssetError::Invalid(format!(
            "tile rows have inconsistent column counts {counts:?}"
        )));
    }
    Ok(())
}

impl Asset for TileGrid {
    fn initialize(&mut self, assets: &mut AssetManager) -> Result<(), AssetError> {
        let mut defs = FxHashMap::default();
        for (key, link) in &self.tile_defs {
            let link: SpriteLink = link
                .parse()
                .map_err(|e| AssetError::Invalid(format!("tile '{key}': {e}")))?;
            defs.insert(key.as_str(), link.resolve(assets)?);
        }
        self.tiles = self.build(&defs)?;
        debug!("tile grid {} x {} ready", self.cols(), self.rows());
        Ok(())
    }
}

impl WorldDrawable for TileGrid {
    fn world_layer(&self) -> i32 {
        WORLD_BACKGROUND
    }

    fn world_sort_value(&self) -> f32 {
        0.0
    }

    fn world_bounds(&self) -> Option<Rectangle> {
        Some(self.world_area())
    }

    fn world_draw(&self, canvas: &mut dyn Canvas, visible: Rectangle) {
        let Some((rows, cols)) = self.visible_range(visible) else {
            return;
        };
        for row in rows {
            for col in cols.clone() {
                if let Some(tile) = self.tile(row, col) {
                    canvas.draw_image_region(
                        &tile.sprite.image,
                        tile.sprite.source,
                        self.tile_area(row, col),
                    );
                }
            }
        }
    }
}

pub struct TileGridType;

impl Named for TileGridType {
    fn name(&self) -> &str {
        "tilegrid"
    }
}

impl AssetType for TileGridType {
    fn load(&self, path: &Path) -> Result<Box<dyn Asset>, LoadError> {
        let grid: TileGrid = read_json(path)?;
        Ok(Box::new(grid))
    }
}
