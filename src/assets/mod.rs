//! Built-in asset types.
//!
//! - `image` – PNG/JPEG images, identified by path and pixel size
//! - `spritesheet` – named sprite regions inside an image, plus sprite links
//! - `animations` – tagged frame sequences built from a sprite sheet
//! - `tilegrid` – a grid of tiles drawn as a world background
//!
//! JSON based formats share [`read_json`] for decoding.

pub mod animations;
pub mod image;
pub mod spritesheet;
pub mod tilegrid;

use crate::resources::assetmanager::{AssetType, LoadError};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Every asset type shipped with the engine.
pub fn standard_types() -> Vec<Box<dyn AssetType>> {
    vec![
        Box::new(image::ImageType::new("png")),
        Box::new(image::ImageType::new("jpg")),
        Box::new(image::ImageType::new("jpeg")),
        Box::new(spritesheet::SpriteSheetType),
        Box::new(animations::AnimationsType),
        Box::new(tilegrid::TileGridType),
    ]
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
