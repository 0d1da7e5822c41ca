//! Image assets.
//!
//! Only the header is decoded here; pixel data is uploaded to the GPU by the
//! renderer, which looks textures up by [`ImageAsset::path`].

use crate::resources::assetmanager::{Asset, AssetType, LoadError};
use crate::resources::registry::Named;
use raylib::prelude::Rectangle;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    /// Full path of the image file.
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl ImageAsset {
    /// Rectangle covering the whole image in pixel coordinates.
    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(0.0, 0.0, self.width as f32, self.height as f32)
    }

    /// Key used for this image in the texture store.
    pub fn texture_key(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

impl Asset for ImageAsset {}

/// Loads images with one extension (`png`, `jpg`, ...).
pub struct ImageType {
    ext: &'static str,
}

impl ImageType {
    pub fn new(ext: &'static str) -> Self {
        Self { ext }
    }
}

impl Named for ImageType {
    fn name(&self) -> &str {
        self.ext
    }
}

impl AssetType for ImageType {
    fn load(&self, path: &Path) -> Result<Box<dyn Asset>, LoadError> {
        let (width, height) = ::image::image_dimensions(path)?;
        Ok(Box::new(ImageAsset {
            path: path.to_path_buf(),
            width,
            height,
        }))
    }
}
