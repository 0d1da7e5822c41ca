//! GPU textures for image assets.
//!
//! Keyed by [`ImageAsset::texture_key`]; filled by the renderer from the
//! images currently cached in the asset manager.

use crate::assets::image::ImageAsset;
use log::{debug, warn};
use raylib::prelude::{RaylibHandle, RaylibThread, Texture2D};
use rustc_hash::FxHashMap;

#[derive(Default)]
pub struct TextureStore {
    pub map: FxHashMap<String, Texture2D>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, image: &ImageAsset) -> Option<&Texture2D> {
        self.map.get(&image.texture_key())
    }

    /// Upload `image` unless it is already loaded. Returns whether a texture
    /// is available afterwards.
    pub fn ensure_loaded(
        &mut self,
        rl: &mut RaylibHandle,
        thread: &RaylibThread,
        image: &ImageAsset,
    ) -> bool {
        let key = image.texture_key();
        if self.map.contains_key(&key) {
            return true;
        }
        match rl.load_texture(thread, &key) {
            Ok(texture) => {
                debug!("loaded texture {}", key);
                self.map.insert(key, texture);
                true
            }
            Err(e) => {
                warn!("failed to load texture {}: {}", key, e);
                false
            }
        }
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
