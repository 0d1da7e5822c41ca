//! Tagged animations built from a sprite sheet.
//!
//! ```json
//! { "spriteSheetRef": "hero.spritesheet", "frameDurationMs": 100 }
//! ```
//!
//! Every tag of the referenced sheet becomes one animation whose frames are
//! the tagged sprites ordered top to bottom, then left to right.

use crate::assets::read_json;
use crate::assets::spritesheet::{Sprite, SpriteRef, SpriteSheet};
use crate::resources::assetmanager::{Asset, AssetError, AssetManager, AssetType, LoadError};
use crate::resources::registry::Named;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Animations {
    pub sprite_sheet_ref: String,
    pub frame_duration_ms: u64,
    #[serde(skip)]
    sheet: Option<Arc<SpriteSheet>>,
    #[serde(skip)]
    frames: BTreeMap<String, Vec<SpriteRef>>,
}

impl Animations {
    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(self.frame_duration_ms)
    }

    pub fn sheet(&self) -> Option<&Arc<SpriteSheet>> {
        self.sheet.as_ref()
    }

    /// Tags with at least one frame, sorted.
    pub fn tags(&self) -> Vec<&str> {
        self.frames.keys().map(String::as_str).collect()
    }

    /// Frames of the animation named `tag`.
    pub fn frames(&self, tag: &str) -> Option<&[SpriteRef]> {
        self.frames.get(tag).map(Vec::as_slice)
    }
}

/// Sprites carrying `tag`, ordered by row then column.
pub fn tagged_sprites<'a>(sheet: &'a SpriteSheet, tag: &str) -> Vec<&'a Sprite> {
    let mut sprites: Vec<&Sprite> = sheet.sprites.iter().filter(|s| s.has_tag(tag)).collect();
    sprites.sort_by_key(|s| (s.origin.y, s.origin.x));
    sprites
}

impl Asset for Animations {
    fn initialize(&mut self, assets: &mut AssetManager) -> Result<(), AssetError> {
        if self.frame_duration_ms == 0 {
            return Err(AssetError::Invalid("frameDurationMs must be positive".into()));
        }
        let sheet = assets.get_as::<SpriteSheet>(&self.sprite_sheet_ref)?;
        let mut frames = BTreeMap::new();
        for tag in sheet.tags() {
            let refs = tagged_sprites(&sheet, &tag)
                .into_iter()
                .filter_map(|s| sheet.sprite_ref(s))
                .collect::<Vec<_>>();
            frames.insert(tag, refs);
        }
        self.frames = frames;
        self.sheet = Some(sheet);
        Ok(())
    }
}

pub struct AnimationsType;

impl Named for AnimationsType {
    fn name(&self) -> &str {
        "animations"
    }
}

impl AssetType for AnimationsType {
    fn load(&self, path: &Path) -> Result<Box<dyn Asset>, LoadError> {
        let animations: Animations = read_json(path)?;
        Ok(Box::new(animations))
    }
}
