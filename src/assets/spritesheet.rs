//! Sprite sheets and sprite links.
//!
//! A sprite sheet is a JSON file naming rectangular regions of an image:
//!
//! ```json
//! {
//!   "imageRef": "hero.png",
//!   "sprites": [
//!     { "id": "walk0", "origin": { "x": 0, "y": 0 }, "size": { "w": 16, "h": 16 }, "tags": ["walk"] }
//!   ]
//! }
//! ```
//!
//! Other assets point at single sprites with a [`SpriteLink`]:
//! `"hero.spritesheet#walk0"` by id or `"hero.spritesheet:(0,0)"` by origin.

use crate::assets::image::ImageAsset;
use crate::assets::read_json;
use crate::geometry::{Point, Size};
use crate::resources::assetmanager::{Asset, AssetError, AssetManager, AssetType, LoadError};
use crate::resources::registry::Named;
use raylib::prelude::Rectangle;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Sprite {
    pub id: String,
    pub origin: Point,
    pub size: Size,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Sprite {
    /// Region of the sheet image covered by this sprite.
    pub fn source(&self) -> Rectangle {
        Rectangle::new(
            self.origin.x as f32,
            self.origin.y as f32,
            self.size.w as f32,
            self.size.h as f32,
        )
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteSheet {
    pub image_ref: String,
    pub sprites: Vec<Sprite>,
    #[serde(skip)]
    image: Option<Arc<ImageAsset>>,
}

impl SpriteSheet {
    /// The resolved sheet image, `None` until the sheet is initialized.
    pub fn image(&self) -> Option<&Arc<ImageAsset>> {
        self.image.as_ref()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.id == id)
    }

    pub fn find_by_origin(&self, origin: Point) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.origin == origin)
    }

    /// Every tag used by at least one sprite, sorted.
    pub fn tags(&self) -> Vec<String> {
        let tags: BTreeSet<&String> = self.sprites.iter().flat_map(|s| &s.tags).collect();
        tags.into_iter().cloned().collect()
    }

    /// Drawable handle for `sprite`. Requires an initialized sheet.
    pub fn sprite_ref(&self, sprite: &Sprite) -> Option<SpriteRef> {
        Some(SpriteRef {
            image: Arc::clone(self.image.as_ref()?),
            source: sprite.source(),
            id: sprite.id.clone(),
        })
    }

    fn validate(&self, image: &ImageAsset) -> Result<(), AssetError> {
        let mut ids = FxHashSet::default();
        for sprite in &self.sprites {
            if !ids.insert(sprite.id.as_str()) {
                return Err(AssetError::Invalid(format!(
                    "duplicate sprite id '{}'",
                    sprite.id
                )));
            }
            let Point { x, y } = sprite.origin;
            let fits = x >= 0
                && y >= 0
                && sprite.size.w > 0
                && sprite.size.h > 0
                && x as u64 + sprite.size.w as u64 <= image.width as u64
                && y as u64 + sprite.size.h as u64 <= image.height as u64;
            if !fits {
                return Err(AssetError::Invalid(format!(
                    "sprite '{}' at {} size {} exceeds image {} x {}",
                    sprite.id, sprite.origin, sprite.size, image.width, image.height
                )));
            }
        }
        Ok(())
    }
}

impl Asset for SpriteSheet {
    fn initialize(&mut self, assets: &mut AssetManager) -> Result<(), AssetError> {
        let image = assets.get_as::<ImageAsset>(&self.image_ref)?;
        self.validate(&image)?;
        self.image = Some(image);
        Ok(())
    }
}

pub struct SpriteSheetType;

impl Named for SpriteSheetType {
    fn name(&self) -> &str {
        "spritesheet"
    }
}

impl AssetType for SpriteSheetType {
    fn load(&self, path: &Path) -> Result<Box<dyn Asset>, LoadError> {
        let sheet: SpriteSheet = read_json(path)?;
        Ok(Box::new(sheet))
    }
}

/// A single sprite ready to draw: its image and source region.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteRef {
    pub image: Arc<ImageAsset>,
    pub source: Rectangle,
    pub id: String,
}

impl SpriteRef {
    pub fn width(&self) -> f32 {
        self.source.width
    }

    pub fn height(&self) -> f32 {
        self.source.height
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("sprite link '{0}' has no '#' or ':' separator")]
    MissingSeparator(String),
    #[error("sprite link '{0}' has an empty sheet reference")]
    EmptySheet(String),
    #[error("sprite link '{0}' has a malformed origin, expected (x,y)")]
    BadOrigin(String),
}

/// Reference to one sprite of a sheet, by id or by origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpriteLink {
    Id { sheet: String, id: String },
    Origin { sheet: String, origin: Point },
}

impl SpriteLink {
    pub fn sheet(&self) -> &str {
        match self {
            SpriteLink::Id { sheet, .. } | SpriteLink::Origin { sheet, .. } => sheet,
        }
    }

    /// Load the linked sheet and look the sprite up in it.
    pub fn resolve(&self, assets: &mut AssetManager) -> Result<SpriteRef, AssetError> {
        let sheet = assets.get_as::<SpriteSheet>(self.sheet())?;
        let sprite = match self {
            SpriteLink::Id { id, .. } => sheet.find_by_id(id),
            SpriteLink::Origin { origin, .. } => sheet.find_by_origin(*origin),
        }
        .ok_or_else(|| AssetError::Invalid(format!("sprite link '{self}' matches no sprite")))?;
        sheet
            .sprite_ref(sprite)
            .ok_or_else(|| AssetError::Invalid(format!("sheet '{}' has no image", self.sheet())))
    }
}

impl FromStr for SpriteLink {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((sheet, id)) = s.split_once('#') {
            if sheet.is_empty() {
                return Err(LinkError::EmptySheet(s.to_string()));
            }
            return Ok(SpriteLink::Id {
                sheet: sheet.to_string(),
                id: id.to_string(),
            });
        }
        let (sheet, origin) = s
            .split_once(':')
            .ok_or_else(|| LinkError::MissingSeparator(s.to_string()))?;
        if sheet.is_empty() {
            return Err(LinkError::EmptySheet(s.to_string()));
        }
        let bad = || LinkError::BadOrigin(s.to_string());
        let inner = origin
            .trim()
            .strip_prefix('(')
            .and_then(|o| o.strip_suffix(')'))
            .ok_or_else(bad)?;
        let (x, y) = inner.split_once(',').ok_or_else(bad)?;
        let x = x.trim().parse::<i32>().map_err(|_| bad())?;
        let y = y.trim().parse::<i32>().map_err(|_| bad())?;
        Ok(SpriteLink::Origin {
            sheet: sheet.to_string(),
            origin: Point::new(x, y),
        })
    }
}

impl fmt::Display for SpriteLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpriteLink::Id { sheet, id } => write!(f, "{sheet}#{id}"),
            SpriteLink::Origin { sheet, origin } => write!(f, "{sheet}:{origin}"),
        }
    }
}
