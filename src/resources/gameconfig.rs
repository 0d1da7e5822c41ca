//! Game configuration resource.
//!
//! Settings loaded from an INI file. Every value has a safe default, and
//! keys missing from the file keep it.
//!
//! # Configuration File Format
//!
//! ```ini
//! [window]
//! width = 1280
//! height = 720
//! fullscreen = false
//! vsync = true
//! target_fps = 60
//!
//! [assets]
//! root = ./assets
//!
//! [camera]
//! zoom = 1.0
//!
//! [world]
//! width = 2048
//! height = 2048
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_WINDOW_WIDTH: u32 = 1280;
const DEFAULT_WINDOW_HEIGHT: u32 = 720;
const DEFAULT_TARGET_FPS: u32 = 60;
const DEFAULT_VSYNC: bool = true;
const DEFAULT_FULLSCREEN: bool = false;
const DEFAULT_ASSETS_ROOT: &str = "./assets";
const DEFAULT_ZOOM: f32 = 1.0;
const DEFAULT_WORLD_WIDTH: f32 = 2048.0;
const DEFAULT_WORLD_HEIGHT: f32 = 2048.0;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config file {path:?}: {message}")]
    Load { path: PathBuf, message: String },
    #[error("failed to save config file {path:?}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid value for [{section}] {key}: {message}")]
    Value {
        section: &'static str,
        key: &'static str,
        message: String,
    },
}

#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub target_fps: u32,
    pub vsync: bool,
    pub fullscreen: bool,
    /// Directory scanned by the asset manager.
    pub assets_root: PathBuf,
    /// Initial camera zoom, raised to the camera's minimum if lower.
    pub camera_zoom: f32,
    pub world_width: f32,
    pub world_height: f32,
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            target_fps: DEFAULT_TARGET_FPS,
            vsync: DEFAULT_VSYNC,
            fullscreen: DEFAULT_FULLSCREEN,
            assets_root: PathBuf::from(DEFAULT_ASSETS_ROOT),
            camera_zoom: DEFAULT_ZOOM,
            world_width: DEFAULT_WORLD_WIDTH,
            world_height: DEFAULT_WORLD_HEIGHT,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current values. Present but malformed
    /// values are an error.
    pub fn load_from_file(&mut self) -> Result<(), ConfigError> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|message| ConfigError::Load {
                path: self.config_path.clone(),
                message,
            })?;

        // [window] section
        if let Some(width) = get_uint(&config, "window", "width")? {
            self.window_width = width;
        }
        if let Some(height) = get_uint(&config, "window", "height")? {
            self.window_height = height;
        }
        if let Some(fps) = get_uint(&config, "window", "target_fps")? {
            self.target_fps = fps;
        }
        if let Some(vsync) = get_bool(&config, "window", "vsync")? {
            self.vsync = vsync;
        }
        if let Some(fullscreen) = get_bool(&config, "window", "fullscreen")? {
            self.fullscreen = fullscreen;
        }

        // [assets] section
        if let Some(root) = config.get("assets", "root") {
            self.assets_root = PathBuf::from(root);
        }

        // [camera] section
        if let Some(zoom) = get_float(&config, "camera", "zoom")? {
            self.camera_zoom = zoom;
        }

        // [world] section
        if let Some(width) = get_float(&config, "world", "width")? {
            self.world_width = width;
        }
        if let Some(height) = get_float(&config, "world", "height")? {
            self.world_height = height;
        }

        info!(
            "Loaded config: {}x{} window, fps={}, vsync={}, fullscreen={}, assets={:?}, world {}x{}",
            self.window_width,
            self.window_height,
            self.target_fps,
            self.vsync,
            self.fullscreen,
            self.assets_root,
            self.world_width,
            self.world_height
        );

        Ok(())
    }

    /// Save configuration to the INI file, creating it if needed.
    pub fn save_to_file(&self) -> Result<(), ConfigError> {
        let mut config = Ini::new();

        config.set("window", "width", Some(self.window_width.to_string()));
        config.set("window", "height", Some(self.window_height.to_string()));
        config.set("window", "target_fps", Some(self.target_fps.to_string()));
        config.set("window", "vsync", Some(self.vsync.to_string()));
        config.set("window", "fullscreen", Some(self.fullscreen.to_string()));
        config.set(
            "assets",
            "root",
            Some(self.assets_root.to_string_lossy().into_owned()),
        );
        config.set("camera", "zoom", Some(self.camera_zoom.to_string()));
        config.set("world", "width", Some(self.world_width.to_string()));
        config.set("world", "height", Some(self.world_height.to_string()));

        config
            .write(&self.config_path)
            .map_err(|source| ConfigError::Save {
                path: self.config_path.clone(),
                source,
            })?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

fn get_uint(
    config: &Ini,
    section: &'static str,
    key: &'static str,
) -> Result<Option<u32>, ConfigError> {
    let value = config
        .getuint(section, key)
        .map_err(|message| ConfigError::Value {
            section,
            key,
            message,
        })?;
    value
        .map(|v| {
            u32::try_from(v).map_err(|e| ConfigError::Value {
                section,
                key,
                message: e.to_string(),
            })
        })
        .transpose()
}

fn get_bool(
    config: &Ini,
    section: &'static str,
    key: &'static str,
) -> Result<Option<bool>, ConfigError> {
    config
        .getbool(section, key)
        .map_err(|message| ConfigError::Value {
            section,
            key,
            message,
        })
}

fn get_float(
    config: &Ini,
    section: &'static str,
    key: &'static str,
) -> Result<Option<f32>, ConfigError> {
    config
        .getfloat(section, key)
        .map(|v| v.map(|v| v as f32))
        .map_err(|message| ConfigError::Value {
            section,
            key,
            message,
        })
}
