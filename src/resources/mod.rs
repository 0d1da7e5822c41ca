//! Long-lived engine state.
//!
//! Plain ECS resources (`Camera`, `GameConfig`, `WorldTime`, ...) and the
//! non-send registries that hold shared game objects (`MoveCollideSystem`,
//! `ControlSystem`, `WorldDrawing`, ...).
//!
//! Overview
//! - `animation` – registry of objects advanced every tick
//! - `assetmanager` – lazy, cached asset loading with dependency resolution
//! - `camera` – world/screen transforms and zoom limits
//! - `control` – keyboard driven objects
//! - `debugmode` – presence toggles debug overlays; debug key/value info
//! - `drawing` – world and overlay drawing layers
//! - `fileindex` – scanned view of the asset directory
//! - `gameconfig` – INI backed settings
//! - `input` – watched key state
//! - `movecollide` – movement, collision, triggers and raycasts
//! - `registry` – named lookup tables
//! - `screensize` – current framebuffer dimensions
//! - `texturestore` – GPU textures for image assets
//! - `worldtime` – simulation time and delta
pub mod animation;
pub mod assetmanager;
pub mod camera;
pub mod control;
pub mod debugmode;
pub mod drawing;
pub mod fileindex;
pub mod gameconfig;
pub mod input;
pub mod movecollide;
pub mod registry;
pub mod screensize;
pub mod texturestore;
pub mod worldtime;
