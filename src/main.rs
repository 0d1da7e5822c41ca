//! Topdown asset checker and tile grid viewer.
//!
//! Without options the binary scans the asset directory and loads every
//! asset of every registered type, reporting failures and exiting non-zero
//! if any asset fails to load or initialize.
//!
//! ```sh
//! topdown --config config.ini          # check all assets
//! topdown --assets ./data --list       # list indexed assets per type
//! topdown --show levels/one.tilegrid   # open a window on a tile grid
//! ```

// Do not create console on Windows
#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;

use topdown::assets::standard_types;
use topdown::engine::Engine;
use topdown::resources::assetmanager::{AssetManager, TypeRegistry};
use topdown::resources::gameconfig::{ConfigError, GameConfig};
use topdown::viewer::ViewerMode;

/// Topdown 2D engine tools
#[derive(Parser)]
#[command(version, about = "Checks and views assets for the topdown engine.")]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Asset directory, overrides `[assets] root` from the config.
    #[arg(long, value_name = "DIR")]
    assets: Option<PathBuf>,

    /// List indexed assets per type and exit.
    #[arg(long, conflicts_with = "show")]
    list: bool,

    /// Open a window showing the tile grid at this partial path.
    #[arg(long, value_name = "TILEGRID")]
    show: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = GameConfig::with_path(&cli.config);
    match config.load_from_file() {
        Ok(()) => {}
        Err(e @ ConfigError::Load { .. }) => warn!("{}; using defaults", e),
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    }
    if let Some(root) = cli.assets {
        config.assets_root = root;
    }

    if let Some(grid) = cli.show {
        return show(config, grid);
    }

    let mut types = TypeRegistry::new("asset type");
    types.add(standard_types());
    let mut assets = AssetManager::new(&config.assets_root, types);
    if let Err(e) = assets.initialize() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    if cli.list {
        list(&assets);
        return ExitCode::SUCCESS;
    }

    let failures = check(&mut assets);
    if failures > 0 {
        error!("{} asset(s) failed to load", failures);
        ExitCode::FAILURE
    } else {
        info!("all {} assets loaded", assets.len());
        ExitCode::SUCCESS
    }
}

fn list(assets: &AssetManager) {
    for type_name in assets.type_names() {
        let paths = assets.partial_paths(&type_name);
        if paths.is_empty() {
            continue;
        }
        println!("{}:", type_name);
        for path in paths {
            println!("  {}", path);
        }
    }
}

/// Load every asset, returning the number of failures.
fn check(assets: &mut AssetManager) -> usize {
    let mut failures = 0;
    for type_name in assets.type_names() {
        for path in assets.partial_paths(&type_name) {
            match assets.get(&path) {
                Ok(_) => info!("ok {}", path),
                Err(e) => {
                    error!("{}: {}", path, e);
                    failures += 1;
                }
            }
        }
    }
    failures
}

fn show(config: GameConfig, grid: String) -> ExitCode {
    let (width, height) = config.window_size();
    let mut builder = raylib::init();
    builder
        .size(width as i32, height as i32)
        .resizable()
        .title("topdown");
    if config.vsync {
        builder.vsync();
    }
    if config.fullscreen {
        builder.fullscreen();
    }
    let (mut rl, thread) = builder.build();
    rl.set_target_fps(config.target_fps);
    // Disable ESC to exit
    rl.set_exit_key(None);

    let result = Engine::new(config, Vec::new()).and_then(|mut engine| {
        engine.start(Box::new(ViewerMode::new(grid)))?;
        engine.run(&mut rl, &thread)
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
