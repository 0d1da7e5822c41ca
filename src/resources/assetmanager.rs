//! Lazy, memoized asset loading.
//!
//! An asset is addressed by its *partial path*: the path relative to the
//! asset root, e.g. `"sprites/hero.spritesheet"`. The extension selects the
//! [`AssetType`] that decodes the file. After decoding, the asset's
//! [`Asset::initialize`] hook runs with access to the manager so it can
//! resolve the assets it references; these nested requests go through the
//! same cache, so every asset is loaded and initialized at most once until
//! [`AssetManager::clear`] is called.
//!
//! A request for an asset that is still being initialized further up the
//! call stack fails with [`AssetError::CycleDetected`] instead of recursing.

use crate::resources::fileindex::{FileFilter, FileIndex, FileIndexError};
use crate::resources::registry::{Named, Registry};
use bevy_ecs::prelude::Resource;
use log::{debug, info};
use rustc_hash::FxHashMap;
use std::any::Any;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while decoding a single file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset type '{0}' not found")]
    TypeNotFound(String),
    #[error("asset '{0}' not found")]
    NotFound(String),
    #[error("failed to load {type_name} asset '{path}': {source}")]
    LoadFailed {
        type_name: String,
        path: String,
        #[source]
        source: LoadError,
    },
    #[error("failed to initialize asset '{path}': {source}")]
    InitFailed {
        path: String,
        #[source]
        source: Box<AssetError>,
    },
    #[error("dependency cycle detected: {}", chain.join(" -> "))]
    CycleDetected { chain: Vec<String> },
    #[error("asset '{path}' is not a {expected}")]
    UnexpectedType { path: String, expected: &'static str },
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Index(#[from] FileIndexError),
}

impl AssetError {
    /// Follow nested initialization failures down to the error that
    /// started them.
    pub fn innermost(&self) -> &AssetError {
        match self {
            AssetError::InitFailed { source, .. } => source.innermost(),
            other => other,
        }
    }
}

/// Upcast helper so cached assets can be downcast to their concrete type.
pub trait AsAnyArc {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A decoded asset.
pub trait Asset: Any + AsAnyArc + Send + Sync {
    /// Resolve references to other assets. Runs once, right after the
    /// asset is decoded and before it is cached.
    fn initialize(&mut self, assets: &mut AssetManager) -> Result<(), AssetError> {
        let _ = assets;
        Ok(())
    }
}

/// Decodes files with one particular extension into assets.
pub trait AssetType: Named + Send + Sync {
    fn load(&self, path: &Path) -> Result<Box<dyn Asset>, LoadError>;
}

pub type TypeRegistry = Registry<Box<dyn AssetType>>;

#[derive(Resource)]
pub struct AssetManager {
    index: FileIndex,
    types: TypeRegistry,
    cache: FxHashMap<String, Arc<dyn Asset>>,
    in_progress: Vec<String>,
}

impl AssetManager {
    pub fn new(root_dir: impl Into<PathBuf>, types: TypeRegistry) -> Self {
        Self {
            index: FileIndex::new(root_dir),
            types,
            cache: FxHashMap::default(),
            in_progress: Vec::new(),
        }
    }

    /// Scan the asset root. Must succeed before any asset can be found.
    pub fn initialize(&mut self) -> Result<(), AssetError> {
        self.index.scan()?;
        info!(
            "Asset manager ready: {} types, root {:?}",
            self.types.len(),
            self.index.root_dir()
        );
        Ok(())
    }

    pub fn root_dir(&self) -> &Path {
        self.index.root_dir()
    }

    pub fn file_index(&self) -> &FileIndex {
        &self.index
    }

    /// Names of the registered asset types, sorted.
    pub fn type_names(&self) -> Vec<String> {
        self.types.names()
    }

    /// Partial paths of every indexed file with the given type's extension,
    /// sorted.
    pub fn partial_paths(&self, type_name: &str) -> Vec<String> {
        let mut paths: Vec<String> = self
            .index
            .paths(&[FileFilter::ext(type_name)])
            .iter()
            .filter_map(|p| self.index.partial_path(p))
            .collect();
        paths.sort();
        paths
    }

    /// Fetch an asset, loading and initializing it on first use.
    pub fn get(&mut self, partial_path: &str) -> Result<Arc<dyn Asset>, AssetError> {
        let partial_path = normalize(partial_path);
        let partial_path = partial_path.as_str();
        if let Some(asset) = self.cache.get(partial_path) {
            return Ok(Arc::clone(asset));
        }

        if self.in_progress.iter().any(|p| p == partial_path) {
            let mut chain = self.in_progress.clone();
            chain.push(partial_path.to_string());
            return Err(AssetError::CycleDetected { chain });
        }

        let type_name = Path::new(partial_path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        let asset_type = self
            .types
            .get(&type_name)
            .ok_or_else(|| AssetError::TypeNotFound(type_name.clone()))?;

        let file_path = self.index.root_dir().join(partial_path);
        if !self.index.contains(&file_path) {
            return Err(AssetError::NotFound(partial_path.to_string()));
        }

        debug!("Loading {} asset '{}'", type_name, partial_path);
        let mut asset = asset_type
            .load(&file_path)
            .map_err(|source| AssetError::LoadFailed {
                type_name: type_name.clone(),
                path: partial_path.to_string(),
                source,
            })?;

        self.in_progress.push(partial_path.to_string());
        let result = asset.initialize(self);
        self.in_progress.pop();
        result.map_err(|source| AssetError::InitFailed {
            path: partial_path.to_string(),
            source: Box::new(source),
        })?;

        let asset: Arc<dyn Asset> = Arc::from(asset);
        self.cache
            .insert(partial_path.to_string(), Arc::clone(&asset));
        Ok(asset)
    }

    /// Fetch an asset and downcast it to its concrete type.
    pub fn get_as<T: Asset>(&mut self, partial_path: &str) -> Result<Arc<T>, AssetError> {
        let asset = self.get(partial_path)?;
        asset
            .into_any_arc()
            .downcast::<T>()
            .map_err(|_| AssetError::UnexpectedType {
                path: partial_path.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Fetch several assets of the same type, stopping at the first error.
    pub fn get_many_as<T: Asset>(&mut self, partial_paths: &[&str]) -> Result<Vec<Arc<T>>, AssetError> {
        partial_paths.iter().map(|p| self.get_as::<T>(p)).collect()
    }

    /// Insert an already built asset under `partial_path`, replacing any
    /// cached entry. The initialize hook is not run.
    pub fn add(&mut self, partial_path: impl AsRef<str>, asset: Arc<dyn Asset>) {
        self.cache.insert(normalize(partial_path.as_ref()), asset);
    }

    pub fn contains(&self, partial_path: &str) -> bool {
        self.cache.contains_key(&normalize(partial_path))
    }

    /// Every cached asset of type `T`, with its partial path, sorted by path.
    pub fn cached<T: Asset>(&self) -> Vec<(String, Arc<T>)> {
        let mut out: Vec<(String, Arc<T>)> = self
            .cache
            .iter()
            .filter_map(|(p, a)| {
                Arc::clone(a)
                    .into_any_arc()
                    .downcast::<T>()
                    .ok()
                    .map(|t| (p.clone(), t))
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Number of cached assets.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drop every cached asset. Assets still referenced elsewhere stay alive
    /// but the next request reloads from disk.
    pub fn clear(&mut self) {
        debug!("Clearing {} cached assets", self.cache.len());
        self.cache.clear();
    }
}

/// `/` separated form of a partial path: `.` parts and repeated
/// separators dropped, `..` applied.
fn normalize(partial_path: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    for component in Path::new(partial_path).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    parts.join("/")
}
