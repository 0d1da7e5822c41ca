//! Index of every regular file below an asset root directory.
//!
//! The index is built by [`FileIndex::scan`] and then answers path queries
//! filtered by containing directory and/or extension without touching the
//! file system again. Each scan fully rebuilds the three views so a rescan
//! never leaves stale entries behind.

use log::{debug, info};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileIndexError {
    #[error("asset root '{}' cannot be read: {source}", .root.display())]
    RootUnreadable {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("asset root '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Restricts the result of [`FileIndex::paths`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFilter {
    /// Files whose immediate parent is this directory. Relative
    /// directories are resolved against the index root.
    Dir(PathBuf),
    /// Files with this extension, with or without the leading dot.
    Ext(String),
}

impl FileFilter {
    pub fn dir(dir: impl Into<PathBuf>) -> Self {
        FileFilter::Dir(dir.into())
    }

    pub fn ext(ext: impl Into<String>) -> Self {
        FileFilter::Ext(ext.into())
    }
}

#[derive(Debug, Clone)]
pub struct FileIndex {
    root_dir: PathBuf,
    last_scan_complete: Option<SystemTime>,
    paths_by_dir: FxHashMap<PathBuf, Vec<PathBuf>>,
    paths_by_ext: FxHashMap<String, Vec<PathBuf>>,
    all_paths: Vec<PathBuf>,
    known: FxHashSet<PathBuf>,
}

impl FileIndex {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            last_scan_complete: None,
            paths_by_dir: FxHashMap::default(),
            paths_by_ext: FxHashMap::default(),
            all_paths: Vec::new(),
            known: FxHashSet::default(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Time the last successful scan finished, `None` before the first one.
    pub fn last_scan_complete(&self) -> Option<SystemTime> {
        self.last_scan_complete
    }

    /// Walk the root recursively, in file name order, and rebuild every view
    /// of the index.
    ///
    /// Symlinks and directories are not indexed. On failure the previous
    /// index content is left untouched.
    pub fn scan(&mut self) -> Result<(), FileIndexError> {
        let meta = std::fs::metadata(&self.root_dir).map_err(|source| {
            FileIndexError::RootUnreadable {
                root: self.root_dir.clone(),
                source,
            }
        })?;
        if !meta.is_dir() {
            return Err(FileIndexError::NotADirectory(self.root_dir.clone()));
        }

        let mut paths_by_dir: FxHashMap<PathBuf, Vec<PathBuf>> = FxHashMap::default();
        let mut paths_by_ext: FxHashMap<String, Vec<PathBuf>> = FxHashMap::default();
        let mut all_paths = Vec::new();

        let mut files = Vec::new();
        walk(&self.root_dir, &mut files)?;
        for path in files {
            if let Some(parent) = path.parent() {
                paths_by_dir
                    .entry(parent.to_path_buf())
                    .or_default()
                    .push(path.clone());
            }
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                paths_by_ext
                    .entry(ext.to_string())
                    .or_default()
                    .push(path.clone());
            }
            all_paths.push(path);
        }

        info!(
            "Indexed {} files in {} directories under {:?}",
            all_paths.len(),
            paths_by_dir.len(),
            self.root_dir
        );

        self.known = all_paths.iter().cloned().collect();
        self.paths_by_dir = paths_by_dir;
        self.paths_by_ext = paths_by_ext;
        self.all_paths = all_paths;
        self.last_scan_complete = Some(SystemTime::now());
        Ok(())
    }

    /// Query indexed paths.
    ///
    /// No filter returns every file. With several filters of the same kind
    /// the last one wins. A directory and an extension filter together
    /// return the union of both lists: directory matches first, then
    /// extension matches not already listed.
    pub fn paths(&self, filters: &[FileFilter]) -> Vec<PathBuf> {
        let mut dir = None;
        let mut ext = None;
        for filter in filters {
            match filter {
                FileFilter::Dir(d) => dir = Some(self.resolve_dir(d)),
                FileFilter::Ext(e) => ext = Some(e.trim_start_matches('.')),
            }
        }

        let by_dir = dir
            .as_ref()
            .map(|d| self.paths_by_dir.get(d).map(Vec::as_slice).unwrap_or(&[]));
        let by_ext = ext.map(|e| self.paths_by_ext.get(e).map(Vec::as_slice).unwrap_or(&[]));

        match (by_dir, by_ext) {
            (None, None) => self.all_paths.clone(),
            (Some(d), None) => d.to_vec(),
            (None, Some(e)) => e.to_vec(),
            (Some(d), Some(e)) => {
                let mut out = d.to_vec();
                let seen: FxHashSet<&PathBuf> = d.iter().collect();
                out.extend(e.iter().filter(|p| !seen.contains(p)).cloned());
                debug!("dir+ext query returned {} paths", out.len());
                out
            }
        }
    }

    /// Whether `path` was seen by the last scan.
    pub fn contains(&self, path: &Path) -> bool {
        self.known.contains(path)
    }

    /// Directories that hold at least one indexed file.
    pub fn dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.paths_by_dir.keys().cloned().collect();
        dirs.sort();
        dirs
    }

    /// Extensions (without dot) of indexed files.
    pub fn exts(&self) -> Vec<String> {
        let mut exts: Vec<String> = self.paths_by_ext.keys().cloned().collect();
        exts.sort();
        exts
    }

    /// `path` relative to the root, with `/` separators.
    pub fn partial_path(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root_dir).ok()?;
        let parts: Vec<_> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }

    fn resolve_dir(&self, dir: &Path) -> PathBuf {
        if dir.starts_with(&self.root_dir) {
            dir.to_path_buf()
        } else {
            self.root_dir.join(dir)
        }
    }
}

/// Collect regular files below `dir`, depth first, entries sorted by name.
fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), FileIndexError> {
    let read_error = |source| FileIndexError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(read_error)?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .map_err(read_error)?;
    entries.sort();

    for path in entries {
        let file_type = std::fs::symlink_metadata(&path)
            .map_err(|source| FileIndexError::Read {
                path: path.clone(),
                source,
            })?
            .file_type();
        if file_type.is_dir() {
            walk(&path, out)?;
        } else if file_type.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::create_dir_all(root.join("b/c")).unwrap();
        fs::write(root.join("top.png"), b"x").unwrap();
        fs::write(root.join("a/one.png"), b"x").unwrap();
        fs::write(root.join("a/two.json"), b"x").unwrap();
        fs::write(root.join("b/three.png"), b"x").unwrap();
        fs::write(root.join("b/c/four.txt"), b"x").unwrap();
        dir
    }

    #[test]
    fn scan_indexes_regular_files_recursively() {
        let tree = sample_tree();
        let mut index = FileIndex::new(tree.path());
        assert!(index.last_scan_complete().is_none());
        index.scan().unwrap();

        assert!(index.last_scan_complete().is_some());
        assert_eq!(index.paths(&[]).len(), 5);
        assert_eq!(index.exts(), vec!["json", "png", "txt"]);
        assert_eq!(index.dirs().len(), 4);
        assert!(index.contains(&tree.path().join("b/c/four.txt")));
        assert!(!index.contains(&tree.path().join("b/c")));
    }

    #[test]
    fn filter_by_dir_and_ext() {
        let tree = sample_tree();
        let mut index = FileIndex::new(tree.path());
        index.scan().unwrap();

        let in_a = index.paths(&[FileFilter::dir("a")]);
        assert_eq!(in_a.len(), 2);
        let pngs = index.paths(&[FileFilter::ext(".png")]);
        assert_eq!(pngs.len(), 3);
        assert!(index.paths(&[FileFilter::ext("gif")]).is_empty());
        assert!(index.paths(&[FileFilter::dir("missing")]).is_empty());
    }

    #[test]
    fn dir_and_ext_filters_union_without_duplicates() {
        let tree = sample_tree();
        let mut index = FileIndex::new(tree.path());
        index.scan().unwrap();

        let dir = tree.path().join("a");
        let both = index.paths(&[FileFilter::Dir(dir.clone()), FileFilter::ext("png")]);
        let by_dir = index.paths(&[FileFilter::Dir(dir)]);
        let by_ext = index.paths(&[FileFilter::ext("png")]);

        let mut expected: Vec<PathBuf> = by_dir.clone();
        for p in by_ext {
            if !expected.contains(&p) {
                expected.push(p);
            }
        }
        assert_eq!(both, expected);
        assert_eq!(both.len(), 4);
        assert_eq!(&both[..2], by_dir.as_slice());
    }

    #[test]
    fn last_filter_of_a_kind_wins() {
        let tree = sample_tree();
        let mut index = FileIndex::new(tree.path());
        index.scan().unwrap();
        let txt = index.paths(&[FileFilter::ext("png"), FileFilter::ext("txt")]);
        assert_eq!(txt, vec![tree.path().join("b/c/four.txt")]);
    }

    #[test]
    fn rescan_rebuilds_views() {
        let tree = sample_tree();
        let mut index = FileIndex::new(tree.path());
        index.scan().unwrap();
        fs::remove_file(tree.path().join("top.png")).unwrap();
        index.scan().unwrap();
        assert_eq!(index.paths(&[FileFilter::ext("png")]).len(), 2);
        assert!(!index.contains(&tree.path().join("top.png")));
    }

    #[test]
    fn scan_fails_for_missing_or_file_root() {
        let tree = sample_tree();
        let mut missing = FileIndex::new(tree.path().join("nope"));
        assert!(matches!(missing.scan(), Err(FileIndexError::RootUnreadable { .. })));

        let mut file_root = FileIndex::new(tree.path().join("top.png"));
        assert!(matches!(file_root.scan(), Err(FileIndexError::NotADirectory(_))));
    }

    #[test]
    fn partial_path_uses_forward_slashes() {
        let tree = sample_tree();
        let index = FileIndex::new(tree.path());
        let p = tree.path().join("b").join("c").join("four.txt");
        assert_eq!(index.partial_path(&p).as_deref(), Some("b/c/four.txt"));
        assert_eq!(index.partial_path(Path::new("/elsewhere/x")), None);
    }
}
