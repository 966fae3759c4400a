//! File-system collaborators of the resolver.
//!
//! The resolver never opens files itself: it asks a SourceLoader whether a
//! candidate exists, and asks it to load the first one that does.

use anyhow::{anyhow, Context, Result};
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Existence check and load primitive used during resolution.
///
/// `load` must be idempotent: loading an already-loaded path is a no-op.
pub trait SourceLoader {
    /// Ok(false) if nothing is at `path`; Err only for I/O failures other
    /// than absence.
    fn exists(&self, path: &Path) -> Result<bool>;

    fn load(&self, path: &Path) -> Result<()>;
}

impl<L: SourceLoader + ?Sized> SourceLoader for &L {
    fn exists(&self, path: &Path) -> Result<bool> {
        (**self).exists(path)
    }

    fn load(&self, path: &Path) -> Result<()> {
        (**self).load(path)
    }
}

/// Loader backed by the local file system.
/// Loaded sources are kept in memory as raw bytes, keyed by path.
#[derive(Debug, Default)]
pub struct FsLoader {
    loaded: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl FsLoader {
    pub fn new() -> Self {
        Default::default()
    }

    /// Contents of a previously loaded file, in whatever encoding it has
    pub fn source(&self, path: &Path) -> Option<Vec<u8>> {
        self.loaded.lock().ok()?.get(path).cloned()
    }

    pub fn is_loaded(&self, path: &Path) -> bool {
        self.loaded.lock().map(|l| l.contains_key(path)).unwrap_or(false)
    }

    /// All loaded paths, sorted
    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        let mut paths = match self.loaded.lock() {
            Ok(l) => l.keys().cloned().collect::<Vec<_>>(),
            Err(_) => Vec::new(),
        };
        paths.sort();
        paths
    }
}

impl SourceLoader for FsLoader {
    fn exists(&self, path: &Path) -> Result<bool> {
        match fs::metadata(path) {
            // Directories are not loadable sources
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("checking {}", path.display())),
        }
    }

    fn load(&self, path: &Path) -> Result<()> {
        let mut loaded = self.loaded.lock().map_err(|_| anyhow!("loader state poisoned"))?;
        if loaded.contains_key(path) {
            debug!("{} already loaded", path.display());
            return Ok(());
        }
        let src = fs::read(path).with_context(|| format!("loading {}", path.display()))?;
        debug!("loaded {} ({} bytes)", path.display(), src.len());
        loaded.insert(path.to_path_buf(), src);
        Ok(())
    }
}
