//! Keeping track of the archives opened from files

use std::{
    path::{Path, PathBuf},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use indexmap::IndexMap;
use tracing::{info, instrument};

use crate::{
    archive::Archive,
    error::{Error, Result},
    options::OpenOptions,
};

/// The archives opened from files, at most one per file
///
/// Files are identified by their canonical path, so different spellings of the same file share
/// one entry. The registry can be shared between threads.
///
/// ```no_run
/// use szs_vfs::ArchiveRegistry;
///
/// let registry = ArchiveRegistry::new();
/// let archive = registry.open("Common.szs")?;
/// assert!(registry.get("./Common.szs").is_some());
///
/// registry.close("Common.szs")?;
/// assert!(!archive.is_open());
/// # Ok::<(), szs_vfs::error::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct ArchiveRegistry {
    options: OpenOptions,
    archives: RwLock<IndexMap<PathBuf, Arc<Archive>>>,
}

impl ArchiveRegistry {
    /// An empty registry opening archives with the default [`OpenOptions`]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry opening archives with `options`
    pub fn with_options(options: OpenOptions) -> Self {
        ArchiveRegistry {
            options,
            archives: RwLock::default(),
        }
    }

    // The map is never left half updated, so poisoning is ignored
    fn read(&self) -> RwLockReadGuard<'_, IndexMap<PathBuf, Arc<Archive>>> {
        self.archives
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<PathBuf, Arc<Archive>>> {
        self.archives
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open the archive stored at `path` and register it.
    ///
    /// Fails with [`Error::AlreadyOpen`] when the file is registered already.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()), err)]
    pub fn open(&self, path: impl AsRef<Path>) -> Result<Arc<Archive>> {
        let path = path.as_ref().canonicalize()?;
        if self.read().contains_key(&path) {
            return Err(Error::AlreadyOpen(path));
        }

        let archive = Arc::new(Archive::open_path_with(&path, &self.options)?);

        let mut archives = self.write();
        if archives.contains_key(&path) {
            archive.close();
            return Err(Error::AlreadyOpen(path));
        }
        info!(format = %archive.format(), "registered {}", path.display());
        archives.insert(path, Arc::clone(&archive));
        Ok(archive)
    }

    /// The archive registered for the file at `path`
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Arc<Archive>> {
        let path = path.as_ref().canonicalize().ok()?;
        self.read().get(&path).cloned()
    }

    /// Remove the archive registered for `path` and close it.
    ///
    /// Fails with [`Error::NotOpen`] when nothing is registered for the file.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()), err)]
    pub fn close(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let Ok(canonical) = path.canonicalize() else {
            return Err(Error::NotOpen(path.to_path_buf()));
        };
        let Some(archive) = self.write().shift_remove(&canonical) else {
            return Err(Error::NotOpen(canonical));
        };
        archive.close();
        info!("closed {}", canonical.display());
        Ok(())
    }

    /// Close and remove every registered archive
    pub fn close_all(&self) {
        for (_, archive) in self.write().drain(..) {
            archive.close();
        }
    }

    /// Number of registered archives
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no archive is registered
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Canonical paths of the registered archives, in the order they were opened
    pub fn paths(&self) -> Vec<PathBuf> {
        self.read().keys().cloned().collect()
    }
}
