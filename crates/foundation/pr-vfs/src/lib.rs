//! Source file registry
//!
//! Hands out a [`FileId`] per source path, caches file contents, and accepts
//! in-memory sources that never touch the disk. Diagnostics carry `FileId`s;
//! embedders turn them back into paths through [`SourceFiles::path`].

use anyhow::{Context, Result};
use pr_span::FileId;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Registry of every source file seen during a compilation run
pub struct SourceFiles {
    inner: Arc<RwLock<SourceFilesInner>>,
}

struct SourceFilesInner {
    files: FxHashMap<FileId, FileData>,
    paths: FxHashMap<PathBuf, FileId>,
    next_id: u32,
}

/// Data associated with a file
#[derive(Clone, Debug)]
pub struct FileData {
    /// Path of the file, or a synthetic name for in-memory sources
    pub path: PathBuf,
    /// File contents (if loaded)
    pub contents: Option<Arc<str>>,
}

impl SourceFiles {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SourceFilesInner {
                files: FxHashMap::default(),
                paths: FxHashMap::default(),
                next_id: 0,
            })),
        }
    }

    /// Registers a path and returns its ID; registering twice yields the same ID
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned
    pub fn register(&self, path: impl AsRef<Path>) -> Result<FileId> {
        let path = path.as_ref().to_path_buf();
        let mut inner = self
            .inner
            .write()
            .map_err(|_| anyhow::anyhow!("Lock poisoned"))?;

        if let Some(&file_id) = inner.paths.get(&path) {
            return Ok(file_id);
        }

        let file_id = FileId::new(inner.next_id);
        inner.next_id += 1;
        inner.files.insert(
            file_id,
            FileData {
                path: path.clone(),
                contents: None,
            },
        );
        inner.paths.insert(path, file_id);

        Ok(file_id)
    }

    /// Registers a source that lives only in memory under a synthetic name
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned
    pub fn insert_memory(&self, name: impl AsRef<Path>, contents: &str) -> Result<FileId> {
        let file_id = self.register(name)?;
        let mut inner = self
            .inner
            .write()
            .map_err(|_| anyhow::anyhow!("Lock poisoned"))?;
        if let Some(data) = inner.files.get_mut(&file_id) {
            data.contents = Some(Arc::from(contents));
        }
        Ok(file_id)
    }

    /// Returns the contents of a file, reading it from disk on first access
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unknown, cannot be read, or the lock is poisoned
    pub fn read(&self, file_id: FileId) -> Result<Arc<str>> {
        let path = {
            let inner = self
                .inner
                .read()
                .map_err(|_| anyhow::anyhow!("Lock poisoned"))?;
            let data = inner
                .files
                .get(&file_id)
                .ok_or_else(|| anyhow::anyhow!("File not found: {file_id}"))?;
            if let Some(contents) = &data.contents {
                return Ok(Arc::clone(contents));
            }
            data.path.clone()
        };

        let contents: Arc<str> = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read source file: {}", path.display()))?
            .into();

        let mut inner = self
            .inner
            .write()
            .map_err(|_| anyhow::anyhow!("Lock poisoned"))?;
        if let Some(data) = inner.files.get_mut(&file_id) {
            data.contents = Some(Arc::clone(&contents));
        }

        Ok(contents)
    }

    /// Gets the path a file was registered under
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned or the file is unknown
    pub fn path(&self, file_id: FileId) -> Result<PathBuf> {
        let inner = self
            .inner
            .read()
            .map_err(|_| anyhow::anyhow!("Lock poisoned"))?;
        Ok(inner
            .files
            .get(&file_id)
            .ok_or_else(|| anyhow::anyhow!("File not found: {file_id}"))?
            .path
            .clone())
    }

    /// Gets the ID of a previously registered path
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned
    pub fn lookup(&self, path: impl AsRef<Path>) -> Result<Option<FileId>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| anyhow::anyhow!("Lock poisoned"))?;
        Ok(inner.paths.get(path.as_ref()).copied())
    }
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SourceFiles {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
