//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// An in-memory file system.
///
/// Files live in a `BTreeMap`; a path is a directory if any stored file
/// lives beneath it, which is what the module resolver's index-probing
/// needs. Cloning shares the underlying storage.
///
/// # Example
/// ```
/// use kestrel_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.write_file(Path::new("/lib/index.js"), b"export var x = 1;").unwrap();
/// assert!(fs.is_dir(Path::new("/lib")));
/// assert!(fs.is_file(Path::new("/lib/index.js")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory file system pre-populated with files
    pub fn with_files<I, S, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, C)>,
        S: AsRef<str>,
        C: Into<Vec<u8>>,
    {
        let fs = Self::new();
        {
            let mut map = fs.files.write().unwrap();
            for (path, content) in files {
                map.insert(normalize(Path::new(path.as_ref())), content.into());
            }
        }
        fs
    }

    /// Paths of all stored files, in sorted order
    pub fn paths(&self) -> Vec<String> {
        self.files.read().unwrap().keys().cloned().collect()
    }
}

fn normalize(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let key = normalize(path);
        let files = self.files.read().map_err(|_| VfsError::Custom {
            message: "lock poisoned".to_string(),
        })?;
        files
            .get(&key)
            .cloned()
            .ok_or(VfsError::NotFound { path: key })
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let key = normalize(path);
        let mut files = self.files.write().map_err(|_| VfsError::Custom {
            message: "lock poisoned".to_string(),
        })?;
        files.insert(key, content.to_vec());
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> VfsResult<()> {
        let key = normalize(path);
        let mut files = self.files.write().map_err(|_| VfsError::Custom {
            message: "lock poisoned".to_string(),
        })?;
        files
            .remove(&key)
            .map(|_| ())
            .ok_or(VfsError::NotFound { path: key })
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let key = normalize(path);
        match self.files.read() {
            Ok(files) => files.contains_key(&key),
            Err(_) => false,
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        let mut prefix = normalize(path);
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        match self.files.read() {
            Ok(files) => files.range(prefix.clone()..).next().is_some_and(|(k, _)| k.starts_with(&prefix)),
            Err(_) => false,
        }
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<PathBuf>> {
        let mut prefix = normalize(path);
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        let files = self.files.read().map_err(|_| VfsError::Custom {
            message: "lock poisoned".to_string(),
        })?;

        let mut entries: Vec<PathBuf> = Vec::new();
        for key in files.keys() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                // only direct children; nested files surface their subdirectory
                let child = match rest.split_once('/') {
                    Some((dir, _)) => format!("{prefix}{dir}"),
                    None => key.clone(),
                };
                let child = PathBuf::from(child);
                if !entries.contains(&child) {
                    entries.push(child);
                }
            }
        }
        // a directory exists here exactly when some stored file lives
        // beneath it
        if entries.is_empty() {
            return Err(VfsError::NotFound {
                path: normalize(path),
            });
        }
        Ok(entries)
    }
}
