//! Transient-file registry
//!
//! Every file the orchestrator creates is registered here. The registry is
//! append-only during the build and consumed exactly once at build end:
//! either drained with best-effort deletion, or discarded untouched when
//! the caller asked to keep temporaries.

use kestrel_vfs::VirtualFileSystem;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only list of transient files created during one build
#[derive(Debug, Default)]
pub struct TempFileRegistry {
    paths: Vec<PathBuf>,
}

impl TempFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Delete every registered file, best-effort. Consumes the registry so
    /// draining can only happen once.
    pub fn cleanup(self, vfs: &dyn VirtualFileSystem) {
        for path in self.paths {
            if let Err(e) = vfs.remove_file(&path) {
                debug!(target: "kestrel::toolchain", path = %path.display(), "cleanup skipped: {e}");
            }
        }
    }

    /// Drop the registry without touching any file (retention requested)
    pub fn discard(self) {}

    /// Whether a path was registered
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }
}
