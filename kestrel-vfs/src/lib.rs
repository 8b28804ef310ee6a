//! Kestrel VFS - file system abstraction
//!
//! The resolver probes and reads source modules, and the orchestrator
//! writes and deletes transient build products, all through the
//! `VirtualFileSystem` trait. `MemoryFileSystem` backs tests;
//! `NativeFileSystem` is the production implementation.

mod error;
mod memory;
mod native;

pub use error::{VfsError, VfsResult};
pub use memory::MemoryFileSystem;
pub use native::NativeFileSystem;

use std::path::{Path, PathBuf};

/// File system operations the driver needs
///
/// Paths are treated as opaque; implementations normalize separators as
/// they see fit.
pub trait VirtualFileSystem: Send + Sync {
    /// Read a file's contents
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Write a file, creating it if absent and truncating it otherwise
    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()>;

    /// Delete a file
    fn remove_file(&self, path: &Path) -> VfsResult<()>;

    /// Whether the path exists at all
    fn exists(&self, path: &Path) -> bool;

    /// Whether the path exists and is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Whether the path exists and is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// List the entries directly under a directory
    fn read_dir(&self, path: &Path) -> VfsResult<Vec<PathBuf>>;
}

/// Convenience for reading UTF-8 source text
pub fn read_to_string(vfs: &dyn VirtualFileSystem, path: &Path) -> VfsResult<String> {
    let bytes = vfs.read_file(path)?;
    String::from_utf8(bytes).map_err(|e| VfsError::InvalidPath {
        path: path.display().to_string(),
        reason: format!("invalid UTF-8: {e}"),
    })
}
