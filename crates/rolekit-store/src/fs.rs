//! Filesystem access
//!
//! Every filesystem call the store makes goes through [`FileSystem`], so
//! lookups can be observed or faked in tests.

use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Filesystem operations used by the definition store
pub trait FileSystem: Send + Sync {
    /// Absolute path with symlinks resolved
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    fn is_file(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Entries of a directory, sorted by path
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Files below `root` (at any depth) whose name matches `file_pattern`,
    /// in traversal order
    fn find(&self, root: &Path, file_pattern: &str) -> io::Result<Vec<PathBuf>>;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        path.canonicalize()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            entries.push(entry?.path());
        }
        entries.sort();
        Ok(entries)
    }

    fn find(&self, root: &Path, file_pattern: &str) -> io::Result<Vec<PathBuf>> {
        let root_str = root.to_str().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Path is not valid UTF-8: {}", root.display()),
            )
        })?;
        let pattern = format!("{}/**/{}", glob::Pattern::escape(root_str), file_pattern);

        let paths = glob::glob(&pattern)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

        let mut found = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) => found.push(path),
                Err(e) => warn!("Skipping unreadable path {:?}: {}", e.path(), e.error()),
            }
        }
        Ok(found)
    }
}
