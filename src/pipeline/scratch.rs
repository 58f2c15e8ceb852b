//! Drop-guarded intermediate artifacts
//!
//! The separation directory and the staging file are shared paths reused by
//! every track. A guard removes its path when dropped, so every exit from a
//! track (success, stage failure or panic) leaves them absent.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    File,
    Dir,
}

/// A path that is deleted when the guard goes out of scope
#[derive(Debug)]
pub struct Scratch {
    path: PathBuf,
    kind: Kind,
}

impl Scratch {
    /// Guard a single file
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: Kind::File,
        }
    }

    /// Guard a directory tree
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: Kind::Dir,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the path now. Missing paths are fine; other failures are logged.
    pub fn remove(&self) {
        let result = match self.kind {
            Kind::File => fs::remove_file(&self.path),
            Kind::Dir => fs::remove_dir_all(&self.path),
        };

        match result {
            Ok(()) => debug!("Removed {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dir_removed_on_drop() {
        let root = TempDir::new().unwrap();
        let scratch_path = root.path().join("separated");
        fs::create_dir_all(scratch_path.join("nested")).unwrap();
        fs::write(scratch_path.join("vocals.wav"), b"x").unwrap();

        {
            let _guard = Scratch::dir(&scratch_path);
        }
        assert!(!scratch_path.exists());
    }

    #[test]
    fn test_file_removed_on_early_return() {
        fn fails(path: &Path) -> Result<(), ()> {
            let staging = Scratch::file(path);
            fs::write(staging.path(), b"partial").unwrap();
            Err(())
        }

        let root = TempDir::new().unwrap();
        let staging = root.path().join("staging.flac");
        assert!(fails(&staging).is_err());
        assert!(!staging.exists());
    }

    #[test]
    fn test_missing_path_is_not_an_error() {
        let root = TempDir::new().unwrap();
        let guard = Scratch::file(root.path().join("never-created.flac"));
        guard.remove();
        drop(guard);
    }
}
