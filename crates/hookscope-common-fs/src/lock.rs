//! Advisory lock files.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{ensure_parent, FsError, Result};

/// An exclusive advisory lock on a dedicated lock file, released on drop.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Try to take the lock without blocking.
    ///
    /// Returns `None` when another process holds it.
    pub fn try_exclusive(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        ensure_parent(path)?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| FsError::new("open lock file", path, e))?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(e) if is_contended(&e) => Ok(None),
            Err(e) => Err(FsError::new("lock", path, e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
