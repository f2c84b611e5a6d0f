//! File system utilities for hookscope.
//!
//! Everything here works on files shared by independent, short-lived
//! processes. Appends and in-place rewrites take an OS-level exclusive lock
//! (`flock` on Unix, `LockFileEx` on Windows) scoped to the file being
//! touched and held only for the single operation. Longer critical sections
//! use a separate [`FileLock`].

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

pub mod lock;
pub mod path;

pub use lock::FileLock;
pub use path::sanitize_file_stem;

/// A failed file system operation.
#[derive(Debug, Error)]
#[error("{op} failed for {}: {source}", path.display())]
pub struct FsError {
    /// Operation that failed.
    pub op: &'static str,
    /// File or directory involved.
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl FsError {
    fn new(op: &'static str, path: &Path, source: io::Error) -> Self {
        Self {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether the underlying error is "not found".
    pub fn is_not_found(&self) -> bool {
        self.source.kind() == io::ErrorKind::NotFound
    }
}

/// Result type for file system helpers.
pub type Result<T> = std::result::Result<T, FsError>;

/// Ensure a directory exists.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.is_dir() {
        fs::create_dir_all(path).map_err(|e| FsError::new("create directory", path, e))?;
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options.open(path)
}

/// Append one line under an exclusive lock on the target file.
///
/// The newline is added here; `line` must not contain one. The line and its
/// terminator go out in a single `write_all` while the lock is held, so
/// concurrent appenders never interleave.
pub fn append_line_locked(path: impl AsRef<Path>, line: &str) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let mut file = open_append(path).map_err(|e| FsError::new("open for append", path, e))?;
    FileExt::lock_exclusive(&file).map_err(|e| FsError::new("lock", path, e))?;

    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');
    let written = file.write_all(&buf);

    // Closing the descriptor releases the lock too; unlock explicitly so the
    // hold time ends with the write.
    let _ = FileExt::unlock(&file);
    written.map_err(|e| FsError::new("append", path, e))
}

/// Read a whole file under a shared lock. Returns `None` if it does not exist.
pub fn read_locked(path: impl AsRef<Path>) -> Result<Option<String>> {
    let path = path.as_ref();
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(FsError::new("open", path, e)),
    };
    FileExt::lock_shared(&file).map_err(|e| FsError::new("lock", path, e))?;

    let mut contents = String::new();
    let read = file.read_to_string(&mut contents);
    let _ = FileExt::unlock(&file);
    read.map_err(|e| FsError::new("read", path, e))?;
    Ok(Some(contents))
}

/// Rewrite a file in place under an exclusive lock.
///
/// `edit` receives the current contents and returns the replacement plus a
/// value handed back to the caller. The file keeps its inode, so appenders
/// blocked on the same lock continue into the rewritten file. Returns `None`
/// if the file does not exist.
pub fn rewrite_locked<T>(
    path: impl AsRef<Path>,
    edit: impl FnOnce(&str) -> (String, T),
) -> Result<Option<T>> {
    let path = path.as_ref();
    let mut file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(FsError::new("open for rewrite", path, e)),
    };
    FileExt::lock_exclusive(&file).map_err(|e| FsError::new("lock", path, e))?;

    let result = (|| -> io::Result<T> {
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let (replacement, value) = edit(&contents);
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(replacement.as_bytes())?;
        file.sync_data()?;
        Ok(value)
    })();

    let _ = FileExt::unlock(&file);
    result.map(Some).map_err(|e| FsError::new("rewrite", path, e))
}

/// Write a whole file atomically (write to temp, then rename).
///
/// Readers see either the old or the new contents, never a partial file.
pub fn write_atomic(path: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    // Per-process temp name so concurrent writers never share a temp file.
    let mut temp_path = path.to_path_buf();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    temp_path.set_file_name(format!(".{}.{}.tmp", name, std::process::id()));

    {
        let mut file =
            File::create(&temp_path).map_err(|e| FsError::new("create temp file", &temp_path, e))?;
        file.write_all(contents)
            .map_err(|e| FsError::new("write temp file", &temp_path, e))?;
        file.sync_all()
            .map_err(|e| FsError::new("sync temp file", &temp_path, e))?;
    }

    fs::rename(&temp_path, path).map_err(|e| {
        if let Err(cleanup) = fs::remove_file(&temp_path) {
            tracing::debug!(path = %temp_path.display(), error = %cleanup, "temp file left behind");
        }
        FsError::new("rename temp file", path, e)
    })
}

/// Write string to file atomically.
pub fn write_string_atomic(path: impl AsRef<Path>, contents: &str) -> Result<()> {
    write_atomic(path, contents.as_bytes())
}

/// Read a file to string. Returns `None` if it does not exist.
pub fn read_optional(path: impl AsRef<Path>) -> Result<Option<String>> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FsError::new("read", path, e)),
    }
}

/// Remove a file. Returns whether it existed.
pub fn remove_if_exists(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(FsError::new("remove", path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_append_creates_parents_and_terminates_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b/log.jsonl");

        append_line_locked(&path, r#"{"n":1}"#).unwrap();
        append_line_locked(&path, r#"{"n":2}"#).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "{\"n\":1}\n{\"n\":2}\n");
    }

    #[test]
    fn test_read_locked_missing_file() {
        let dir = tempdir().unwrap();
        assert!(read_locked(dir.path().join("nope")).unwrap().is_none());
    }

    #[test]
    fn test_rewrite_locked_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queue.jsonl");
        fs::write(&path, "a\nb\nc\n").unwrap();

        let dropped = rewrite_locked(&path, |contents| {
            let rest: String = contents.lines().skip(2).map(|l| format!("{l}\n")).collect();
            (rest, 2usize)
        })
        .unwrap();

        assert_eq!(dropped, Some(2));
        assert_eq!(fs::read_to_string(&path).unwrap(), "c\n");
    }

    #[test]
    fn test_rewrite_locked_missing_file() {
        let dir = tempdir().unwrap();
        let result = rewrite_locked(dir.path().join("absent"), |_| (String::new(), ())).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_write_atomic_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sessions.json");

        write_string_atomic(&path, "{}\n").unwrap();
        write_string_atomic(&path, "{\"a\":1}\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\":1}\n");
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_read_optional_and_remove() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x.json");
        assert!(read_optional(&path).unwrap().is_none());
        assert!(!remove_if_exists(&path).unwrap());

        fs::write(&path, "[]").unwrap();
        assert_eq!(read_optional(&path).unwrap().as_deref(), Some("[]"));
        assert!(remove_if_exists(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_error_display_names_path() {
        let err = FsError::new("append", Path::new("/x/y"), io::Error::from(io::ErrorKind::PermissionDenied));
        let message = err.to_string();
        assert!(message.contains("append failed for /x/y"));
        assert!(!err.is_not_found());
    }
}
