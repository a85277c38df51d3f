//! Advisory lock guarding the file database against concurrent Entangled
//! processes (e.g. a `watch` daemon and a one-shot `tangle` invocation
//! racing on the same project).

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::errors::{EntangledError, Result};

/// A held advisory lock on the database's lock file.
///
/// The underlying OS lock (`flock` on Unix, `LockFileEx` on Windows via
/// `fs2`) is released when this value is dropped, so callers simply let
/// it go out of scope rather than calling an explicit `unlock`.
#[derive(Debug)]
pub struct FileDbLock {
    file: File,
    path: PathBuf,
}

impl FileDbLock {
    /// Acquires an exclusive lock at `path`, creating the file (and its
    /// parent directory) if it doesn't exist yet. Blocks until the lock
    /// is available.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::options()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        file.lock_exclusive()
            .map_err(|e| EntangledError::Internal(format!("failed to lock {}: {e}", path.display())))?;

        Ok(Self { file, path })
    }

    /// Tries to acquire the lock without blocking, returning `Ok(None)`
    /// if another process currently holds it.
    pub fn try_acquire(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::options()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(EntangledError::Internal(format!(
                "failed to lock {}: {e}",
                path.display()
            ))),
        }
    }

    /// The path of the lock file this guard holds.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileDbLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
