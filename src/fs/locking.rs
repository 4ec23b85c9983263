//! File locking and atomic replacement for the progress file
//!
//! Writers serialize on an advisory `fs2` lock held on a sibling `.lock`
//! file for the whole read-modify-write. The data file itself is only ever
//! replaced by renaming a fully written temp file over it, so readers need no
//! lock and never see a partial document.
//!
//! Advisory locks are cooperative: every writer must go through
//! [`ExclusiveLock::acquire`] for them to mean anything.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Path of the lock file guarding `path`.
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

/// Exclusive advisory lock, released when dropped.
#[derive(Debug)]
pub struct ExclusiveLock {
    file: File,
}

impl ExclusiveLock {
    /// Block until the exclusive lock on `path` is held.
    pub fn acquire(path: &Path) -> Result<Self> {
        ensure_parent_dir(path)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("Failed to acquire exclusive lock: {}", path.display()))?;
        Ok(Self { file })
    }
}

impl Drop for ExclusiveLock {
    fn drop(&mut self) {
        // Closing the handle releases the lock as well; unlock early anyway
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

/// Read a file, returning `None` if it does not exist.
pub fn read_if_exists(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read file: {}", path.display())),
    }
}

/// Replace `path` with `content` atomically.
///
/// The sequence is: temp file in the same directory → write → fsync →
/// rename over the target. A crash at any point leaves either the old or the
/// new document in place.
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let dir = ensure_parent_dir(path)?;
    let mut temp = NamedTempFile::new_in(&dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    temp.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write temp file for {}", path.display()))?;
    temp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to sync temp file for {}", path.display()))?;
    temp.persist(path)
        .with_context(|| format!("Failed to replace file: {}", path.display()))?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<PathBuf> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    Ok(dir)
}
