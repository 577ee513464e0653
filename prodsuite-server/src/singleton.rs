//! Guard against two servers writing to the same database.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// A lock guard that releases the lock when dropped
pub struct LockGuard {
    _file: File,
    path: PathBuf,
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Lock file next to the database, so separate databases can be served side by side.
fn lock_path(database_path: &Path) -> Result<PathBuf> {
    let dir = database_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .or_else(dirs::runtime_dir)
        .or_else(dirs::cache_dir)
        .ok_or_else(|| anyhow::anyhow!("Could not determine a directory for the lock file"))?;

    fs::create_dir_all(&dir)?;

    let name = database_path
        .file_name()
        .map(|n| format!("{}.lock", n.to_string_lossy()))
        .unwrap_or_else(|| "prodsuite-server.lock".to_string());
    Ok(dir.join(name))
}

/// Acquire an exclusive lock, failing if another instance serves this database
pub fn acquire_lock(database_path: &Path) -> Result<LockGuard> {
    let path = lock_path(database_path)?;
    let file = File::create(&path).context("Failed to create lock file")?;

    file.try_lock_exclusive().map_err(|_| {
        anyhow::anyhow!(
            "Another prodsuite-server instance is already using {}.\n\
            If you believe this is an error, remove: {}",
            database_path.display(),
            path.display()
        )
    })?;

    Ok(LockGuard { _file: file, path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_lock_on_the_same_database_fails() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("prodsuite.db");

        let guard = acquire_lock(&db).unwrap();
        assert_eq!(guard.path(), dir.path().join("prodsuite.db.lock"));
        assert!(acquire_lock(&db).is_err());

        drop(guard);
        assert!(acquire_lock(&db).is_ok());
    }
}
