//! Backup Store (C8): a content-addressed-by-timestamp on-disk store of
//! file and directory snapshots, used by the Rollback Manager to compute
//! inverses for writes and deletes.

use crate::models::BackupEntry;
use chrono::Utc;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("source path does not exist: {0}")]
    SourceMissing(PathBuf),
    #[error("io error backing up {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Snapshots and restores files/directories under a single backup directory.
/// Never garbage-collects; a retention policy is an external concern.
#[derive(Debug, Clone)]
pub struct BackupStore {
    backup_dir: PathBuf,
}

impl BackupStore {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self { backup_dir: backup_dir.into() }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Snapshot a single file: `{backup_dir}/{name}.{timestamp}.bak`.
    pub fn backup_file(&self, path: &Path) -> Result<BackupEntry, BackupError> {
        if !path.is_file() {
            return Err(BackupError::SourceMissing(path.to_path_buf()));
        }
        let backup_path = self.timestamped_path(path)?;
        std::fs::copy(path, &backup_path).map_err(|source| BackupError::Io { path: path.to_path_buf(), source })?;
        self.preserve_permissions(path, &backup_path)?;
        self.preserve_mtime(path, &backup_path)?;
        Ok(BackupEntry {
            backup_path,
            original_path: path.to_path_buf(),
            is_directory: false,
            created_at: Utc::now(),
        })
    }

    /// Snapshot a directory tree: recursive copy into a timestamped name.
    pub fn backup_directory(&self, path: &Path) -> Result<BackupEntry, BackupError> {
        if !path.is_dir() {
            return Err(BackupError::SourceMissing(path.to_path_buf()));
        }
        let backup_path = self.timestamped_path(path)?;
        self.copy_tree(path, &backup_path)?;
        Ok(BackupEntry {
            backup_path,
            original_path: path.to_path_buf(),
            is_directory: true,
            created_at: Utc::now(),
        })
    }

    /// Restore a backup entry back to its original location, overwriting
    /// whatever is currently there.
    pub fn restore(&self, entry: &BackupEntry) -> Result<(), BackupError> {
        if entry.is_directory {
            if entry.original_path.exists() {
                std::fs::remove_dir_all(&entry.original_path)
                    .map_err(|source| BackupError::Io { path: entry.original_path.clone(), source })?;
            }
            self.copy_tree(&entry.backup_path, &entry.original_path)
        } else {
            if let Some(parent) = entry.original_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|source| BackupError::Io { path: entry.original_path.clone(), source })?;
            }
            std::fs::copy(&entry.backup_path, &entry.original_path)
                .map_err(|source| BackupError::Io { path: entry.original_path.clone(), source })?;
            self.preserve_mtime(&entry.backup_path, &entry.original_path)
        }
    }

    /// Copy `src`'s modification time onto `dst`. Used both when snapshotting
    /// (so the backup's own mtime records what the original had) and when
    /// restoring (so `std::fs::copy`'s "now" mtime doesn't stick).
    fn preserve_mtime(&self, src: &Path, dst: &Path) -> Result<(), BackupError> {
        let modified = std::fs::metadata(src)
            .and_then(|meta| meta.modified())
            .map_err(|source| BackupError::Io { path: src.to_path_buf(), source })?;
        std::fs::File::open(dst)
            .and_then(|file| file.set_modified(modified))
            .map_err(|source| BackupError::Io { path: dst.to_path_buf(), source })
    }

    fn timestamped_path(&self, original: &Path) -> Result<PathBuf, BackupError> {
        std::fs::create_dir_all(&self.backup_dir)
            .map_err(|source| BackupError::Io { path: self.backup_dir.clone(), source })?;
        let name = original.file_name().and_then(|n| n.to_str()).unwrap_or("unnamed");
        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%3f");
        Ok(self.backup_dir.join(format!("{name}.{stamp}.bak")))
    }

    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<(), BackupError> {
        std::fs::create_dir_all(dst).map_err(|source| BackupError::Io { path: dst.to_path_buf(), source })?;
        for entry in walkdir::WalkDir::new(src).into_iter().filter_map(Result::ok) {
            let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
            let target = dst.join(rel);
            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&target).map_err(|source| BackupError::Io { path: target.clone(), source })?;
            } else if entry.file_type().is_file() {
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent).map_err(|source| BackupError::Io { path: parent.to_path_buf(), source })?;
                }
                std::fs::copy(entry.path(), &target)
                    .map_err(|source| BackupError::Io { path: target.clone(), source })?;
            }
        }
        Ok(())
    }

    #[cfg(unix)]
    fn preserve_permissions(&self, src: &Path, dst: &Path) -> Result<(), BackupError> {
        let meta = std::fs::metadata(src).map_err(|source| BackupError::Io { path: src.to_path_buf(), source })?;
        std::fs::set_permissions(dst, meta.permissions())
            .map_err(|source| BackupError::Io { path: dst.to_path_buf(), source })
    }

    #[cfg(not(unix))]
    fn preserve_permissions(&self, _src: &Path, _dst: &Path) -> Result<(), BackupError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn backup_and_restore_file_round_trips_content() {
        let root = TempDir::new().unwrap();
        let store = BackupStore::new(root.path().join("backups"));
        let original = root.path().join("notes.txt");
        std::fs::write(&original, "v1").unwrap();

        let entry = store.backup_file(&original).unwrap();
        std::fs::write(&original, "v2").unwrap();
        assert_eq!(std::fs::read_to_string(&original).unwrap(), "v2");

        store.restore(&entry).unwrap();
        assert_eq!(std::fs::read_to_string(&original).unwrap(), "v1");
    }

    #[test]
    fn backup_directory_restores_deleted_tree() {
        let root = TempDir::new().unwrap();
        let store = BackupStore::new(root.path().join("backups"));
        let dir = root.path().join("project");
        std::fs::create_dir_all(dir.join("src")).unwrap();
        std::fs::write(dir.join("src/main.rs"), "fn main() {}").unwrap();

        let entry = store.backup_directory(&dir).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
        assert!(!dir.exists());

        store.restore(&entry).unwrap();
        assert_eq!(std::fs::read_to_string(dir.join("src/main.rs")).unwrap(), "fn main() {}");
    }

    #[test]
    fn backing_up_missing_file_fails() {
        let root = TempDir::new().unwrap();
        let store = BackupStore::new(root.path().join("backups"));
        let result = store.backup_file(&root.path().join("nope.txt"));
        assert!(result.is_err());
    }

    #[test]
    fn restore_recovers_original_mtime() {
        let root = TempDir::new().unwrap();
        let store = BackupStore::new(root.path().join("backups"));
        let original = root.path().join("notes.txt");
        std::fs::write(&original, "v1").unwrap();

        let old_mtime = std::time::SystemTime::now() - std::time::Duration::from_secs(3600);
        std::fs::File::open(&original).unwrap().set_modified(old_mtime).unwrap();

        let entry = store.backup_file(&original).unwrap();
        std::fs::write(&original, "v2").unwrap();

        store.restore(&entry).unwrap();
        let restored_mtime = std::fs::metadata(&original).unwrap().modified().unwrap();
        assert_eq!(restored_mtime, old_mtime);
    }
}
