//! Working directories served or written by the admin service.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;

pub const STATIC_DIR: &str = "static";
pub const TEMPLATES_DIR: &str = "templates";
pub const BACKUPS_DIR: &str = "backups";
pub const EXPORTS_DIR: &str = "exports";
pub const ARCHIVES_DIR: &str = "archives";

const ALL_DIRS: [&str; 5] = [STATIC_DIR, TEMPLATES_DIR, BACKUPS_DIR, EXPORTS_DIR, ARCHIVES_DIR];

#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DirectoryStatus {
    pub name: String,
    #[schema(value_type = String)]
    pub path: PathBuf,
    pub exists: bool,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn static_dir(&self) -> PathBuf {
        self.root.join(STATIC_DIR)
    }

    /// Creates any missing directory. Safe to call repeatedly.
    pub fn prepare(&self) -> std::io::Result<()> {
        for name in ALL_DIRS {
            let dir = self.root.join(name);
            if !dir.is_dir() {
                std::fs::create_dir_all(&dir)?;
                debug!(path = %dir.display(), "Created directory");
            }
        }
        info!(root = %self.root.display(), "Storage directories ready");
        Ok(())
    }

    pub fn status(&self) -> Vec<DirectoryStatus> {
        ALL_DIRS
            .iter()
            .map(|name| {
                let path = self.root.join(name);
                DirectoryStatus {
                    name: name.to_string(),
                    exists: path.is_dir(),
                    path,
                }
            })
            .collect()
    }

    pub fn is_ready(&self) -> bool {
        self.status().iter().all(|dir| dir.exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_creates_every_directory() {
        let root = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(root.path());
        assert!(!layout.is_ready());

        layout.prepare().unwrap();
        assert!(layout.is_ready());
        assert!(root.path().join(EXPORTS_DIR).is_dir());

        // second run is a no-op
        layout.prepare().unwrap();
        assert_eq!(layout.status().len(), 5);
    }

    #[test]
    fn status_reports_missing_directories() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join(STATIC_DIR)).unwrap();
        let layout = StorageLayout::new(root.path());

        let status = layout.status();
        let exists: Vec<bool> = status.iter().map(|d| d.exists).collect();
        assert_eq!(exists, vec![true, false, false, false, false]);
    }
}
