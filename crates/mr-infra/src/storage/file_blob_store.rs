//! File-based session blob store
//!
//! One file per key inside a base directory. Writes go to a temporary
//! sibling file which is then renamed over the target, so a crash mid-write
//! never leaves a truncated snapshot behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use mr_core::ports::SessionBlobStorePort;
use tracing::debug;

pub const DEFAULT_STORAGE_DIR_NAME: &str = "medreg";

pub struct FileSessionBlobStore {
    base_dir: PathBuf,
}

impl FileSessionBlobStore {
    /// Create store rooted at `base_dir`
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Create store under the platform data directory
    pub fn with_defaults() -> anyhow::Result<Self> {
        let data_dir = dirs::data_local_dir().context("Failed to resolve local data directory")?;
        Ok(Self::new(data_dir.join(DEFAULT_STORAGE_DIR_NAME)))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_dir.join(format!("{file_name}.json"))
    }

    fn ensure_base_dir(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.base_dir).with_context(|| {
            format!(
                "Failed to create storage directory: {}",
                self.base_dir.display()
            )
        })
    }
}

impl SessionBlobStorePort for FileSessionBlobStore {
    fn save(&self, key: &str, blob: &str) -> anyhow::Result<()> {
        self.ensure_base_dir()?;
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp_path)
            .with_context(|| format!("Failed to create blob file: {}", tmp_path.display()))?;
        file.write_all(blob.as_bytes())
            .with_context(|| format!("Failed to write blob file: {}", tmp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("Failed to sync blob file: {}", tmp_path.display()))?;
        drop(file);

        fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to replace blob file: {}", path.display()))?;
        debug!(key, path = %path.display(), "blob saved");
        Ok(())
    }

    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read blob file: {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(content))
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove blob file: {}", path.display()))?;
            debug!(key, "blob removed");
        }
        Ok(())
    }
}
