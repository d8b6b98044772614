use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::cache_context;

/// File-based JSON store for small keyed documents.
///
/// The active-match snapshot lives here under a single well-known key,
/// overwritten after every mutation and removed when the match ends. One
/// file per key keeps writes atomic enough for a single-user app: a crash
/// loses at most the latest unsaved event, never a half-written aggregate.
pub struct Cache {
    cache_dir: PathBuf,
}

impl Cache {
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        fs::create_dir_all(&cache_dir).context("Failed to create cache directory")?;

        Ok(Self { cache_dir })
    }

    pub fn save<T: Serialize>(&self, key: &str, data: &T) -> Result<()> {
        let file_path = self.key_path(key);

        let json = serde_json::to_string_pretty(data).with_context(|| cache_context("encode", key))?;
        fs::write(&file_path, json).with_context(|| cache_context("write", key))?;

        info!("Saved snapshot: {}", file_path.display());
        Ok(())
    }

    pub fn load<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
        let file_path = self.key_path(key);

        if !file_path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&file_path).with_context(|| cache_context("read", key))?;
        let data = serde_json::from_str(&json).with_context(|| cache_context("decode", key))?;

        info!("Loaded snapshot: {}", file_path.display());
        Ok(Some(data))
    }

    pub fn exists(&self, key: &str) -> bool {
        self.key_path(key).exists()
    }

    /// Remove one key. Missing files are fine; the end state is the same.
    pub fn remove(&self, key: &str) -> Result<()> {
        let file_path = self.key_path(key);

        if file_path.exists() {
            fs::remove_file(&file_path).with_context(|| cache_context("remove", key))?;
            info!("Removed snapshot: {}", file_path.display());
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        fs::remove_dir_all(&self.cache_dir).context("Failed to clear cache")?;
        fs::create_dir_all(&self.cache_dir).context("Failed to recreate cache directory")?;

        info!("Cleared cache directory");
        Ok(())
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }
}
