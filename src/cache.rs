//! On-disk snapshot of the product list.
//!
//! The cache is a convenience for starting up with something to show; it is
//! never consulted for writes. A missing or unreadable file reads as empty.

use crate::core::{Result, StoreError};
use crate::model::product::Product;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, warn};

pub const DEFAULT_CACHE_FILE: &str = "shopdesk-products.json";

#[derive(Debug, Clone)]
pub struct ProductCache {
    path: PathBuf,
}

impl ProductCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached products, or an empty list when the file is missing or corrupt.
    pub async fn load(&self) -> Vec<Product> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no product cache yet");
                return Vec::new();
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read product cache");
                return Vec::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(products) => products,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to parse product cache");
                Vec::new()
            }
        }
    }

    /// Replaces the cache file atomically: readers see either the old or the
    /// new snapshot.
    pub async fn save(&self, products: &[Product]) -> Result<()> {
        let json = serde_json::to_vec_pretty(products)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, &json))
            .await
            .map_err(|err| StoreError::Io(format!("cache writer panicked: {}", err)))?
            .inspect_err(|e| warn!(path = %self.path.display(), error = %e, "failed to save product cache"))?;

        debug!(path = %self.path.display(), count = products.len(), "product cache saved");
        Ok(())
    }

    /// Removes the cache file. A missing file is not an error.
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to clear product cache");
                Err(err.into())
            }
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| StoreError::Io(err.error.to_string()))?;
    Ok(())
}
