//! Blob storage for file content
//!
//! Content lives outside the metadata store, addressed by opaque handles
//! (see [`ContentRef`](crate::models::ContentRef)). Handles are plain names
//! relative to the storage root.

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Path-addressed blob storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Check if a blob exists
    async fn exists(&self, handle: &str) -> Result<bool>;

    /// Write a blob; readers never observe a partially written blob
    async fn write(&self, handle: &str, bytes: &[u8]) -> Result<()>;

    /// Read a blob, `None` if it does not exist
    async fn read(&self, handle: &str) -> Result<Option<Vec<u8>>>;
}

/// Configuration for blob storage
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory holding every blob
    pub root: PathBuf,
}

impl StorageConfig {
    /// Create a new StorageConfig from environment variables
    ///
    /// # Environment Variables
    /// - `FOLDER_PATH`: Root directory for stored files (default: "/tmp/files_manager")
    pub fn from_env() -> Result<Self> {
        let root = std::env::var("FOLDER_PATH").unwrap_or_else(|_| "/tmp/files_manager".to_string());
        Ok(Self { root: root.into() })
    }
}

/// Local filesystem blob store
///
/// Every blob is one file directly under the root directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store rooted at `root`, creating the directory if needed
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if root.exists() && !root.is_dir() {
            bail!("Storage root is not a directory: {}", root.display());
        }

        // Runs once at startup, not worth making the constructor async
        std::fs::create_dir_all(&root)?;
        info!("Blob storage rooted at {}", root.display());
        Ok(Self { root })
    }

    /// Create a store from configuration
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        Self::new(&config.root)
    }

    fn path_for(&self, handle: &str) -> Result<PathBuf> {
        let valid = !handle.is_empty()
            && handle != "."
            && handle != ".."
            && !handle.contains(['/', '\\']);
        if !valid {
            bail!("Invalid blob handle: {:?}", handle);
        }
        Ok(self.root.join(handle))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn exists(&self, handle: &str) -> Result<bool> {
        let path = self.path_for(handle)?;
        Ok(fs::try_exists(path).await?)
    }

    async fn write(&self, handle: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(handle)?;
        let staging = self.root.join(format!(".{}.{}.tmp", handle, Uuid::new_v4()));

        fs::write(&staging, bytes).await?;
        if let Err(e) = fs::rename(&staging, &path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(e.into());
        }

        debug!("Wrote {} bytes to blob {}", bytes.len(), handle);
        Ok(())
    }

    async fn read(&self, handle: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(handle)?;
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
