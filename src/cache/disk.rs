//! Folder-backed cache storage

use crate::cache::key::cache_key;
use crate::config::FilenameMode;
use crate::CacheError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A folder holding one file per cached URL
#[derive(Debug, Clone)]
pub struct DiskCache {
    folder: PathBuf,
    mode: FilenameMode,
}

impl DiskCache {
    /// Opens a cache folder, creating it with owner-only permissions if absent
    ///
    /// # Arguments
    ///
    /// * `folder` - Directory that will hold the cached pages
    /// * `mode` - How filenames are derived from URLs
    ///
    /// # Returns
    ///
    /// * `Ok(DiskCache)` - The folder exists and is usable
    /// * `Err(CacheError::CreateDir)` - The folder could not be created
    pub fn open(folder: impl Into<PathBuf>, mode: FilenameMode) -> Result<Self, CacheError> {
        let cache = Self {
            folder: folder.into(),
            mode,
        };
        cache.ensure_folder()?;
        Ok(cache)
    }

    /// The cache folder
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// The filename mode in use
    pub fn mode(&self) -> FilenameMode {
        self.mode
    }

    /// Path of the entry for `url`, whether or not it exists
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.folder.join(cache_key(url, self.mode))
    }

    /// Returns true if an entry exists for `url`
    pub fn contains(&self, url: &str) -> bool {
        self.path_for(url).is_file()
    }

    /// Reads the cached body for `url`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(body))` - Cache hit
    /// * `Ok(None)` - No entry for this URL
    /// * `Err(CacheError::Read)` - The entry exists but could not be read
    pub async fn get(&self, url: &str) -> Result<Option<String>, CacheError> {
        let path = self.path_for(url);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Read {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Writes `body` as the entry for `url`, replacing any previous entry
    pub async fn put(&self, url: &str, body: &str) -> Result<(), CacheError> {
        self.ensure_folder_async().await?;
        let path = self.path_for(url);
        tokio::fs::write(&path, body.as_bytes())
            .await
            .map_err(|source| CacheError::Write {
                path: path.display().to_string(),
                source,
            })
    }

    /// Removes the entry for `url` so the next cached fetch goes to the network
    ///
    /// Returns true if an entry was removed.
    pub async fn invalidate(&self, url: &str) -> Result<bool, CacheError> {
        let path = self.path_for(url);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheError::Write {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    fn ensure_folder(&self) -> Result<(), CacheError> {
        if self.folder.is_dir() {
            return Ok(());
        }

        let to_error = |source| CacheError::CreateDir {
            path: self.folder.display().to_string(),
            source,
        };

        std::fs::create_dir_all(&self.folder).map_err(to_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.folder, std::fs::Permissions::from_mode(0o700))
                .map_err(to_error)?;
        }

        tracing::debug!("Created cache folder {}", self.folder.display());
        Ok(())
    }

    /// Recreates the folder if it disappeared after [`open`](Self::open)
    async fn ensure_folder_async(&self) -> Result<(), CacheError> {
        if let Ok(meta) = tokio::fs::metadata(&self.folder).await {
            if meta.is_dir() {
                return Ok(());
            }
        }

        let to_error = |source| CacheError::CreateDir {
            path: self.folder.display().to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.folder).await.map_err(to_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.folder, std::fs::Permissions::from_mode(0o700))
                .await
                .map_err(to_error)?;
        }

        tracing::debug!("Recreated cache folder {}", self.folder.display());
        Ok(())
    }
}
