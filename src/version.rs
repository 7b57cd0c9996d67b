//! Version marker: the data generation currently materialized locally.
//!
//! The marker lives outside the record tables and is handed to callers as an
//! explicit handle.

use semver::Version;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Result, StoreError};

/// Data generation written by the seeder on a fresh install.
pub const CURRENT_DATA_VERSION: &str = "1.0.0";

/// A single persisted version value.
#[allow(async_fn_in_trait)]
pub trait VersionStore {
    /// Returns `None` on a fresh install.
    async fn get_version(&self) -> Result<Option<String>>;

    async fn set_version(&self, version: &str) -> Result<()>;
}

/// Writes `version` unless the stored marker is already at or above it.
///
/// Returns `true` when the marker was written. An unparseable stored marker
/// is treated as older and replaced.
pub async fn ratchet_version<V: VersionStore>(store: &V, version: &str) -> Result<bool> {
    let target =
        Version::parse(version).map_err(|_| StoreError::InvalidVersion(version.to_string()))?;

    if let Some(current) = store.get_version().await? {
        if let Ok(current) = Version::parse(&current) {
            if current >= target {
                return Ok(false);
            }
        }
    }

    store.set_version(version).await?;
    Ok(true)
}

/// Version marker kept in a small text file.
#[derive(Debug, Clone)]
pub struct FileVersionStore {
    path: PathBuf,
}

impl FileVersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, source: std::io::Error) -> StoreError {
        StoreError::VersionMarker {
            path: self.path.clone(),
            source,
        }
    }
}

impl VersionStore for FileVersionStore {
    async fn get_version(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let version = contents.trim();
                if version.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(version.to_string()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.error(e)),
        }
    }

    async fn set_version(&self, version: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.error(e))?;
            }
        }

        // Sibling file, then rename
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, format!("{}\n", version))
            .await
            .map_err(|e| self.error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.error(e))?;

        tracing::debug!("Version marker set to {}", version);
        Ok(())
    }
}

/// In-process version marker, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    value: Mutex<Option<String>>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(version.into())),
        }
    }
}

impl VersionStore for MemoryVersionStore {
    async fn get_version(&self) -> Result<Option<String>> {
        Ok(self
            .value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    async fn set_version(&self, version: &str) -> Result<()> {
        *self
            .value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(version.to_string());
        Ok(())
    }
}
