//! Collaborators that move snapshot text to and from the user.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Result, StoreError};

/// Hands a finished backup to the user (save dialog, download, file).
#[allow(async_fn_in_trait)]
pub trait BackupSink {
    /// Delivers `contents` and returns where it ended up.
    async fn deliver(&self, file_name: &str, contents: &str) -> Result<String>;
}

/// Lets the user pick a backup and returns its text.
#[allow(async_fn_in_trait)]
pub trait BackupSource {
    async fn pick(&self) -> Result<String>;
}

/// Writes backups to disk.
#[derive(Debug, Clone)]
pub enum FileSink {
    /// Write to this exact path.
    Path(PathBuf),
    /// Write into this directory under the snapshot's default name.
    Directory(PathBuf),
}

impl FileSink {
    fn target(&self, file_name: &str) -> PathBuf {
        match self {
            FileSink::Path(path) => path.clone(),
            FileSink::Directory(dir) => dir.join(file_name),
        }
    }
}

impl BackupSink for FileSink {
    async fn deliver(&self, file_name: &str, contents: &str) -> Result<String> {
        let path = self.target(file_name);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| delivery_error(parent, e))?;
            }
        }

        // Never leave a truncated backup behind
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| delivery_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| delivery_error(&path, e))?;

        Ok(path.display().to_string())
    }
}

/// Reads a backup from a file chosen up front.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BackupSource for FileSource {
    async fn pick(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| delivery_error(&self.path, e))
    }
}

fn delivery_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Delivery(format!("{}: {}", path.display(), e))
}

/// Keeps delivered backups in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<(String, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent `(file_name, contents)` pair.
    pub fn last(&self) -> Option<(String, String)> {
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .last()
            .cloned()
    }
}

impl BackupSink for MemorySink {
    async fn deliver(&self, file_name: &str, contents: &str) -> Result<String> {
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((file_name.to_string(), contents.to_string()));
        Ok(format!("memory:{}", file_name))
    }
}

/// Returns fixed text, or fails as if the user cancelled.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    contents: Option<String>,
}

impl MemorySource {
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
        }
    }

    pub fn cancelled() -> Self {
        Self { contents: None }
    }
}

impl BackupSource for MemorySource {
    async fn pick(&self) -> Result<String> {
        self.contents
            .clone()
            .ok_or_else(|| StoreError::Delivery("no file selected".to_string()))
    }
}
