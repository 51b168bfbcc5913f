//! Payload byte sources

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::core::{Error, Result};

/// Fetches raw payload bytes by file reference.
///
/// One call is one attempt; sources do not retry.
pub trait PayloadSource: Send + Sync + 'static {
    fn fetch(&self, file: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Reads payload files relative to a base directory.
#[derive(Clone, Debug)]
pub struct FileSource {
    base_dir: PathBuf,
}

impl FileSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Full path of a payload file
    pub fn path_for(&self, file: &str) -> PathBuf {
        self.base_dir.join(file)
    }
}

impl PayloadSource for FileSource {
    async fn fetch(&self, file: &str) -> Result<Vec<u8>> {
        let path = self.path_for(file);
        tokio::fs::read(&path)
            .await
            .map_err(|e| Error::transport(path.display().to_string(), e))
    }
}

/// In-memory payload store with an optional artificial latency.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
    latency: Option<Duration>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every fetch by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn insert(&mut self, file: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(file.into(), bytes);
    }

    pub fn with_file(mut self, file: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(file, bytes);
        self
    }

    /// Number of fetches attempted so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl PayloadSource for MemorySource {
    async fn fetch(&self, file: &str) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.files
            .get(file)
            .cloned()
            .ok_or_else(|| Error::transport(file, "no such payload"))
    }
}
