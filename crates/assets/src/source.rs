use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Read;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::error::AssetError;
use crate::path::AssetPath;
use crate::progress::ProgressTracker;

/// Where asset bytes come from.
///
/// Implementations report cumulative bytes to `progress` as they arrive.
pub trait AssetSource {
    fn fetch<'a>(
        &'a self,
        path: &'a AssetPath,
        progress: &'a ProgressTracker,
    ) -> LocalBoxFuture<'a, Result<Vec<u8>, AssetError>>;
}

const CHUNK_SIZE: usize = 64 * 1024;

/// Reads assets from the local filesystem in chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl FileSource {
    pub fn new() -> Self {
        Self
    }

    fn read(path: &AssetPath, progress: &ProgressTracker) -> Result<Vec<u8>, AssetError> {
        let full = path.full();
        let mut file = std::fs::File::open(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AssetError::NotFound(full.clone()),
            _ => AssetError::Io(e),
        })?;
        let size_hint = file.metadata().map(|m| m.len() as usize).unwrap_or(0);
        let mut data = Vec::with_capacity(size_hint);
        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            let n = file.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..n]);
            progress.report(data.len() as u64);
        }
        tracing::debug!(path = %full, bytes = data.len(), "asset read from disk");
        Ok(data)
    }
}

impl AssetSource for FileSource {
    fn fetch<'a>(
        &'a self,
        path: &'a AssetPath,
        progress: &'a ProgressTracker,
    ) -> LocalBoxFuture<'a, Result<Vec<u8>, AssetError>> {
        async move { Self::read(path, progress) }.boxed_local()
    }
}

/// In-memory asset source keyed by full path.
///
/// Can be told to fail a number of times per path with a transient error,
/// which is how retry behavior is exercised without a network.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
    failures: RefCell<HashMap<String, u32>>,
    attempts: RefCell<HashMap<String, u32>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, full_path: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(full_path.into(), bytes);
    }

    /// Make the next `times` fetches of `full_path` fail transiently.
    pub fn fail_next(&self, full_path: impl Into<String>, times: u32) {
        self.failures.borrow_mut().insert(full_path.into(), times);
    }

    /// How many fetches of `full_path` were attempted.
    pub fn attempts(&self, full_path: &str) -> u32 {
        self.attempts.borrow().get(full_path).copied().unwrap_or(0)
    }

    fn read(&self, path: &AssetPath, progress: &ProgressTracker) -> Result<Vec<u8>, AssetError> {
        let full = path.full();
        *self.attempts.borrow_mut().entry(full.clone()).or_insert(0) += 1;

        if let Some(remaining) = self.failures.borrow_mut().get_mut(&full) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(AssetError::Transfer {
                    path: full,
                    reason: "connection reset".into(),
                });
            }
        }

        let bytes = self
            .files
            .get(&full)
            .ok_or_else(|| AssetError::NotFound(full.clone()))?;
        let mut sent = 0usize;
        for chunk in bytes.chunks(CHUNK_SIZE) {
            sent += chunk.len();
            progress.report(sent as u64);
        }
        Ok(bytes.clone())
    }
}

impl AssetSource for MemorySource {
    fn fetch<'a>(
        &'a self,
        path: &'a AssetPath,
        progress: &'a ProgressTracker,
    ) -> LocalBoxFuture<'a, Result<Vec<u8>, AssetError>> {
        async move { self.read(path, progress) }.boxed_local()
    }
}
