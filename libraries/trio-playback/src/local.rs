//! Local file providers

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use trio_core::{LocalFileProvider, LocalFileRef, TrioError};

/// Reads local references as filesystem paths
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFileProvider;

#[async_trait]
impl LocalFileProvider for FsFileProvider {
    async fn read(&self, file: &LocalFileRef) -> trio_core::Result<Vec<u8>> {
        tokio::fs::read(file.as_str()).await.map_err(|e| {
            TrioError::file_unavailable(format!("{}: {}", file.as_str(), e))
        })
    }
}

/// In-memory files, for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryFileProvider {
    files: Mutex<HashMap<LocalFileRef, Vec<u8>>>,
}

impl MemoryFileProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn insert(&self, file: LocalFileRef, bytes: Vec<u8>) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file, bytes);
    }

    /// Remove a file, simulating a revoked permission
    pub fn revoke(&self, file: &LocalFileRef) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(file);
    }
}

#[async_trait]
impl LocalFileProvider for MemoryFileProvider {
    async fn read(&self, file: &LocalFileRef) -> trio_core::Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(file)
            .cloned()
            .ok_or_else(|| TrioError::file_unavailable(file.as_str()))
    }
}
