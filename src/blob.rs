//! Blob storage seam for payment proof images.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("Upload failed: {0}")]
    Upload(String),
    #[error("Object not found: {0}")]
    NotFound(String),
}

/// Object storage seam. Returns the public URL of the stored object.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, BlobError>;
}

/// Unique object path for a payment proof image.
pub fn proof_object_path(prefix: &str, extension: &str) -> String {
    format!("{}/{}.{}", prefix, Uuid::new_v4(), extension)
}

/// In-memory blob store for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.read().get(path).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.read().len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, BlobError> {
        self.objects.write().insert(path.to_string(), bytes);
        Ok(format!("memory://{path}"))
    }
}
