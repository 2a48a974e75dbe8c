use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Fallback extension when the uploaded name has none we can use.
pub const DEFAULT_EXTENSION: &str = "bin";
const MAX_EXTENSION_LEN: usize = 10;

/// A persisted blob: its generated file name and the path clients fetch it by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobRef {
    pub name: String,
    pub reference: String,
}

/// Write-once storage for uploaded content.
///
/// Blobs are never deleted or overwritten; content orphaned by product
/// updates or deletes stays on disk.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, bytes: &[u8], extension: &str) -> Result<BlobRef, ServiceError>;
}

/// Extension of an uploaded file name, reduced to a safe lowercase token.
pub fn extension_from_filename(file_name: &str) -> String {
    let raw = file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    sanitize_extension(raw)
}

fn sanitize_extension(raw: &str) -> String {
    let ext = raw.trim().to_ascii_lowercase();
    if ext.is_empty() || ext.len() > MAX_EXTENSION_LEN || !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return DEFAULT_EXTENSION.to_string();
    }
    ext
}

/// Blobs as files in one directory, served under `url_prefix`.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    dir: PathBuf,
    url_prefix: String,
}

impl FsBlobStore {
    pub fn new<P: Into<PathBuf>>(dir: P, url_prefix: &str) -> Self {
        Self { dir: dir.into(), url_prefix: url_prefix.trim_end_matches('/').to_string() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Local file backing a reference minted by this store.
    pub fn path_for(&self, reference: &str) -> Option<PathBuf> {
        let name = reference.strip_prefix(&self.url_prefix)?.strip_prefix('/')?;
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return None;
        }
        Some(self.dir.join(name))
    }
}

async fn write_new(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::OpenOptions::new().write(true).create_new(true).open(path).await?;
    let result = async {
        file.write_all(bytes).await?;
        file.sync_all().await
    }
    .await;
    if result.is_err() {
        drop(file);
        let _ = fs::remove_file(path).await;
    }
    result
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, bytes: &[u8], extension: &str) -> Result<BlobRef, ServiceError> {
        let ext = sanitize_extension(extension);
        let name = format!("{}.{ext}", Uuid::new_v4());
        let path = self.dir.join(&name);

        let res = async {
            fs::create_dir_all(&self.dir).await?;
            write_new(&path, bytes).await
        }
        .await;
        if let Err(e) = res {
            error!(path = %path.display(), error = %e, "blob write failed");
            return Err(ServiceError::StorageWriteFailed(format!("{}: {e}", path.display())));
        }

        info!(blob = %name, size = bytes.len(), "blob stored");
        Ok(BlobRef { reference: format!("{}/{name}", self.url_prefix), name })
    }
}

pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory blob store for tests
    #[derive(Default)]
    pub struct MemoryBlobStore {
        blobs: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MemoryBlobStore {
        pub fn get(&self, name: &str) -> Option<Vec<u8>> {
            let blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
            blobs.get(name).cloned()
        }

        pub fn len(&self) -> usize {
            self.blobs.lock().unwrap_or_else(|e| e.into_inner()).len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl BlobStore for MemoryBlobStore {
        async fn put(&self, bytes: &[u8], extension: &str) -> Result<BlobRef, ServiceError> {
            let name = format!("{}.{}", Uuid::new_v4(), sanitize_extension(extension));
            let mut blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
            blobs.insert(name.clone(), bytes.to_vec());
            Ok(BlobRef { reference: format!("/uploads/{name}"), name })
        }
    }

    /// Blob store whose writes always fail, as on a full disk.
    #[derive(Default)]
    pub struct FailingBlobStore;

    #[async_trait]
    impl BlobStore for FailingBlobStore {
        async fn put(&self, _bytes: &[u8], _extension: &str) -> Result<BlobRef, ServiceError> {
            Err(ServiceError::StorageWriteFailed("no space left on device".into()))
        }
    }
}
