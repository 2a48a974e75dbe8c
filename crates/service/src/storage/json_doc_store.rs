use std::{
    io,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::storage::retry::WriteRetryPolicy;

/// A whole JSON document that can be loaded, changed in memory and written back.
pub trait Document: Default + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Document for T where T: Default + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// One async mutex per document path, shared by every store handle in the process.
static DOC_LOCKS: Lazy<DashMap<PathBuf, Arc<Mutex<()>>>> = Lazy::new(DashMap::new);

fn lock_key(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    absolute.components().collect()
}

fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    let entry = DOC_LOCKS
        .entry(lock_key(path))
        .or_insert_with(|| Arc::new(Mutex::new(())));
    Arc::clone(entry.value())
}

/// JSON file holding a single document of type `D`.
///
/// Every operation reads or rewrites the complete file; there is no index and
/// no cache, so cost grows with the total size of the document. Mutations are
/// serialised per path and written through a temp file plus rename, so readers
/// only ever see a complete document.
pub struct JsonDocStore<D> {
    file_path: PathBuf,
    lock: Arc<Mutex<()>>,
    retry: WriteRetryPolicy,
    _doc: PhantomData<fn() -> D>,
}

impl<D> Clone for JsonDocStore<D> {
    fn clone(&self) -> Self {
        Self {
            file_path: self.file_path.clone(),
            lock: Arc::clone(&self.lock),
            retry: self.retry.clone(),
            _doc: PhantomData,
        }
    }
}

impl<D: Document> JsonDocStore<D> {
    /// Open a handle on `path`. Nothing is touched on disk until the first load or save.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let file_path = path.into();
        let lock = lock_for(&file_path);
        Self { file_path, lock, retry: WriteRetryPolicy::default(), _doc: PhantomData }
    }

    pub fn with_retry(mut self, retry: WriteRetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Read the current document; a missing file yields `D::default()`.
    pub async fn load(&self) -> Result<D, ServiceError> {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    /// Replace the whole document.
    pub async fn save(&self, doc: &D) -> Result<(), ServiceError> {
        let _guard = self.lock.lock().await;
        self.write_unlocked(doc).await
    }

    /// Load, apply `f`, save; all under the document lock.
    ///
    /// When `f` fails nothing is written and its error is returned unchanged.
    #[instrument(skip(self, f), fields(path = %self.file_path.display()))]
    pub async fn mutate<T, F>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut D) -> Result<T, ServiceError>,
    {
        let _guard = self.lock.lock().await;
        let mut doc = self.read_unlocked().await?;
        let out = f(&mut doc)?;
        self.write_unlocked(&doc).await?;
        debug!("document mutated");
        Ok(out)
    }

    async fn read_unlocked(&self) -> Result<D, ServiceError> {
        match fs::read(&self.file_path).await {
            Ok(bytes) => {
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return Ok(D::default());
                }
                serde_json::from_slice(&bytes).map_err(|e| {
                    error!(path = %self.file_path.display(), error = %e, "document is not valid JSON");
                    ServiceError::CorruptStore {
                        path: self.file_path.display().to_string(),
                        reason: e.to_string(),
                    }
                })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.ensure_parent()
                    .await
                    .map_err(|e| ServiceError::StorageWriteFailed(format!("{}: {e}", self.file_path.display())))?;
                Ok(D::default())
            }
            Err(e) => {
                error!(path = %self.file_path.display(), error = %e, "document read failed");
                Err(ServiceError::StorageReadFailed(format!("{}: {e}", self.file_path.display())))
            }
        }
    }

    async fn write_unlocked(&self, doc: &D) -> Result<(), ServiceError> {
        let data = serde_json::to_vec_pretty(doc)
            .map_err(|e| ServiceError::StorageWriteFailed(e.to_string()))?;
        let bytes = data.as_slice();
        self.retry.run(move || self.write_atomic(bytes)).await.map_err(|e| {
            error!(path = %self.file_path.display(), error = %e, "document write failed");
            ServiceError::StorageWriteFailed(format!("{}: {e}", self.file_path.display()))
        })
    }

    async fn write_atomic(&self, data: &[u8]) -> io::Result<()> {
        self.ensure_parent().await?;
        let tmp = self.tmp_path();
        let result = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp, &self.file_path).await
        }
        .await;
        if result.is_err() {
            let _ = fs::remove_file(&tmp).await;
        }
        result
    }

    async fn ensure_parent(&self) -> io::Result<()> {
        match self.file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).await,
            _ => Ok(()),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let name = self
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        self.file_path.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4().simple()))
    }
}
