use std::sync::Arc;
use std::time::Duration;

use configs::StorageConfig;
use service::auth::repo::FileAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::catalog::CatalogService;
use service::storage::{FsBlobStore, RecordStore, WriteRetryPolicy};

/// Shared handler state: the two workflows over their stores.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService<FileAuthRepository>>,
    pub catalog: Arc<CatalogService>,
}

impl AppState {
    /// Wire stores at the configured locations. No I/O happens here.
    pub fn from_config(storage: &StorageConfig) -> Self {
        let base = Duration::from_millis(storage.retry_backoff_ms);
        let retry = WriteRetryPolicy::new(storage.write_retries, base, base.saturating_mul(8));

        let users = FileAuthRepository::new(storage.users_path()).with_retry(retry.clone());
        let auth = AuthService::new(Arc::new(users), AuthConfig::default());

        let products = RecordStore::new(storage.products_path(), "user").with_retry(retry);
        let blobs = FsBlobStore::new(&storage.uploads_dir, &storage.uploads_url_prefix);
        let catalog = CatalogService::new(products, Arc::new(blobs));

        Self { auth: Arc::new(auth), catalog: Arc::new(catalog) }
    }
}
