//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::{info, warn};

/// Ensure the document directory and the upload directory exist.
///
/// The upload directory is normally nested under a public root that is
/// served statically; a missing root is only worth a warning since it is
/// created alongside the upload directory.
pub async fn ensure_env(data_dir: &Path, uploads_dir: &Path) -> anyhow::Result<()> {
    if let Some(public_root) = uploads_dir.parent() {
        if !public_root.as_os_str().is_empty() && tokio::fs::metadata(public_root).await.is_err() {
            warn!(public_root = %public_root.display(), "public directory not found; creating it");
        }
    }
    for dir in [data_dir, uploads_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", dir.display()))?;
    }
    info!(data_dir = %data_dir.display(), uploads_dir = %uploads_dir.display(), "runtime directories ready");
    Ok(())
}
