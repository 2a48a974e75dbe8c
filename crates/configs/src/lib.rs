use std::io;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Where documents and uploaded blobs live on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,
    #[serde(default = "default_uploads_url_prefix")]
    pub uploads_url_prefix: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_write_retries")]
    pub write_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            uploads_dir: default_uploads_dir(),
            uploads_url_prefix: default_uploads_url_prefix(),
            max_upload_bytes: default_max_upload_bytes(),
            write_retries: default_write_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_data_dir() -> String { "data".into() }
fn default_uploads_dir() -> String { "static/uploads".into() }
fn default_uploads_url_prefix() -> String { "/uploads".into() }
fn default_max_upload_bytes() -> usize { 10 * 1024 * 1024 }
fn default_write_retries() -> u32 { 2 }
fn default_retry_backoff_ms() -> u64 { 20 }

/// `CONFIG_PATH`, or `config.toml` in the working directory.
pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Config file if present, otherwise defaults overlaid with environment variables.
    pub fn load_or_env() -> Result<Self> {
        Self::load_or_env_from(Path::new(&config_path()))
    }

    /// Only a missing file falls back to the environment; a file that exists
    /// but cannot be read, parsed or validated is an error.
    pub fn load_or_env_from(path: &Path) -> Result<Self> {
        let mut cfg = match std::fs::read_to_string(path) {
            Ok(content) => {
                load_from_str(&content).with_context(|| format!("invalid config {}", path.display()))?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::from_env(),
            Err(e) => return Err(anyhow!("cannot read config {}: {e}", path.display())),
        };
        cfg.normalize_and_validate()
            .with_context(|| format!("invalid settings from {}", path.display()))?;
        Ok(cfg)
    }

    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        if let Some(w) = std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()) {
            cfg.server.worker_threads = Some(w);
        }
        if let Ok(dir) = std::env::var("DATA_DIR") {
            cfg.storage.data_dir = dir;
        }
        if let Ok(dir) = std::env::var("UPLOADS_DIR") {
            cfg.storage.uploads_dir = dir;
        }
        cfg
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir is empty"));
        }
        if self.uploads_dir.trim().is_empty() {
            return Err(anyhow!("storage.uploads_dir is empty"));
        }
        if !self.uploads_url_prefix.starts_with('/') || self.uploads_url_prefix.trim_end_matches('/').is_empty() {
            return Err(anyhow!("storage.uploads_url_prefix must start with '/' and name a sub-path"));
        }
        if self.max_upload_bytes == 0 {
            return Err(anyhow!("storage.max_upload_bytes must be > 0"));
        }
        Ok(())
    }

    pub fn users_path(&self) -> std::path::PathBuf {
        Path::new(&self.data_dir).join("users.json")
    }

    pub fn products_path(&self) -> std::path::PathBuf {
        Path::new(&self.data_dir).join("products.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let mut cfg = load_from_str("").unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.storage.data_dir, "data");
        assert_eq!(cfg.storage.uploads_dir, "static/uploads");
        assert_eq!(cfg.storage.uploads_url_prefix, "/uploads");
        assert_eq!(cfg.storage.users_path(), std::path::Path::new("data/users.json"));
        assert_eq!(cfg.storage.products_path(), std::path::Path::new("data/products.json"));
    }

    #[test]
    fn partial_storage_section_keeps_other_defaults() {
        let cfg = load_from_str("[storage]\ndata_dir = \"/var/lib/catalog\"\n").unwrap();
        assert_eq!(cfg.storage.data_dir, "/var/lib/catalog");
        assert_eq!(cfg.storage.write_retries, 2);
    }

    #[test]
    fn zero_worker_threads_normalized() {
        let mut cfg = load_from_str("[server]\nhost = \" \"\nport = 9000\nworker_threads = 0\n").unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.worker_threads, Some(4));
    }

    #[test]
    fn invalid_storage_rejected() {
        let mut cfg = load_from_str("[storage]\nuploads_url_prefix = \"uploads\"\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg = load_from_str("[server]\nhost = \"0.0.0.0\"\nport = 0\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg = load_from_str("[storage]\nuploads_url_prefix = \"/\"\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg = load_from_str("[storage]\nmax_upload_bytes = 0\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }

    fn write_config(body: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("catalog_cfg_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn server_section_with_only_port_keeps_storage_settings() {
        let path = write_config("[server]\nport = 9000\n\n[storage]\ndata_dir = \"/srv/catalog\"\n");
        let cfg = AppConfig::load_or_env_from(&path).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.storage.data_dir, "/srv/catalog");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn invalid_config_file_is_an_error_not_a_fallback() {
        let path = write_config("[server]\nhost = \"0.0.0.0\"\nport = 0\n");
        assert!(AppConfig::load_or_env_from(&path).is_err());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());

        let path = write_config("[server\nport = ");
        assert!(AppConfig::load_or_env_from(&path).is_err());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("catalog_cfg_{}", uuid::Uuid::new_v4())).join("config.toml");
        let cfg = AppConfig::load_or_env_from(&path).unwrap();
        assert!(cfg.server.port > 0);
        assert!(!cfg.storage.data_dir.is_empty());
    }
}
