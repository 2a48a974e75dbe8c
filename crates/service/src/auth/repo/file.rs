use std::path::PathBuf;

use async_trait::async_trait;

use crate::auth::domain::Credential;
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;
use crate::errors::ServiceError;
use crate::storage::{JsonDocStore, WriteRetryPolicy};

/// Credentials kept as a JSON array of `{username, password}`.
#[derive(Clone)]
pub struct FileAuthRepository {
    store: JsonDocStore<Vec<Credential>>,
}

impl FileAuthRepository {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { store: JsonDocStore::new(path) }
    }

    pub fn with_retry(self, retry: WriteRetryPolicy) -> Self {
        Self { store: self.store.with_retry(retry) }
    }
}

#[async_trait]
impl AuthRepository for FileAuthRepository {
    async fn find_match(&self, username: &str, password: &str) -> Result<Option<Credential>, AuthError> {
        let users = self.store.load().await?;
        Ok(users.into_iter().find(|u| u.username == username && u.password == password))
    }

    async fn insert_unique(&self, cred: Credential) -> Result<(), AuthError> {
        self.store
            .mutate(|users| {
                if users.iter().any(|u| u.username == cred.username) {
                    return Err(ServiceError::Conflict(cred.username.clone()));
                }
                users.push(cred);
                Ok(())
            })
            .await
            .map_err(|e| match e {
                ServiceError::Conflict(_) => AuthError::Conflict,
                other => AuthError::Store(other),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn cred(u: &str, p: &str) -> Credential {
        Credential { username: u.into(), password: p.into() }
    }

    #[tokio::test]
    async fn file_repo_insert_find_and_conflict() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("auth_repo_{}", Uuid::new_v4()));
        let path = dir.join("users.json");
        let repo = FileAuthRepository::new(&path);

        assert_eq!(repo.find_match("alice", "secret1").await?, None);
        repo.insert_unique(cred("alice", "secret1")).await?;
        repo.insert_unique(cred("bob", "secret2")).await?;
        assert!(matches!(repo.insert_unique(cred("alice", "other")).await, Err(AuthError::Conflict)));

        assert_eq!(repo.find_match("alice", "secret1").await?, Some(cred("alice", "secret1")));
        assert_eq!(repo.find_match("alice", "secret2").await?, None);
        assert_eq!(repo.find_match("bob", "secret2").await?, Some(cred("bob", "secret2")));

        // on-disk format is a plain array
        let raw: serde_json::Value = serde_json::from_slice(&tokio::fs::read(&path).await?)?;
        assert_eq!(raw, serde_json::json!([
            {"username": "alice", "password": "secret1"},
            {"username": "bob", "password": "secret2"}
        ]));

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_credentials_surface_as_store_error() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("auth_repo_{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join("users.json");
        tokio::fs::write(&path, b"not json").await?;

        let repo = FileAuthRepository::new(&path);
        assert!(matches!(
            repo.find_match("alice", "x").await,
            Err(AuthError::Store(ServiceError::CorruptStore { .. }))
        ));
        assert!(matches!(
            repo.insert_unique(cred("alice", "secret1")).await,
            Err(AuthError::Store(ServiceError::CorruptStore { .. }))
        ));

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
