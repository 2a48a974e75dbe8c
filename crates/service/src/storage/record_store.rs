use std::collections::HashMap;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};

use crate::errors::ServiceError;
use crate::storage::json_doc_store::JsonDocStore;
use crate::storage::retry::WriteRetryPolicy;

/// Document shape: owner key -> records in insertion order.
pub type KeyedDocument<R> = HashMap<String, Vec<R>>;

/// Sequences of records keyed by owner, persisted as one JSON object.
pub struct RecordStore<R> {
    doc: JsonDocStore<KeyedDocument<R>>,
    owner: &'static str,
}

impl<R> Clone for RecordStore<R> {
    fn clone(&self) -> Self {
        Self { doc: self.doc.clone(), owner: self.owner }
    }
}

impl<R> RecordStore<R>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// `owner` names the key in not-found errors, e.g. `"user"`.
    pub fn new<P: Into<PathBuf>>(path: P, owner: &'static str) -> Self {
        Self { doc: JsonDocStore::new(path), owner }
    }

    pub fn with_retry(mut self, retry: WriteRetryPolicy) -> Self {
        self.doc = self.doc.with_retry(retry);
        self
    }

    pub fn document(&self) -> &JsonDocStore<KeyedDocument<R>> {
        &self.doc
    }

    /// Records stored under `key`; an unknown key is an empty list.
    pub async fn list(&self, key: &str) -> Result<Vec<R>, ServiceError> {
        Ok(self.get(key).await?.unwrap_or_default())
    }

    /// Records under `key`, or `None` when the key was never written.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<R>>, ServiceError> {
        let mut doc = self.doc.load().await?;
        Ok(doc.remove(key))
    }

    /// Apply `f` to the sequence at `key`, starting from an empty one if absent.
    pub async fn mutate<T, F>(&self, key: &str, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut Vec<R>) -> Result<T, ServiceError>,
    {
        self.doc
            .mutate(|doc| f(doc.entry(key.to_string()).or_default()))
            .await
    }

    /// Apply `f` to the sequence at `key`; fails with `NotFound` if the key is absent.
    pub async fn mutate_existing<T, F>(&self, key: &str, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut Vec<R>) -> Result<T, ServiceError>,
    {
        let owner = self.owner;
        self.doc
            .mutate(|doc| {
                let records = doc.get_mut(key).ok_or_else(|| ServiceError::not_found(owner))?;
                f(records)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn store() -> (RecordStore<String>, PathBuf) {
        let dir = std::env::temp_dir().join(format!("record_store_{}", Uuid::new_v4()));
        (RecordStore::new(dir.join("records.json"), "user"), dir)
    }

    #[tokio::test]
    async fn unknown_key_lists_empty() -> Result<(), anyhow::Error> {
        let (store, dir) = store();
        assert!(store.list("nobody").await?.is_empty());
        assert!(store.get("nobody").await?.is_none());
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn mutate_keeps_order_and_isolates_keys() -> Result<(), anyhow::Error> {
        let (store, dir) = store();
        for item in ["a", "b", "c"] {
            store.mutate("alice", |seq| { seq.push(item.to_string()); Ok(()) }).await?;
        }
        store.mutate("bob", |seq| { seq.push("z".to_string()); Ok(()) }).await?;

        assert_eq!(store.list("alice").await?, vec!["a", "b", "c"]);
        assert_eq!(store.list("bob").await?, vec!["z"]);
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn mutate_existing_requires_key() -> Result<(), anyhow::Error> {
        let (store, dir) = store();
        let res = store.mutate_existing("ghost", |seq| { seq.push("x".into()); Ok(()) }).await;
        match res {
            Err(ServiceError::NotFound(msg)) => assert_eq!(msg, "user not found"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(store.get("ghost").await?.is_none());

        // an existing but empty sequence is still "existing"
        store.mutate("alice", |_| Ok(())).await?;
        assert_eq!(store.get("alice").await?, Some(vec![]));
        let removed = store
            .mutate_existing("alice", |seq| {
                let before = seq.len();
                seq.retain(|r| r != "x");
                Ok(before != seq.len())
            })
            .await?;
        assert!(!removed);
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
