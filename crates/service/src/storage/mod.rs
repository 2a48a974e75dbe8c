//! Storage abstractions for service layer
//!
//! File-backed document stores (whole-file JSON, one lock per path), the
//! write retry policy they share, and the write-once blob store for uploads.

pub mod blob_store;
pub mod json_doc_store;
pub mod record_store;
pub mod retry;

pub use blob_store::{BlobRef, BlobStore, FsBlobStore};
pub use json_doc_store::{Document, JsonDocStore};
pub use record_store::RecordStore;
pub use retry::WriteRetryPolicy;
