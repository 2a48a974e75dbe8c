//! Service layer for the product catalog.
//! - `storage`: whole-document JSON stores with per-path locking, and blob storage.
//! - `auth`: registration and login against the credentials document.
//! - `catalog`: per-user product workflows.

pub mod errors;
pub mod auth;
pub mod catalog;
pub mod runtime;
pub mod storage;
