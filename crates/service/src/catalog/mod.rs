//! Catalog module: per-user product lists backed by the products document,
//! with images persisted through a [`BlobStore`](crate::storage::BlobStore).

pub mod domain;
pub mod service;

pub use domain::{NewProduct, Product, ProductDetails, ProductUpdate, Upload};
pub use service::CatalogService;
