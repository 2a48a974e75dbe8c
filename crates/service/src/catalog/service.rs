use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::{NewProduct, Product, ProductUpdate, Upload};
use crate::errors::ServiceError;
use crate::storage::blob_store::extension_from_filename;
use crate::storage::{BlobRef, BlobStore, RecordStore};

/// Product workflows for one products document and one blob store.
#[derive(Clone)]
pub struct CatalogService {
    products: RecordStore<Product>,
    blobs: Arc<dyn BlobStore>,
}

fn require(fields: &[&str], msg: &str) -> Result<(), ServiceError> {
    if fields.iter().any(|f| f.is_empty()) {
        return Err(ServiceError::validation(msg));
    }
    Ok(())
}

fn find_mut<'a>(products: &'a mut [Product], product_id: &str) -> Result<&'a mut Product, ServiceError> {
    products
        .iter_mut()
        .find(|p| p.id == product_id)
        .ok_or_else(|| ServiceError::not_found("product"))
}

impl CatalogService {
    pub fn new(products: RecordStore<Product>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { products, blobs }
    }

    async fn store_image(&self, image: &Upload) -> Result<BlobRef, ServiceError> {
        let ext = extension_from_filename(&image.file_name);
        self.blobs.put(&image.bytes, &ext).await
    }

    /// Products of `username` in insertion order; unknown users have none.
    #[instrument(skip(self))]
    pub async fn list(&self, username: &str) -> Result<Vec<Product>, ServiceError> {
        require(&[username], "Username required")?;
        self.products.list(username).await
    }

    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn add(&self, input: NewProduct) -> Result<Product, ServiceError> {
        const MSG: &str = "Username, product name, and image are required";
        require(&[input.username.as_str(), input.name.as_str()], MSG)?;
        let image = match input.image {
            Some(image) if !image.is_empty() => image,
            _ => return Err(ServiceError::validation(MSG)),
        };

        let blob = self.store_image(&image).await?;
        let product = Product::create(
            Uuid::new_v4().to_string(),
            input.name,
            input.details,
            blob.reference,
            Utc::now(),
        );

        let created = product.clone();
        self.products
            .mutate(&input.username, move |products| {
                products.push(product);
                Ok(())
            })
            .await?;
        info!(product_id = %created.id, "product_added");
        Ok(created)
    }

    /// Remove one product. An unknown id for a known user changes nothing and
    /// reports `false`.
    #[instrument(skip(self))]
    pub async fn delete(&self, username: &str, product_id: &str) -> Result<bool, ServiceError> {
        require(&[username, product_id], "Missing required fields")?;
        let removed = self
            .products
            .mutate_existing(username, |products| {
                let before = products.len();
                products.retain(|p| p.id != product_id);
                Ok(products.len() != before)
            })
            .await?;
        info!(removed, "product_delete");
        Ok(removed)
    }

    /// Update supplied fields; a non-empty image replaces the reference and
    /// leaves the previous blob on disk.
    #[instrument(skip(self, input), fields(username = %input.username, product_id = %input.product_id))]
    pub async fn update(&self, input: ProductUpdate) -> Result<Product, ServiceError> {
        require(
            &[input.username.as_str(), input.product_id.as_str(), input.name.as_str()],
            "Username, product ID, and name are required",
        )?;

        let new_image = match input.image.as_ref().filter(|i| !i.is_empty()) {
            Some(image) => {
                // no blob for a product that is not there
                let products = self
                    .products
                    .get(&input.username)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("user"))?;
                if !products.iter().any(|p| p.id == input.product_id) {
                    return Err(ServiceError::not_found("product"));
                }
                Some(self.store_image(image).await?.reference)
            }
            None => None,
        };

        let ProductUpdate { username, product_id, name, details, .. } = input;
        let updated = self
            .products
            .mutate_existing(&username, |products| {
                let product = find_mut(products, &product_id)?;
                product.apply(name, details);
                if let Some(reference) = new_image {
                    product.image = reference;
                }
                Ok(product.clone())
            })
            .await?;
        info!("product_updated");
        Ok(updated)
    }

    /// Flip the favourite flag and return its new value.
    #[instrument(skip(self))]
    pub async fn toggle_favorite(&self, username: &str, product_id: &str) -> Result<bool, ServiceError> {
        require(&[username, product_id], "Missing required fields")?;
        let state = self
            .products
            .mutate_existing(username, |products| {
                let product = find_mut(products, product_id)?;
                product.is_favorite = !product.is_favorite;
                Ok(product.is_favorite)
            })
            .await?;
        info!(is_favorite = state, "favorite_toggled");
        Ok(state)
    }
}
