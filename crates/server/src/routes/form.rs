use axum::extract::Multipart;
use tracing::debug;

use service::catalog::domain::{parse_price, parse_rating};
use service::catalog::{NewProduct, ProductDetails, ProductUpdate, Upload};

use crate::errors::ApiError;

/// Fields of the add/update product forms.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub username: String,
    pub product_id: String,
    pub name: String,
    pub details: ProductDetails,
    pub image: Option<Upload>,
}

impl ProductForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let key = field.name().unwrap_or_default().to_string();
            if key == "image" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                form.image = Some(Upload { file_name, bytes: bytes.to_vec() });
                continue;
            }

            let value = field.text().await?;
            let details = &mut form.details;
            match key.as_str() {
                "username" => form.username = value,
                "productId" => form.product_id = value,
                "name" => form.name = value,
                "description" => details.description = Some(value),
                "rating" => details.rating = Some(parse_rating(&value)),
                "category" => details.category = Some(value),
                "price" => details.price = Some(parse_price(&value)),
                "store" => details.store = Some(value),
                "country" => details.country = Some(value),
                other => debug!(field = %other, "ignoring unknown form field"),
            }
        }
        Ok(form)
    }

    pub fn into_new_product(self) -> NewProduct {
        NewProduct { username: self.username, name: self.name, details: self.details, image: self.image }
    }

    pub fn into_update(self) -> ProductUpdate {
        ProductUpdate {
            username: self.username,
            product_id: self.product_id,
            name: self.name,
            details: self.details,
            image: self.image,
        }
    }
}
