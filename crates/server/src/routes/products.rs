use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use service::catalog::Product;

use crate::errors::ApiError;
use crate::routes::form::ProductForm;
use crate::state::AppState;

#[derive(Deserialize, Debug)]
pub struct ListQuery {
    pub username: Option<String>,
}

/// Body of the delete and favorite endpoints.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ProductList {
    pub products: Vec<Product>,
}

#[derive(Serialize, Debug)]
pub struct ProductOutput {
    pub message: String,
    pub product: Product,
}

#[derive(Serialize, Debug)]
pub struct DeleteOutput {
    pub message: String,
    pub deleted: bool,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteOutput {
    pub message: String,
    pub is_favorite: bool,
}

pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ProductList>, ApiError> {
    let username = q.username.unwrap_or_default();
    let products = state.catalog.list(&username).await?;
    Ok(Json(ProductList { products }))
}

pub async fn add(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProductOutput>, ApiError> {
    let form = ProductForm::read(multipart?).await?;
    let product = state.catalog.add(form.into_new_product()).await?;
    Ok(Json(ProductOutput { message: "Product added successfully".into(), product }))
}

pub async fn delete(
    State(state): State<AppState>,
    payload: Result<Json<ProductRef>, JsonRejection>,
) -> Result<Json<DeleteOutput>, ApiError> {
    let Json(body) = payload?;
    let deleted = state
        .catalog
        .delete(body.username.as_deref().unwrap_or_default(), body.product_id.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(DeleteOutput { message: "Product deleted successfully".into(), deleted }))
}

pub async fn update(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProductOutput>, ApiError> {
    let form = ProductForm::read(multipart?).await?;
    let product = state.catalog.update(form.into_update()).await?;
    Ok(Json(ProductOutput { message: "Product updated successfully".into(), product }))
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    payload: Result<Json<ProductRef>, JsonRejection>,
) -> Result<Json<FavoriteOutput>, ApiError> {
    let Json(body) = payload?;
    let is_favorite = state
        .catalog
        .toggle_favorite(body.username.as_deref().unwrap_or_default(), body.product_id.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(FavoriteOutput { message: "Favorite toggled successfully".into(), is_favorite }))
}
