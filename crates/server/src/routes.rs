use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use configs::StorageConfig;

use crate::state::AppState;

pub mod auth;
pub mod form;
pub mod products;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: API routes, uploaded blobs and health.
pub fn build_router(state: AppState, storage: &StorageConfig, cors: CorsLayer) -> Router {
    let uploads = ServeDir::new(&storage.uploads_dir);

    let api = Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route(
            "/api/products",
            get(products::list).post(products::add).delete(products::delete),
        )
        .route("/api/products/update", post(products::update))
        .route("/api/products/favorite", post(products::toggle_favorite))
        .layer(DefaultBodyLimit::max(storage.max_upload_bytes));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .nest_service(storage.uploads_url_prefix.trim_end_matches('/'), uploads)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 5xx responses
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
