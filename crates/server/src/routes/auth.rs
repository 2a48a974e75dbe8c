use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use serde::Serialize;

use common::types::Message;
use service::auth::domain::{LoginInput, RegisterInput};

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Serialize, Debug)]
pub struct LoginOutput {
    pub message: String,
    pub username: String,
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<Json<Message>, ApiError> {
    let Json(input) = payload?;
    state.auth.register(input).await?;
    Ok(Json(Message::new("Registration successful")))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<LoginOutput>, ApiError> {
    let Json(input) = payload?;
    let session = state.auth.login(input).await?;
    Ok(Json(LoginOutput { message: "Login successful".into(), username: session.username }))
}
