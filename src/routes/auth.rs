use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::app_state::AppState;
use crate::models::auth::{LoginRequest, MessageResponse, TokenResponse};
use crate::routes::error::ApiError;

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(request) = payload?;
    let token = state.auth.login(&request.email, &request.password)?;
    Ok(Json(token))
}

/// POST /api/v1/auth/logout — tokens are stateless, nothing to revoke.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Successfully logged out".to_string(),
    })
}
