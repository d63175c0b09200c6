use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use crate::app_state::AppState;
use crate::models::comic::{ComicStatusView, GenerateComicRequest, GenerateComicResponse};
use crate::routes::error::ApiError;

/// POST /api/v1/comic/generate — Start generating a comic for a diary entry.
pub async fn generate_comic(
    State(state): State<AppState>,
    payload: Result<Json<GenerateComicRequest>, JsonRejection>,
) -> Result<Json<GenerateComicResponse>, ApiError> {
    let Json(request) = payload?;
    let task = state.comics.submit(request).await?;

    Ok(Json(GenerateComicResponse {
        comic_id: task.id,
        status: task.status,
        estimated_time_seconds: task.estimated_seconds,
        message: "Comic generation started".to_string(),
    }))
}

/// GET /api/v1/comic/{id} — Poll comic generation status.
pub async fn get_comic(
    State(state): State<AppState>,
    Path(comic_id): Path<String>,
) -> Result<Json<ComicStatusView>, ApiError> {
    let view = state.comics.get_status(&comic_id).await?;
    Ok(Json(view))
}
