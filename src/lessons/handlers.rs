use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::engine::LessonEngine;
use super::types::{CreateLessonRequest, UpdateLessonRequest};
use crate::core::shared::state::AppState;
use crate::core::shared::ApiResult;
use crate::core::urls::ApiUrls;
use crate::security::AuthenticatedUser;

pub async fn create_lesson(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<CreateLessonRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = LessonEngine::new(state.conn.clone());
    let lesson = engine.create_lesson(user, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": lesson
        })),
    ))
}

pub async fn get_lesson(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(lesson_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let engine = LessonEngine::new(state.conn.clone());
    let lesson = engine.get_lesson(user, lesson_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": lesson
    })))
}

pub async fn update_lesson(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(lesson_id): Path<Uuid>,
    Json(req): Json<UpdateLessonRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = LessonEngine::new(state.conn.clone());
    let lesson = engine.update_lesson(user, lesson_id, req).await?;

    Ok(Json(json!({
        "success": true,
        "data": lesson
    })))
}

pub async fn delete_lesson(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(lesson_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let engine = LessonEngine::new(state.conn.clone());
    engine.delete_lesson(user, lesson_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn complete_lesson(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(lesson_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let engine = LessonEngine::new(state.conn.clone());
    let result = engine.complete_lesson(user.user_id, lesson_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": result
    })))
}

pub fn configure_lesson_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::LESSONS, post(create_lesson))
        .route(
            ApiUrls::LESSON_BY_ID,
            get(get_lesson).put(update_lesson).delete(delete_lesson),
        )
        .route(ApiUrls::LESSON_COMPLETE, post(complete_lesson))
}
