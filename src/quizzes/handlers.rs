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

use super::engine::QuizEngine;
use super::types::{CreateQuizRequest, SubmitQuizRequest, UpdateQuizRequest};
use crate::core::shared::state::AppState;
use crate::core::shared::ApiResult;
use crate::core::urls::ApiUrls;
use crate::security::AuthenticatedUser;

pub async fn create_quiz(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<CreateQuizRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = QuizEngine::new(state.conn.clone());
    let quiz = engine.create_quiz(user, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": quiz
        })),
    ))
}

pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(quiz_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let engine = QuizEngine::new(state.conn.clone());
    let quiz = engine.get_quiz(user, quiz_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": quiz
    })))
}

pub async fn update_quiz(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<UpdateQuizRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = QuizEngine::new(state.conn.clone());
    let quiz = engine.update_quiz(user, quiz_id, req).await?;

    Ok(Json(json!({
        "success": true,
        "data": quiz
    })))
}

pub async fn delete_quiz(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(quiz_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let engine = QuizEngine::new(state.conn.clone());
    engine.delete_quiz(user, quiz_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit_quiz(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<SubmitQuizRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = QuizEngine::new(state.conn.clone());
    let result = engine.submit_quiz(user.user_id, quiz_id, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": result
        })),
    ))
}

pub async fn list_attempts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(quiz_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let engine = QuizEngine::new(state.conn.clone());
    let attempts = engine.list_attempts(user, quiz_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": attempts
    })))
}

pub fn configure_quiz_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::QUIZZES, post(create_quiz))
        .route(
            ApiUrls::QUIZ_BY_ID,
            get(get_quiz).put(update_quiz).delete(delete_quiz),
        )
        .route(ApiUrls::QUIZ_SUBMIT, post(submit_quiz))
        .route(ApiUrls::QUIZ_ATTEMPTS, get(list_attempts))
}
