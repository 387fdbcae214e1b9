use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::engine::ForumEngine;
use super::types::{CreatePostRequest, CreateThreadRequest, PinThreadRequest, UpdatePostRequest};
use crate::core::shared::state::AppState;
use crate::core::shared::{ApiResult, Pagination};
use crate::core::urls::ApiUrls;
use crate::security::AuthenticatedUser;

pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(course_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<impl IntoResponse> {
    let engine = ForumEngine::new(state.conn.clone());
    let page = engine.list_threads(user, course_id, pagination).await?;

    Ok(Json(json!({
        "success": true,
        "data": page
    })))
}

pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<CreateThreadRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = ForumEngine::new(state.conn.clone());
    let thread = engine.create_thread(user, course_id, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": thread
        })),
    ))
}

pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(thread_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let engine = ForumEngine::new(state.conn.clone());
    let thread = engine.get_thread(user, thread_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": thread
    })))
}

pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(thread_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let engine = ForumEngine::new(state.conn.clone());
    engine.delete_thread(user, thread_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn pin_thread(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(thread_id): Path<Uuid>,
    Json(req): Json<PinThreadRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = ForumEngine::new(state.conn.clone());
    let thread = engine.set_pinned(user, thread_id, req.pinned).await?;

    Ok(Json(json!({
        "success": true,
        "data": thread
    })))
}

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(thread_id): Path<Uuid>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = ForumEngine::new(state.conn.clone());
    let post = engine.create_post(user, thread_id, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": post
        })),
    ))
}

pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(post_id): Path<Uuid>,
    Json(req): Json<UpdatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = ForumEngine::new(state.conn.clone());
    let post = engine.update_post(user, post_id, req).await?;

    Ok(Json(json!({
        "success": true,
        "data": post
    })))
}

pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(post_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let engine = ForumEngine::new(state.conn.clone());
    engine.delete_post(user, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn configure_forum_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            ApiUrls::FORUM_COURSE_THREADS,
            get(list_threads).post(create_thread),
        )
        .route(
            ApiUrls::FORUM_THREAD_BY_ID,
            get(get_thread).delete(delete_thread),
        )
        .route(ApiUrls::FORUM_THREAD_PIN, put(pin_thread))
        .route(ApiUrls::FORUM_THREAD_POSTS, post(create_post))
        .route(
            ApiUrls::FORUM_POST_BY_ID,
            put(update_post).delete(delete_post),
        )
}
