use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::engine::AssignmentEngine;
use super::types::{
    CreateAssignmentRequest, GradeSubmissionRequest, SubmitAssignmentRequest,
    UpdateAssignmentRequest,
};
use crate::core::shared::state::AppState;
use crate::core::shared::ApiResult;
use crate::core::urls::ApiUrls;
use crate::security::AuthenticatedUser;

pub async fn create_assignment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<CreateAssignmentRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = AssignmentEngine::new(state.conn.clone());
    let assignment = engine.create_assignment(user, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": assignment
        })),
    ))
}

pub async fn get_assignment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(assignment_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let engine = AssignmentEngine::new(state.conn.clone());
    let assignment = engine.get_assignment(user, assignment_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": assignment
    })))
}

pub async fn update_assignment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(assignment_id): Path<Uuid>,
    Json(req): Json<UpdateAssignmentRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = AssignmentEngine::new(state.conn.clone());
    let assignment = engine.update_assignment(user, assignment_id, req).await?;

    Ok(Json(json!({
        "success": true,
        "data": assignment
    })))
}

pub async fn delete_assignment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(assignment_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let engine = AssignmentEngine::new(state.conn.clone());
    engine.delete_assignment(user, assignment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit_assignment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(assignment_id): Path<Uuid>,
    Json(req): Json<SubmitAssignmentRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = AssignmentEngine::new(state.conn.clone());
    let submission = engine.submit(user.user_id, assignment_id, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": submission
        })),
    ))
}

pub async fn my_submission(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(assignment_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let engine = AssignmentEngine::new(state.conn.clone());
    let submission = engine.my_submission(user.user_id, assignment_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": submission
    })))
}

pub async fn list_submissions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(assignment_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let engine = AssignmentEngine::new(state.conn.clone());
    let submissions = engine.list_submissions(user, assignment_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": submissions
    })))
}

pub async fn grade_submission(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(submission_id): Path<Uuid>,
    Json(req): Json<GradeSubmissionRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = AssignmentEngine::new(state.conn.clone());
    let submission = engine.grade(user, submission_id, req).await?;

    Ok(Json(json!({
        "success": true,
        "data": submission
    })))
}

pub fn configure_assignment_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::ASSIGNMENTS, post(create_assignment))
        .route(ApiUrls::SUBMISSION_GRADE, put(grade_submission))
        .route(
            ApiUrls::ASSIGNMENT_BY_ID,
            get(get_assignment)
                .put(update_assignment)
                .delete(delete_assignment),
        )
        .route(ApiUrls::ASSIGNMENT_SUBMIT, post(submit_assignment))
        .route(ApiUrls::ASSIGNMENT_MY_SUBMISSION, get(my_submission))
        .route(ApiUrls::ASSIGNMENT_SUBMISSIONS, get(list_submissions))
}
