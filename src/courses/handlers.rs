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

use super::engine::CourseEngine;
use super::types::{
    CourseFilters, CourseListResponse, CreateCourseRequest, CreateModuleRequest, ReorderRequest,
    UpdateCourseRequest, UpdateModuleRequest,
};
use crate::core::shared::state::AppState;
use crate::core::shared::{ApiResult, Pagination};
use crate::core::urls::ApiUrls;
use crate::security::AuthenticatedUser;

/// List published courses with optional filters
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<CourseFilters>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<impl IntoResponse> {
    let engine = CourseEngine::new(state.conn.clone());
    let (courses, total) = engine.list_courses(filters, pagination).await?;

    Ok(Json(json!({
        "success": true,
        "data": CourseListResponse {
            courses,
            total,
            page: pagination.page(),
            limit: pagination.limit(),
        }
    })))
}

pub async fn create_course(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<CreateCourseRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = CourseEngine::new(state.conn.clone());
    let course = engine.create_course(user.user_id, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": course
        })),
    ))
}

/// Course with its module outline
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let engine = CourseEngine::new(state.conn.clone());
    let detail = engine.get_course_detail(user, course_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": detail
    })))
}

pub async fn list_teaching(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<impl IntoResponse> {
    let engine = CourseEngine::new(state.conn.clone());
    let courses = engine.list_teaching(user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": courses
    })))
}

pub async fn update_course(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<UpdateCourseRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = CourseEngine::new(state.conn.clone());
    let course = engine.update_course(user, course_id, req).await?;

    Ok(Json(json!({
        "success": true,
        "data": course
    })))
}

pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let engine = CourseEngine::new(state.conn.clone());
    engine.delete_course(user, course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_module(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<CreateModuleRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = CourseEngine::new(state.conn.clone());
    let module = engine.create_module(user, course_id, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": module
        })),
    ))
}

pub async fn update_module(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((course_id, module_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateModuleRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = CourseEngine::new(state.conn.clone());
    let module = engine.update_module(user, course_id, module_id, req).await?;

    Ok(Json(json!({
        "success": true,
        "data": module
    })))
}

pub async fn delete_module(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((course_id, module_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let engine = CourseEngine::new(state.conn.clone());
    engine.delete_module(user, course_id, module_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_content(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(course_id): Path<Uuid>,
    Json(plan): Json<ReorderRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = CourseEngine::new(state.conn.clone());
    let content = engine.reorder(user, course_id, plan).await?;

    Ok(Json(json!({
        "success": true,
        "data": content
    })))
}

pub async fn get_content(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let engine = CourseEngine::new(state.conn.clone());
    let content = engine.get_content(user, course_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": content
    })))
}

pub async fn list_students(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let engine = CourseEngine::new(state.conn.clone());
    let students = engine.list_students(user, course_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": students
    })))
}

pub async fn enroll(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let engine = CourseEngine::new(state.conn.clone());
    let enrollment = engine.enroll(user.user_id, course_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": enrollment
        })),
    ))
}

pub async fn unenroll(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let engine = CourseEngine::new(state.conn.clone());
    engine.unenroll(user.user_id, course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn check_enrollment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let engine = CourseEngine::new(state.conn.clone());
    let status = engine.check_enrollment(user.user_id, course_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": status
    })))
}

pub async fn my_enrollments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<impl IntoResponse> {
    let engine = CourseEngine::new(state.conn.clone());
    let enrollments = engine.list_my_enrollments(user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": enrollments
    })))
}

pub fn configure_course_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::COURSES, get(list_courses).post(create_course))
        .route(ApiUrls::COURSES_TEACHING, get(list_teaching))
        .route(
            ApiUrls::COURSE_BY_ID,
            get(get_course).put(update_course).delete(delete_course),
        )
        .route(ApiUrls::COURSE_MODULES, post(create_module))
        .route(
            ApiUrls::COURSE_MODULE_BY_ID,
            put(update_module).delete(delete_module),
        )
        .route(ApiUrls::COURSE_REORDER, put(reorder_content))
        .route(ApiUrls::COURSE_CONTENT, get(get_content))
        .route(ApiUrls::COURSE_STUDENTS, get(list_students))
        .route(
            ApiUrls::COURSE_ENROLLMENT,
            post(enroll).delete(unenroll).get(check_enrollment),
        )
        .route(ApiUrls::USER_ME_ENROLLMENTS, get(my_enrollments))
}
