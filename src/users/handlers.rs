use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use log::{info, warn};
use serde_json::json;
use std::sync::Arc;
use tower_cookies::{cookie::SameSite, Cookie, Cookies};
use uuid::Uuid;

use super::engine::UserEngine;
use super::types::{
    AuthResponse, ChangeRoleRequest, LoginRequest, RefreshRequest, RegisterRequest,
    UpdateProfileRequest, User, UserListResponse, UserResponse,
};
use crate::core::shared::state::AppState;
use crate::core::shared::{ApiError, ApiResult, Pagination};
use crate::core::urls::ApiUrls;
use crate::security::{extract_token, AuthConfig, AuthenticatedUser, Permission, Role, TokenPair};

fn set_auth_cookie(cookies: &Cookies, config: &AuthConfig, token: &str) {
    let cookie = Cookie::build((config.cookie_name.clone(), token.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .build();
    cookies.add(cookie);
}

fn clear_auth_cookie(cookies: &Cookies, config: &AuthConfig) {
    cookies.remove(Cookie::build((config.cookie_name.clone(), "")).path("/").build());
}

fn issue_tokens(state: &AppState, user: &User) -> ApiResult<TokenPair> {
    state
        .jwt_manager
        .generate_token_pair(user.id, &user.email, &user.role)
        .map_err(|e| ApiError::internal(format!("Token generation failed: {e:#}")))
}

fn auth_payload(state: &AppState, cookies: &Cookies, user: User) -> ApiResult<AuthResponse> {
    let tokens = issue_tokens(state, &user)?;
    set_auth_cookie(cookies, &state.auth_config, &tokens.access_token);
    Ok(AuthResponse {
        user: UserResponse::from(user),
        tokens,
    })
}

/// Create an account and sign it in
pub async fn register(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = UserEngine::new(state.conn.clone());
    let user = engine.register(req).await?;
    let payload = auth_payload(&state, &cookies, user)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": payload
        })),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = UserEngine::new(state.conn.clone());
    let user = engine.authenticate(&req.email, &req.password).await?;
    info!("User {} logged in", user.id);
    let payload = auth_payload(&state, &cookies, user)?;

    Ok(Json(json!({
        "success": true,
        "data": payload
    })))
}

/// Exchange a refresh token for a new pair. The presented refresh token is spent.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<impl IntoResponse> {
    let user_id = state
        .jwt_manager
        .consume_refresh_token(&req.refresh_token)
        .await
        .map_err(|e| {
            warn!("Refresh rejected: {e:#}");
            ApiError::Unauthorized("Invalid or expired refresh token".to_string())
        })?;

    let engine = UserEngine::new(state.conn.clone());
    let user = engine.get_user(user_id).await.map_err(|e| match e {
        ApiError::NotFound(_) => ApiError::Unauthorized("Account no longer exists".to_string()),
        other => other,
    })?;
    let payload = auth_payload(&state, &cookies, user)?;

    Ok(Json(json!({
        "success": true,
        "data": payload
    })))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    headers: HeaderMap,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<impl IntoResponse> {
    if let Some(token) = extract_token(&headers, &state.auth_config) {
        if let Err(e) = state.jwt_manager.revoke_by_token(&token).await {
            warn!("Could not revoke token on logout: {e:#}");
        }
    }
    clear_auth_cookie(&cookies, &state.auth_config);
    info!("User {} logged out", user.user_id);

    Ok(Json(json!({
        "success": true,
        "data": { "message": "Logged out" }
    })))
}

pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<impl IntoResponse> {
    let engine = UserEngine::new(state.conn.clone());
    let me = engine.get_user(user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": UserResponse::from(me)
    })))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    let engine = UserEngine::new(state.conn.clone());
    let updated = engine.update_profile(user.user_id, req).await?;

    Ok(Json(json!({
        "success": true,
        "data": UserResponse::from(updated)
    })))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<impl IntoResponse> {
    let engine = UserEngine::new(state.conn.clone());
    let (users, total) = engine.list_users(pagination).await?;

    Ok(Json(json!({
        "success": true,
        "data": UserListResponse {
            users: users.into_iter().map(UserResponse::from).collect(),
            total,
            page: pagination.page(),
            limit: pagination.limit(),
        }
    })))
}

/// Users may read their own record; reading others needs ManageUsers.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if user.user_id != user_id && !user.has_permission(&Permission::ManageUsers) {
        return Err(ApiError::forbidden("You can only view your own account"));
    }

    let engine = UserEngine::new(state.conn.clone());
    let found = engine.get_user(user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": UserResponse::from(found)
    })))
}

pub async fn change_role(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<ChangeRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    let role = req.role.parse::<Role>().map_err(ApiError::Validation)?;
    let engine = UserEngine::new(state.conn.clone());
    let updated = engine.change_role(user_id, role).await?;

    Ok(Json(json!({
        "success": true,
        "data": UserResponse::from(updated)
    })))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if user.user_id == user_id {
        return Err(ApiError::validation("Admins cannot delete their own account"));
    }

    let engine = UserEngine::new(state.conn.clone());
    engine.delete_user(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn configure_user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::USER_REGISTER, post(register))
        .route(ApiUrls::USER_LOGIN, post(login))
        .route(ApiUrls::USER_REFRESH, post(refresh))
        .route(ApiUrls::USER_LOGOUT, post(logout))
        .route(ApiUrls::USER_ME, get(get_me).put(update_me))
        .route(ApiUrls::USERS, get(list_users))
        .route(ApiUrls::USER_BY_ID, get(get_user).delete(delete_user))
        .route(ApiUrls::USER_ROLE, put(change_role))
}
