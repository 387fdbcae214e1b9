use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::engine::AchievementEngine;
use crate::core::shared::state::AppState;
use crate::core::shared::ApiResult;
use crate::core::urls::ApiUrls;
use crate::security::AuthenticatedUser;

pub async fn my_achievements(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<impl IntoResponse> {
    let engine = AchievementEngine::new(state.conn.clone());
    let summary = engine.for_user(user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": summary
    })))
}

pub async fn user_achievements(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let engine = AchievementEngine::new(state.conn.clone());
    let summary = engine.for_user(user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": summary
    })))
}

pub fn configure_achievement_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::USER_ME_ACHIEVEMENTS, get(my_achievements))
        .route(ApiUrls::USER_ACHIEVEMENTS, get(user_achievements))
}
