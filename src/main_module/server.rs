//! HTTP server initialization and routing

use axum::{middleware, routing::get, Router};
use log::{error, info};
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;
use crate::security::{auth_middleware, create_cors_layer, rbac_middleware, AuthMiddlewareState};

use super::{health_check, health_check_simple, shutdown_signal};

/// Assembles every module router behind the security stack.
/// Layers run bottom-up: trace, CORS, cookies, authentication, then RBAC.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let auth_state = AuthMiddlewareState::new(
        Arc::clone(&app_state.auth_config),
        Arc::clone(&app_state.jwt_manager),
    );
    let cors = create_cors_layer(&app_state.config.server.cors_allowed_origins);

    Router::new()
        .route(ApiUrls::HEALTH, get(health_check_simple))
        .route(ApiUrls::API_HEALTH, get(health_check))
        .merge(crate::users::configure_user_routes())
        .merge(crate::courses::configure_course_routes())
        .merge(crate::lessons::configure_lesson_routes())
        .merge(crate::quizzes::configure_quiz_routes())
        .merge(crate::assignments::configure_assignment_routes())
        .merge(crate::forums::configure_forum_routes())
        .merge(crate::achievements::configure_achievement_routes())
        .with_state(Arc::clone(&app_state))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&app_state.rbac_manager),
            rbac_middleware,
        ))
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
        .layer(CookieManagerLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_axum_server(app_state: Arc<AppState>) -> std::io::Result<()> {
    let addr = app_state.config.bind_address();
    let app = build_router(Arc::clone(&app_state));

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {} - is another instance running?", addr, e);
            return Err(e);
        }
    };

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(std::io::Error::other)
}
