use super::{
    config::AuthConfig,
    types::AuthenticatedUser,
    utils::{authenticate_token, extract_token},
};
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::security::jwt::JwtManager;

#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub config: Arc<AuthConfig>,
    pub jwt_manager: Arc<JwtManager>,
}

impl AuthMiddlewareState {
    pub fn new(config: Arc<AuthConfig>, jwt_manager: Arc<JwtManager>) -> Self {
        Self {
            config,
            jwt_manager,
        }
    }
}

/// Resolves the caller and stores an [`AuthenticatedUser`] in request extensions.
/// No credentials means anonymous; bad credentials are rejected with 401.
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if state.config.is_anonymous_allowed(&path) {
        request
            .extensions_mut()
            .insert(AuthenticatedUser::anonymous());
        return next.run(request).await;
    }

    let Some(token) = extract_token(request.headers(), &state.config) else {
        request
            .extensions_mut()
            .insert(AuthenticatedUser::anonymous());
        return next.run(request).await;
    };

    match authenticate_token(&token, &state.jwt_manager).await {
        Ok(user) => {
            debug!("Authenticated user={} role={}", user.user_id, user.role);
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            info!("Rejected credentials for {} {}: {:?}", request.method(), path, e);
            e.into_response()
        }
    }
}
