use axum::http::{header, HeaderMap};
use jsonwebtoken::errors::ErrorKind;
use tracing::debug;

use super::{config::AuthConfig, error::AuthError, types::AuthenticatedUser, types::Role};
use crate::security::jwt::JwtManager;

/// Bearer header first, then the auth cookie.
pub fn extract_token(headers: &HeaderMap, config: &AuthConfig) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix(&config.bearer_prefix))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    from_header.or_else(|| extract_cookie(headers, &config.cookie_name))
}

pub fn extract_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            (name == cookie_name && !value.is_empty()).then(|| value.to_string())
        })
}

pub fn is_jwt_format(token: &str) -> bool {
    let parts: Vec<&str> = token.split('.').collect();
    parts.len() == 3 && parts.iter().all(|p| !p.is_empty())
}

pub async fn authenticate_token(
    token: &str,
    jwt_manager: &JwtManager,
) -> Result<AuthenticatedUser, AuthError> {
    if !is_jwt_format(token) {
        return Err(AuthError::InvalidToken);
    }

    let claims = jwt_manager.validate_access_token(token).map_err(|e| {
        debug!("Access token rejected: {e:#}");
        match e
            .downcast_ref::<jsonwebtoken::errors::Error>()
            .map(|err| err.kind())
        {
            Some(ErrorKind::ExpiredSignature) => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        }
    })?;

    if jwt_manager.is_revoked(&claims.jti).await {
        return Err(AuthError::RevokedToken);
    }

    let user_id = claims.user_id().map_err(|_| AuthError::InvalidToken)?;
    let role = claims
        .role
        .as_deref()
        .and_then(|r| r.parse::<Role>().ok())
        .filter(Role::is_assignable)
        .ok_or(AuthError::InvalidToken)?;

    let mut user = AuthenticatedUser::new(user_id, role);
    if let Some(email) = claims.email {
        user = user.with_email(email);
    }
    Ok(user)
}
