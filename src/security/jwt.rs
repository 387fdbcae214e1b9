use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::config::JwtSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
    pub leeway_seconds: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            issuer: "learnova".into(),
            audience: "learnova-api".into(),
            access_token_expiry_minutes: 60,
            refresh_token_expiry_days: 7,
            leeway_seconds: 30,
        }
    }
}

impl From<&JwtSettings> for JwtConfig {
    fn from(settings: &JwtSettings) -> Self {
        Self {
            issuer: settings.issuer.clone(),
            access_token_expiry_minutes: settings.access_token_expiry_minutes,
            refresh_token_expiry_days: settings.refresh_token_expiry_days,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
    pub jti: String,
    #[serde(rename = "type")]
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Claims {
    pub fn new(
        user_id: Uuid,
        issuer: &str,
        audience: &str,
        token_type: TokenType,
        expiry: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            exp: expiry.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.as_str().to_string(),
            email: None,
            role: None,
        }
    }

    pub fn with_email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }

    pub fn with_role(mut self, role: String) -> Self {
        self.role = Some(role);
        self
    }

    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|e| anyhow!("Invalid user ID in claims: {e}"))
    }

    pub fn is_access_token(&self) -> bool {
        self.token_type == TokenType::Access.as_str()
    }

    pub fn is_refresh_token(&self) -> bool {
        self.token_type == TokenType::Refresh.as_str()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
}

/// Issues and validates HS256 tokens. Revoked token ids are kept until their own expiry.
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    revoked: Arc<RwLock<HashMap<String, i64>>>,
}

impl JwtManager {
    pub fn new(config: JwtConfig, secret: &str) -> Result<Self> {
        if secret.len() < 32 {
            return Err(anyhow!("JWT secret must be at least 32 characters"));
        }

        Ok(Self {
            config,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            revoked: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn from_secret(secret: &str) -> Result<Self> {
        Self::new(JwtConfig::default(), secret)
    }

    pub fn from_settings(settings: &JwtSettings) -> Result<Self> {
        Self::new(JwtConfig::from(settings), &settings.secret)
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| anyhow!("Failed to encode {} token: {e}", claims.token_type))
    }

    pub fn generate_token_pair(&self, user_id: Uuid, email: &str, role: &str) -> Result<TokenPair> {
        let now = Utc::now();
        let access_expiry = now + Duration::minutes(self.config.access_token_expiry_minutes);
        let refresh_expiry = now + Duration::days(self.config.refresh_token_expiry_days);

        let access_claims = Claims::new(
            user_id,
            &self.config.issuer,
            &self.config.audience,
            TokenType::Access,
            access_expiry,
        )
        .with_email(email.to_string())
        .with_role(role.to_string());

        let refresh_claims = Claims::new(
            user_id,
            &self.config.issuer,
            &self.config.audience,
            TokenType::Refresh,
            refresh_expiry,
        );

        Ok(TokenPair {
            access_token: self.encode_claims(&access_claims)?,
            refresh_token: self.encode_claims(&refresh_claims)?,
            token_type: "Bearer".into(),
            expires_in: self.config.access_token_expiry_minutes * 60,
            refresh_expires_in: self.config.refresh_token_expiry_days * 24 * 60 * 60,
        })
    }

    /// Signature, issuer, audience and expiry check. The underlying
    /// `jsonwebtoken` error stays downcastable from the returned error.
    pub fn validate_token(&self, token: &str) -> Result<TokenData<Claims>> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.leeway = self.config.leeway_seconds;

        decode::<Claims>(token, &self.decoding_key, &validation).context("Token validation failed")
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        let token_data = self.validate_token(token)?;

        if !token_data.claims.is_access_token() {
            return Err(anyhow!("Token is not an access token"));
        }

        Ok(token_data.claims)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        let token_data = self.validate_token(token)?;

        if !token_data.claims.is_refresh_token() {
            return Err(anyhow!("Token is not a refresh token"));
        }

        Ok(token_data.claims)
    }

    /// Validates a refresh token and revokes it so it cannot be replayed.
    /// Callers issue the new pair from fresh user data.
    pub async fn consume_refresh_token(&self, refresh_token: &str) -> Result<Uuid> {
        let claims = self.validate_refresh_token(refresh_token)?;

        if self.is_revoked(&claims.jti).await {
            return Err(anyhow!("Refresh token has been revoked"));
        }

        self.revoke(&claims).await;
        let user_id = claims.user_id()?;
        debug!("Consumed refresh token for user {user_id}");
        Ok(user_id)
    }

    pub async fn revoke(&self, claims: &Claims) {
        let now = Utc::now().timestamp();
        let mut revoked = self.revoked.write().await;

        let before = revoked.len();
        revoked.retain(|_, exp| *exp > now);
        let pruned = before - revoked.len();
        if pruned > 0 {
            info!("Pruned {pruned} expired entries from token revocation list");
        }

        revoked.insert(claims.jti.clone(), claims.exp);
        debug!("Revoked token {}", claims.jti);
    }

    pub async fn revoke_by_token(&self, token: &str) -> Result<()> {
        let token_data = self.validate_token(token)?;
        self.revoke(&token_data.claims).await;
        Ok(())
    }

    pub async fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.read().await.contains_key(jti)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_manager() -> JwtManager {
        JwtManager::from_secret("this-is-a-very-long-secret-key-for-testing-purposes-only")
            .expect("Failed to create manager")
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(JwtManager::from_secret("short").is_err());
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let manager = create_test_manager();
        let user_id = Uuid::new_v4();

        let pair = manager
            .generate_token_pair(user_id, "ada@example.com", "instructor")
            .expect("Failed to generate");
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 3600);

        let claims = manager
            .validate_access_token(&pair.access_token)
            .expect("Validation failed");
        assert_eq!(claims.user_id().expect("Invalid user ID"), user_id);
        assert_eq!(claims.email.as_deref(), Some("ada@example.com"));
        assert_eq!(claims.role.as_deref(), Some("instructor"));
    }

    #[test]
    fn test_refresh_token_carries_no_role() {
        let manager = create_test_manager();
        let pair = manager
            .generate_token_pair(Uuid::new_v4(), "a@b.c", "student")
            .expect("Failed to generate");

        let claims = manager
            .validate_refresh_token(&pair.refresh_token)
            .expect("Validation failed");
        assert!(claims.role.is_none());
    }

    #[test]
    fn test_wrong_token_type() {
        let manager = create_test_manager();
        let pair = manager
            .generate_token_pair(Uuid::new_v4(), "a@b.c", "student")
            .expect("Failed to generate");

        assert!(manager.validate_refresh_token(&pair.access_token).is_err());
        assert!(manager.validate_access_token(&pair.refresh_token).is_err());
    }

    #[test]
    fn test_invalid_token() {
        let manager = create_test_manager();
        assert!(manager.validate_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let manager = create_test_manager();
        let other = JwtManager::from_secret("another-secret-that-is-also-long-enough-to-use")
            .expect("Failed to create manager");
        let pair = other
            .generate_token_pair(Uuid::new_v4(), "a@b.c", "student")
            .expect("Failed to generate");

        assert!(manager.validate_access_token(&pair.access_token).is_err());
    }

    #[test]
    fn test_expired_token_error_is_downcastable() {
        let manager = create_test_manager();
        let claims = Claims::new(
            Uuid::new_v4(),
            "learnova",
            "learnova-api",
            TokenType::Access,
            Utc::now() - Duration::hours(2),
        );
        let token = manager.encode_claims(&claims).expect("encode");

        let err = manager.validate_token(&token).expect_err("should be expired");
        let kind = err
            .downcast_ref::<jsonwebtoken::errors::Error>()
            .map(|e| e.kind());
        assert!(matches!(
            kind,
            Some(jsonwebtoken::errors::ErrorKind::ExpiredSignature)
        ));
    }

    #[tokio::test]
    async fn test_revoke_by_token() {
        let manager = create_test_manager();
        let pair = manager
            .generate_token_pair(Uuid::new_v4(), "a@b.c", "student")
            .expect("Failed to generate");

        manager
            .revoke_by_token(&pair.access_token)
            .await
            .expect("Revoke failed");

        let claims = manager
            .validate_access_token(&pair.access_token)
            .expect("still well-formed");
        assert!(manager.is_revoked(&claims.jti).await);
    }

    #[tokio::test]
    async fn test_refresh_token_is_single_use() {
        let manager = create_test_manager();
        let user_id = Uuid::new_v4();
        let pair = manager
            .generate_token_pair(user_id, "a@b.c", "student")
            .expect("Failed to generate");

        let consumed = manager
            .consume_refresh_token(&pair.refresh_token)
            .await
            .expect("first use");
        assert_eq!(consumed, user_id);

        assert!(manager.consume_refresh_token(&pair.refresh_token).await.is_err());
    }


    #[test]
    fn test_token_type() {
        assert_eq!(TokenType::Access.as_str(), "access");
        assert_eq!(TokenType::Refresh.as_str(), "refresh");
    }
}
