use axum::http::{header, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<Method>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ],
            allowed_headers: vec![
                "Content-Type".to_string(),
                "Authorization".to_string(),
                "Accept".to_string(),
                "Origin".to_string(),
            ],
            allow_credentials: true,
            max_age_secs: 3600,
        }
    }
}

impl CorsConfig {
    pub fn with_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// An empty origin list accepts any well-formed http(s) origin.
    pub fn build(self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        let mut cors = if origins.is_empty() {
            CorsLayer::new().allow_origin(AllowOrigin::predicate(validate_origin))
        } else {
            info!("CORS configured with {} allowed origins", origins.len());
            CorsLayer::new().allow_origin(origins)
        };

        let headers: Vec<header::HeaderName> = self
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();

        cors = cors
            .allow_methods(self.allowed_methods)
            .allow_headers(headers)
            .max_age(Duration::from_secs(self.max_age_secs));

        if self.allow_credentials {
            cors = cors.allow_credentials(true);
        }

        cors
    }
}

fn validate_origin(origin: &HeaderValue, _request: &axum::http::request::Parts) -> bool {
    origin
        .to_str()
        .map(is_valid_origin_format)
        .unwrap_or(false)
}

fn is_valid_origin_format(origin: &str) -> bool {
    let Some(rest) = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
    else {
        return false;
    };

    if rest.is_empty() || rest.contains("//") || rest.contains("..") {
        return false;
    }

    let lower = rest.to_lowercase();
    !["<", ">", "%3c", "%3e", "javascript:", "\\"]
        .iter()
        .any(|p| lower.contains(p))
}

pub fn create_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    CorsConfig::default()
        .with_origins(allowed_origins.to_vec())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_format() {
        assert!(is_valid_origin_format("http://localhost:3000"));
        assert!(is_valid_origin_format("https://learn.example.com"));
        assert!(!is_valid_origin_format("ftp://example.com"));
        assert!(!is_valid_origin_format("https://"));
        assert!(!is_valid_origin_format("https://evil.com/<script>"));
        assert!(!is_valid_origin_format("https://a..b"));
    }

    #[test]
    fn test_default_config() {
        let config = CorsConfig::default();
        assert!(config.allow_credentials);
        assert!(config.allowed_methods.contains(&Method::PUT));
        assert!(config.allowed_origins.is_empty());
    }
}
