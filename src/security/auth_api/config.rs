#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub bearer_prefix: String,
    pub cookie_name: String,
    pub cookie_secure: bool,
    /// Paths where credentials are ignored entirely, so a stale cookie cannot block login.
    pub allow_anonymous_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bearer_prefix: "Bearer ".to_string(),
            cookie_name: "learnova_token".to_string(),
            cookie_secure: false,
            allow_anonymous_paths: vec![
                "/health".to_string(),
                "/api/health".to_string(),
                "/api/users/register".to_string(),
                "/api/users/login".to_string(),
                "/api/users/refresh".to_string(),
            ],
        }
    }
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("AUTH_COOKIE_NAME") {
            if !name.trim().is_empty() {
                config.cookie_name = name.trim().to_string();
            }
        }

        if let Ok(secure) = std::env::var("AUTH_COOKIE_SECURE") {
            config.cookie_secure = secure == "true" || secure == "1";
        }

        config
    }

    pub fn is_anonymous_allowed(&self, path: &str) -> bool {
        self.allow_anonymous_paths
            .iter()
            .any(|allowed| path == allowed || path.starts_with(&format!("{allowed}/")))
    }
}
