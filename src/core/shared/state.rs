use crate::core::config::AppConfig;
use crate::core::shared::utils::DbPool;
use crate::security::{AuthConfig, JwtManager, RbacManager};
use std::sync::Arc;

/// Shared handles injected into every handler. Holds no per-request state.
#[derive(Clone)]
pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
    pub auth_config: Arc<AuthConfig>,
    pub jwt_manager: Arc<JwtManager>,
    pub rbac_manager: Arc<RbacManager>,
}

impl AppState {
    pub fn new(
        conn: DbPool,
        config: AppConfig,
        auth_config: AuthConfig,
        jwt_manager: JwtManager,
        rbac_manager: RbacManager,
    ) -> Self {
        Self {
            conn,
            config,
            auth_config: Arc::new(auth_config),
            jwt_manager: Arc::new(jwt_manager),
            rbac_manager: Arc::new(rbac_manager),
        }
    }
}
