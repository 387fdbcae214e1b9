use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;

use learnova::core::config::AppConfig;
use learnova::core::shared::state::AppState;
use learnova::core::shared::utils::{create_conn, run_migrations};
use learnova::main_module::run_axum_server;
use learnova::security::{AuthConfig, JwtManager, RbacManager};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Invalid configuration: {e:#}");
        std::io::Error::other(e.to_string())
    })?;

    let pool = create_conn(&config.database.url, config.database.pool_size).map_err(|e| {
        error!("Failed to create database pool: {e}");
        std::io::Error::other(e)
    })?;

    run_migrations(&pool).map_err(|e| {
        error!("Failed to run migrations: {e}");
        std::io::Error::other(e)
    })?;
    info!("Database migrations applied");

    let jwt_manager = JwtManager::from_settings(&config.jwt).map_err(|e| {
        error!("Failed to initialize JWT Manager: {e:#}");
        std::io::Error::other(e.to_string())
    })?;

    let rbac_manager = RbacManager::with_default_routes().await;
    info!(
        "RBAC Manager initialized with {} route permissions",
        rbac_manager.route_count().await
    );

    let app_state = Arc::new(AppState::new(
        pool,
        config,
        AuthConfig::from_env(),
        jwt_manager,
        rbac_manager,
    ));

    run_axum_server(app_state).await
}
