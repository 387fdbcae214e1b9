pub mod auth_api;
pub mod cors;
pub mod jwt;
pub mod password;
pub mod rbac_middleware;

pub use auth_api::{
    auth_middleware, extract_token, AuthConfig, AuthError, AuthMiddlewareState,
    AuthenticatedUser, Permission, Role,
};
pub use cors::{create_cors_layer, CorsConfig};
pub use jwt::{Claims, JwtConfig, JwtManager, TokenPair, TokenType};
pub use password::{hash_password, validate_password, verify_password, PasswordService};
pub use rbac_middleware::{
    build_default_route_permissions, rbac_middleware, AccessDecision, AccessDecisionResult,
    RbacConfig, RbacManager, RoutePermission,
};
