//! Authentication for the HTTP layer: caller identity, roles and capabilities,
//! and the middleware that turns a bearer token or cookie into an
//! [`AuthenticatedUser`].

pub mod config;
pub mod error;
pub mod middleware;
pub mod tests;
pub mod types;
pub mod utils;

pub use config::AuthConfig;
pub use error::AuthError;
pub use middleware::{auth_middleware, AuthMiddlewareState};
pub use types::{AuthenticatedUser, Permission, Role};
pub use utils::{authenticate_token, extract_token};
