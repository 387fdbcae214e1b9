//! Accounts: registration, sign-in, token refresh and profile management.

pub mod engine;
pub mod handlers;
pub mod types;

pub use engine::UserEngine;
pub use handlers::configure_user_routes;
pub use types::{User, UserResponse};
