//! Course discussion forums.

pub mod engine;
pub mod handlers;
pub mod types;

pub use engine::ForumEngine;
pub use handlers::configure_forum_routes;
