//! Achievement badges derived from completed courses.

pub mod badges;
pub mod engine;
pub mod handlers;

pub use badges::{derive_badges, AchievementSummary, Badge};
pub use engine::AchievementEngine;
pub use handlers::configure_achievement_routes;
