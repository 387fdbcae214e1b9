pub mod engine;
pub mod handlers;
pub mod types;

pub use engine::LessonEngine;
pub use handlers::configure_lesson_routes;
pub use types::Lesson;
