//! Quizzes: authoring, gated reading, scored submissions and attempt history.

pub mod engine;
pub mod grading;
pub mod handlers;
pub mod types;

pub use engine::QuizEngine;
pub use grading::{grade_quiz, GradeReport};
pub use handlers::configure_quiz_routes;
