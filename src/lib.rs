pub mod achievements;
pub mod assignments;
pub mod core;
pub mod courses;
pub mod forums;
pub mod lessons;
pub mod main_module;
pub mod quizzes;
pub mod security;
pub mod users;
