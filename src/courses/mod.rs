//! Course catalog, module structure, enrollment and the content gate.
//!
//! - access: ownership and enrollment checks used by every content module
//! - progress: lesson-completion based progress tracking
//! - reorder: nested module/item reordering
//! - engine / handlers: data access and HTTP routes

pub mod access;
pub mod engine;
pub mod handlers;
pub mod progress;
pub mod reorder;
pub mod types;

pub use engine::CourseEngine;
pub use handlers::configure_course_routes;
pub use types::{Course, CourseModule, Progress};
