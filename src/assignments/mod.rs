//! Assignments: authoring, deadline-bound submissions with resubmission, and grading.

pub mod engine;
pub mod handlers;
pub mod policy;
pub mod types;

pub use engine::AssignmentEngine;
pub use handlers::configure_assignment_routes;
