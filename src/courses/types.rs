use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assignments::types::Assignment;
use crate::core::shared::schema::{course_modules, courses, progress};
use crate::core::shared::ApiError;
use crate::lessons::types::Lesson;
use crate::quizzes::types::Quiz;

pub const COURSE_LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = courses)]
pub struct Course {
    pub id: Uuid,
    pub instructor_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub level: String,
    pub price_cents: i32,
    pub cover_image_url: Option<String>,
    pub preview_video_url: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = courses)]
pub struct CourseChangeset {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub price_cents: Option<i32>,
    pub cover_image_url: Option<String>,
    pub preview_video_url: Option<String>,
    pub is_published: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = course_modules)]
pub struct CourseModule {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub module_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = course_modules)]
pub struct ModuleChangeset {
    pub title: Option<String>,
    pub description: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Enrollment record. One row per (user, course).
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = progress)]
pub struct Progress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub progress_percentage: i32,
    pub completed: bool,
    pub enrolled_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub price_cents: Option<i32>,
    pub cover_image_url: Option<String>,
    pub preview_video_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub price_cents: Option<i32>,
    pub cover_image_url: Option<String>,
    pub preview_video_url: Option<String>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseFilters {
    pub category: Option<String>,
    pub level: Option<String>,
    pub instructor_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateModuleRequest {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateModuleRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Lesson,
    Quiz,
    Assignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub kind: ContentKind,
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModulePlan {
    pub id: Uuid,
    #[serde(default)]
    pub items: Vec<ItemRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub modules: Vec<ModulePlan>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseListResponse {
    pub courses: Vec<Course>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleOutline {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub module_order: i32,
    pub lesson_count: usize,
    pub quiz_count: usize,
    pub assignment_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub modules: Vec<ModuleOutline>,
    pub enrolled_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleContent {
    #[serde(flatten)]
    pub module: CourseModule,
    pub lessons: Vec<Lesson>,
    pub quizzes: Vec<Quiz>,
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseContent {
    pub course: Course,
    pub modules: Vec<ModuleContent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentStatus {
    pub enrolled: bool,
    pub progress: Option<Progress>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentProgress {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub progress_percentage: i32,
    pub completed: bool,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentSummary {
    pub course: Course,
    pub progress_percentage: i32,
    pub completed: bool,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

pub fn validate_level(level: &str) -> Result<(), ApiError> {
    if COURSE_LEVELS.contains(&level) {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "level must be one of: {}",
            COURSE_LEVELS.join(", ")
        )))
    }
}

pub fn validate_price(price_cents: i32) -> Result<(), ApiError> {
    if price_cents < 0 {
        return Err(ApiError::validation("price_cents must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert!(validate_level("beginner").is_ok());
        assert!(validate_level("advanced").is_ok());
        assert!(validate_level("expert").is_err());
    }

    #[test]
    fn test_price() {
        assert!(validate_price(0).is_ok());
        assert!(validate_price(-1).is_err());
    }

    #[test]
    fn test_reorder_request_parses() {
        let raw = serde_json::json!({
            "modules": [
                {"id": "6f1c5b8e-9a51-4a55-9d1e-2b7c3f8e0a11", "items": [
                    {"kind": "lesson", "id": "0b6f3f4e-2f53-4c53-9c8a-1d4b1d7f2a22"},
                    {"kind": "quiz", "id": "1c7a4a5f-3a64-4d64-8d9b-2e5c2e8a3b33"}
                ]},
                {"id": "7a2d6c9f-ab62-4b66-8e2f-3c8d4a9f1b44"}
            ]
        });
        let plan: ReorderRequest = serde_json::from_value(raw).expect("parse");
        assert_eq!(plan.modules.len(), 2);
        assert_eq!(plan.modules[0].items[1].kind, ContentKind::Quiz);
        assert!(plan.modules[1].items.is_empty());
    }
}
