use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::shared::schema::{lesson_completions, lessons};
use crate::core::shared::ApiError;

pub const CONTENT_TYPES: [&str; 3] = ["text", "video", "document"];

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = lessons)]
pub struct Lesson {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub content_type: String,
    pub video_url: Option<String>,
    pub duration_minutes: i32,
    pub lesson_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = lessons)]
pub struct LessonChangeset {
    pub title: Option<String>,
    pub content: Option<String>,
    pub content_type: Option<String>,
    pub video_url: Option<Option<String>>,
    pub duration_minutes: Option<i32>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = lesson_completions)]
pub struct LessonCompletion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLessonRequest {
    pub module_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub content_type: Option<String>,
    pub video_url: Option<String>,
    pub duration_minutes: Option<i32>,
}

/// `clear_video_url` removes the video link; `video_url` sets a new one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLessonRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub content_type: Option<String>,
    pub video_url: Option<String>,
    #[serde(default)]
    pub clear_video_url: bool,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonCompletionResponse {
    pub lesson_id: Uuid,
    pub course_id: Uuid,
    pub progress_percentage: i32,
    pub completed: bool,
}

pub fn validate_content_type(content_type: &str) -> Result<(), ApiError> {
    if CONTENT_TYPES.contains(&content_type) {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "content_type must be one of: {}",
            CONTENT_TYPES.join(", ")
        )))
    }
}

pub fn validate_duration(minutes: i32) -> Result<(), ApiError> {
    if minutes < 0 {
        return Err(ApiError::validation("duration_minutes must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert!(validate_content_type("video").is_ok());
        assert!(validate_content_type("document").is_ok());
        assert!(validate_content_type("Video").is_err());
        assert!(validate_content_type("podcast").is_err());
    }

    #[test]
    fn test_duration() {
        assert!(validate_duration(0).is_ok());
        assert!(validate_duration(-5).is_err());
    }
}
