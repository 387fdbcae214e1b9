//! Pure rules for deadlines and grading, kept free of I/O.

use chrono::{DateTime, Utc};

use crate::core::shared::{ApiError, ApiResult};

pub const DEFAULT_MAX_POINTS: i32 = 100;

/// A submission made exactly at the deadline is still on time.
pub fn submission_window_open(due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    due_date.map_or(true, |due| now <= due)
}

pub fn validate_max_points(max_points: i32) -> ApiResult<()> {
    if max_points <= 0 {
        return Err(ApiError::validation("max_points must be greater than zero"));
    }
    Ok(())
}

pub fn validate_grade(grade: i32, max_points: i32) -> ApiResult<()> {
    if !(0..=max_points).contains(&grade) {
        return Err(ApiError::validation(format!(
            "grade must be between 0 and {max_points}"
        )));
    }
    Ok(())
}

pub fn validate_submission_body(content: Option<&str>, attachment_url: Option<&str>) -> ApiResult<()> {
    let has_content = content.is_some_and(|c| !c.trim().is_empty());
    let has_attachment = attachment_url.is_some_and(|u| !u.trim().is_empty());
    if !has_content && !has_attachment {
        return Err(ApiError::validation(
            "A submission needs content or an attachment_url",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_window_without_deadline_is_open() {
        assert!(submission_window_open(None, Utc::now()));
    }

    #[test]
    fn test_window_boundaries() {
        let due = Utc::now();
        assert!(submission_window_open(Some(due), due));
        assert!(submission_window_open(Some(due), due - Duration::minutes(1)));
        assert!(!submission_window_open(Some(due), due + Duration::seconds(1)));
    }

    #[test]
    fn test_grade_bounds() {
        assert!(validate_grade(0, 100).is_ok());
        assert!(validate_grade(100, 100).is_ok());
        assert!(matches!(validate_grade(101, 100), Err(ApiError::Validation(_))));
        assert!(validate_grade(-1, 100).is_err());
    }

    #[test]
    fn test_max_points() {
        assert!(validate_max_points(DEFAULT_MAX_POINTS).is_ok());
        assert!(validate_max_points(0).is_err());
    }

    #[test]
    fn test_submission_needs_something() {
        assert!(validate_submission_body(Some("essay"), None).is_ok());
        assert!(validate_submission_body(None, Some("https://files/x.pdf")).is_ok());
        assert!(validate_submission_body(Some("  "), None).is_err());
        assert!(validate_submission_body(None, None).is_err());
    }
}
