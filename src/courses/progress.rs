use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::types::Progress;
use crate::core::shared::schema::{course_modules, lesson_completions, lessons, progress};
use crate::core::shared::utils::percentage;
use crate::core::shared::ApiResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub percentage: i32,
    pub completed: bool,
}

impl ProgressSnapshot {
    /// A course with no lessons is never complete.
    pub fn compute(completed_lessons: i64, total_lessons: i64) -> Self {
        Self {
            percentage: percentage(completed_lessons.min(total_lessons), total_lessons),
            completed: total_lessons > 0 && completed_lessons >= total_lessons,
        }
    }

    /// Keeps the first completion time while the course stays complete.
    pub fn completed_at(
        &self,
        previous: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        if self.completed {
            previous.or(Some(now))
        } else {
            None
        }
    }
}

pub fn count_course_lessons(conn: &mut PgConnection, course_id: Uuid) -> QueryResult<i64> {
    lessons::table
        .inner_join(course_modules::table)
        .filter(course_modules::course_id.eq(course_id))
        .count()
        .get_result(conn)
}

pub fn count_completed_lessons(
    conn: &mut PgConnection,
    user_id: Uuid,
    course_id: Uuid,
) -> QueryResult<i64> {
    lesson_completions::table
        .inner_join(lessons::table.inner_join(course_modules::table))
        .filter(lesson_completions::user_id.eq(user_id))
        .filter(course_modules::course_id.eq(course_id))
        .count()
        .get_result(conn)
}

/// Recomputes one enrollment from its lesson completions. Returns `None` when not enrolled.
pub fn recalculate_progress(
    conn: &mut PgConnection,
    user_id: Uuid,
    course_id: Uuid,
) -> ApiResult<Option<Progress>> {
    let existing: Option<Progress> = progress::table
        .filter(progress::user_id.eq(user_id))
        .filter(progress::course_id.eq(course_id))
        .select(Progress::as_select())
        .first(conn)
        .optional()?;

    let Some(existing) = existing else {
        return Ok(None);
    };

    let total = count_course_lessons(conn, course_id)?;
    let done = count_completed_lessons(conn, user_id, course_id)?;
    let snapshot = ProgressSnapshot::compute(done, total);
    let now = Utc::now();

    let updated = diesel::update(progress::table.find(existing.id))
        .set((
            progress::progress_percentage.eq(snapshot.percentage),
            progress::completed.eq(snapshot.completed),
            progress::completed_at.eq(snapshot.completed_at(existing.completed_at, now)),
            progress::updated_at.eq(now),
        ))
        .returning(Progress::as_returning())
        .get_result(conn)?;

    Ok(Some(updated))
}

/// Lesson totals changed, so every enrollment in the course is stale.
pub fn recalculate_course(conn: &mut PgConnection, course_id: Uuid) -> ApiResult<usize> {
    let user_ids: Vec<Uuid> = progress::table
        .filter(progress::course_id.eq(course_id))
        .select(progress::user_id)
        .load(conn)?;

    for user_id in &user_ids {
        recalculate_progress(conn, *user_id, course_id)?;
    }
    Ok(user_ids.len())
}

pub fn touch_progress(conn: &mut PgConnection, user_id: Uuid, course_id: Uuid) -> QueryResult<usize> {
    diesel::update(
        progress::table
            .filter(progress::user_id.eq(user_id))
            .filter(progress::course_id.eq(course_id)),
    )
    .set(progress::updated_at.eq(Utc::now()))
    .execute(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_snapshot_percentages() {
        assert_eq!(ProgressSnapshot::compute(0, 4).percentage, 0);
        assert_eq!(ProgressSnapshot::compute(1, 3).percentage, 33);
        assert_eq!(ProgressSnapshot::compute(2, 3).percentage, 67);
        assert_eq!(ProgressSnapshot::compute(1, 8).percentage, 13);
    }

    #[test]
    fn test_completed_only_when_all_lessons_done() {
        assert!(!ProgressSnapshot::compute(2, 3).completed);
        assert!(ProgressSnapshot::compute(3, 3).completed);
        assert_eq!(ProgressSnapshot::compute(3, 3).percentage, 100);
    }

    #[test]
    fn test_empty_course_is_not_complete() {
        let snapshot = ProgressSnapshot::compute(0, 0);
        assert_eq!(snapshot.percentage, 0);
        assert!(!snapshot.completed);
    }

    #[test]
    fn test_completed_at_is_kept() {
        let now = Utc::now();
        let earlier = now - Duration::days(3);
        let done = ProgressSnapshot::compute(2, 2);

        assert_eq!(done.completed_at(None, now), Some(now));
        assert_eq!(done.completed_at(Some(earlier), now), Some(earlier));
        assert_eq!(ProgressSnapshot::compute(1, 2).completed_at(Some(earlier), now), None);
    }
}
