use chrono::Utc;
use diesel::prelude::*;
use log::info;
use uuid::Uuid;

use super::types::*;
use crate::core::shared::schema::{lesson_completions, lessons};
use crate::core::shared::utils::{nullable_change, require_non_empty};
use crate::core::shared::{run_blocking, ApiError, ApiResult, DbPool};
use crate::courses::access::{course_id_for_lesson, course_id_for_module, require_access, require_enrollment, require_owner};
use crate::courses::progress::{recalculate_course, recalculate_progress};
use crate::security::AuthenticatedUser;

fn load_lesson(conn: &mut PgConnection, lesson_id: Uuid) -> ApiResult<Lesson> {
    lessons::table
        .find(lesson_id)
        .select(Lesson::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Lesson"))
}

pub struct LessonEngine {
    db: DbPool,
}

impl LessonEngine {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// New lessons go to the end of their module and lower everyone's percentage.
    pub async fn create_lesson(&self, user: AuthenticatedUser, req: CreateLessonRequest) -> ApiResult<Lesson> {
        require_non_empty("title", &req.title)?;
        let content_type = req.content_type.unwrap_or_else(|| "text".to_string());
        validate_content_type(&content_type)?;
        let duration_minutes = req.duration_minutes.unwrap_or(0);
        validate_duration(duration_minutes)?;

        let lesson = run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_module(conn, req.module_id)?;
            require_owner(conn, &user, course_id)?;

            conn.transaction::<_, ApiError, _>(|conn| {
                let max_order: Option<i32> = lessons::table
                    .filter(lessons::module_id.eq(req.module_id))
                    .select(diesel::dsl::max(lessons::lesson_order))
                    .first(conn)?;

                let now = Utc::now();
                let lesson = Lesson {
                    id: Uuid::new_v4(),
                    module_id: req.module_id,
                    title: req.title.trim().to_string(),
                    content: req.content,
                    content_type,
                    video_url: req.video_url,
                    duration_minutes,
                    lesson_order: max_order.unwrap_or(0) + 1,
                    created_at: now,
                    updated_at: now,
                };

                diesel::insert_into(lessons::table).values(&lesson).execute(conn)?;
                recalculate_course(conn, course_id)?;
                Ok(lesson)
            })
        })
        .await?;

        info!("Lesson {} created in module {}", lesson.id, lesson.module_id);
        Ok(lesson)
    }

    pub async fn get_lesson(&self, user: AuthenticatedUser, lesson_id: Uuid) -> ApiResult<Lesson> {
        run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_lesson(conn, lesson_id)?;
            require_access(conn, &user, course_id)?;
            load_lesson(conn, lesson_id)
        })
        .await
    }

    pub async fn update_lesson(
        &self,
        user: AuthenticatedUser,
        lesson_id: Uuid,
        req: UpdateLessonRequest,
    ) -> ApiResult<Lesson> {
        if let Some(title) = &req.title {
            require_non_empty("title", title)?;
        }
        if let Some(content_type) = &req.content_type {
            validate_content_type(content_type)?;
        }
        if let Some(minutes) = req.duration_minutes {
            validate_duration(minutes)?;
        }

        run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_lesson(conn, lesson_id)?;
            require_owner(conn, &user, course_id)?;

            let changes = LessonChangeset {
                title: req.title.map(|t| t.trim().to_string()),
                content: req.content,
                content_type: req.content_type,
                video_url: nullable_change(req.video_url, req.clear_video_url),
                duration_minutes: req.duration_minutes,
                updated_at: Some(Utc::now()),
            };

            Ok(diesel::update(lessons::table.find(lesson_id))
                .set(&changes)
                .returning(Lesson::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn delete_lesson(&self, user: AuthenticatedUser, lesson_id: Uuid) -> ApiResult<()> {
        run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_lesson(conn, lesson_id)?;
            require_owner(conn, &user, course_id)?;

            conn.transaction::<_, ApiError, _>(|conn| {
                diesel::delete(lessons::table.find(lesson_id)).execute(conn)?;
                recalculate_course(conn, course_id)?;
                Ok(())
            })
        })
        .await?;

        info!("Lesson {lesson_id} deleted");
        Ok(())
    }

    /// Marks a lesson done for an enrolled user. Completing twice is harmless.
    pub async fn complete_lesson(&self, user_id: Uuid, lesson_id: Uuid) -> ApiResult<LessonCompletionResponse> {
        run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_lesson(conn, lesson_id)?;
            require_enrollment(conn, user_id, course_id)?;

            conn.transaction::<_, ApiError, _>(|conn| {
                let completion = LessonCompletion {
                    id: Uuid::new_v4(),
                    user_id,
                    lesson_id,
                    completed_at: Utc::now(),
                };
                diesel::insert_into(lesson_completions::table)
                    .values(&completion)
                    .on_conflict((lesson_completions::user_id, lesson_completions::lesson_id))
                    .do_nothing()
                    .execute(conn)?;

                let progress = recalculate_progress(conn, user_id, course_id)?
                    .ok_or_else(|| ApiError::forbidden("You must be enrolled in this course"))?;

                Ok(LessonCompletionResponse {
                    lesson_id,
                    course_id,
                    progress_percentage: progress.progress_percentage,
                    completed: progress.completed,
                })
            })
        })
        .await
    }
}
