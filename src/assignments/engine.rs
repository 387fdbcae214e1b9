use chrono::Utc;
use diesel::prelude::*;
use log::info;
use uuid::Uuid;

use super::policy::{
    submission_window_open, validate_grade, validate_max_points, validate_submission_body,
    DEFAULT_MAX_POINTS,
};
use super::types::*;
use crate::core::shared::schema::{assignments, submissions, users};
use crate::core::shared::utils::{nullable_change, require_non_empty};
use crate::core::shared::{run_blocking, ApiError, ApiResult, DbPool};
use crate::courses::access::{
    course_id_for_assignment, course_id_for_module, require_access, require_enrollment,
    require_owner,
};
use crate::courses::progress::touch_progress;
use crate::security::AuthenticatedUser;

fn load_assignment(conn: &mut PgConnection, assignment_id: Uuid) -> ApiResult<Assignment> {
    assignments::table
        .find(assignment_id)
        .select(Assignment::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Assignment"))
}

fn load_submission(conn: &mut PgConnection, submission_id: Uuid) -> ApiResult<Submission> {
    submissions::table
        .find(submission_id)
        .select(Submission::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Submission"))
}

pub struct AssignmentEngine {
    db: DbPool,
}

impl AssignmentEngine {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn create_assignment(
        &self,
        user: AuthenticatedUser,
        req: CreateAssignmentRequest,
    ) -> ApiResult<AssignmentDetail> {
        require_non_empty("title", &req.title)?;
        let max_points = req.max_points.unwrap_or(DEFAULT_MAX_POINTS);
        validate_max_points(max_points)?;

        let detail = run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_module(conn, req.module_id)?;
            require_owner(conn, &user, course_id)?;

            let max_order: Option<i32> = assignments::table
                .filter(assignments::module_id.eq(req.module_id))
                .select(diesel::dsl::max(assignments::assignment_order))
                .first(conn)?;

            let now = Utc::now();
            let assignment = Assignment {
                id: Uuid::new_v4(),
                module_id: req.module_id,
                title: req.title.trim().to_string(),
                description: req.description,
                due_date: req.due_date,
                max_points,
                assignment_order: max_order.unwrap_or(0) + 1,
                created_at: now,
                updated_at: now,
            };
            diesel::insert_into(assignments::table)
                .values(&assignment)
                .execute(conn)?;

            Ok(AssignmentDetail {
                assignment,
                course_id,
            })
        })
        .await?;

        info!("Assignment {} created", detail.assignment.id);
        Ok(detail)
    }

    pub async fn get_assignment(
        &self,
        user: AuthenticatedUser,
        assignment_id: Uuid,
    ) -> ApiResult<AssignmentDetail> {
        run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_assignment(conn, assignment_id)?;
            require_access(conn, &user, course_id)?;
            Ok(AssignmentDetail {
                assignment: load_assignment(conn, assignment_id)?,
                course_id,
            })
        })
        .await
    }

    pub async fn update_assignment(
        &self,
        user: AuthenticatedUser,
        assignment_id: Uuid,
        req: UpdateAssignmentRequest,
    ) -> ApiResult<AssignmentDetail> {
        if let Some(title) = &req.title {
            require_non_empty("title", title)?;
        }
        if let Some(points) = req.max_points {
            validate_max_points(points)?;
        }

        run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_assignment(conn, assignment_id)?;
            require_owner(conn, &user, course_id)?;

            let changes = AssignmentChangeset {
                title: req.title.map(|t| t.trim().to_string()),
                description: req.description,
                due_date: nullable_change(req.due_date, req.clear_due_date),
                max_points: req.max_points,
                updated_at: Some(Utc::now()),
            };

            let assignment = diesel::update(assignments::table.find(assignment_id))
                .set(&changes)
                .returning(Assignment::as_returning())
                .get_result(conn)?;
            Ok(AssignmentDetail {
                assignment,
                course_id,
            })
        })
        .await
    }

    pub async fn delete_assignment(&self, user: AuthenticatedUser, assignment_id: Uuid) -> ApiResult<()> {
        run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_assignment(conn, assignment_id)?;
            require_owner(conn, &user, course_id)?;
            diesel::delete(assignments::table.find(assignment_id)).execute(conn)?;
            Ok(())
        })
        .await?;

        info!("Assignment {assignment_id} deleted");
        Ok(())
    }

    /// Inserts the first submission or overwrites the previous one, resetting any grade.
    /// Rejected once the due date has passed.
    pub async fn submit(
        &self,
        user_id: Uuid,
        assignment_id: Uuid,
        req: SubmitAssignmentRequest,
    ) -> ApiResult<Submission> {
        validate_submission_body(req.content.as_deref(), req.attachment_url.as_deref())?;

        let submission = run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_assignment(conn, assignment_id)?;
            let assignment = load_assignment(conn, assignment_id)?;
            require_enrollment(conn, user_id, course_id)?;

            let now = Utc::now();
            if !submission_window_open(assignment.due_date, now) {
                return Err(ApiError::validation("The due date for this assignment has passed"));
            }

            conn.transaction::<_, ApiError, _>(|conn| {
                let fresh = Submission {
                    id: Uuid::new_v4(),
                    assignment_id,
                    user_id,
                    content: req.content.clone(),
                    attachment_url: req.attachment_url.clone(),
                    status: STATUS_SUBMITTED.to_string(),
                    grade: None,
                    feedback: None,
                    submitted_at: now,
                    graded_at: None,
                    graded_by: None,
                };
                let reset = ResubmissionChangeset {
                    content: req.content,
                    attachment_url: req.attachment_url,
                    status: STATUS_SUBMITTED.to_string(),
                    grade: None,
                    feedback: None,
                    submitted_at: now,
                    graded_at: None,
                    graded_by: None,
                };

                let submission = diesel::insert_into(submissions::table)
                    .values(&fresh)
                    .on_conflict((submissions::assignment_id, submissions::user_id))
                    .do_update()
                    .set(&reset)
                    .returning(Submission::as_returning())
                    .get_result(conn)?;

                touch_progress(conn, user_id, course_id)?;
                Ok(submission)
            })
        })
        .await?;

        info!("User {user_id} submitted assignment {assignment_id}");
        Ok(submission)
    }

    pub async fn my_submission(&self, user_id: Uuid, assignment_id: Uuid) -> ApiResult<Submission> {
        run_blocking(&self.db, move |conn| {
            load_assignment(conn, assignment_id)?;
            submissions::table
                .filter(submissions::assignment_id.eq(assignment_id))
                .filter(submissions::user_id.eq(user_id))
                .select(Submission::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("Submission"))
        })
        .await
    }

    pub async fn list_submissions(
        &self,
        user: AuthenticatedUser,
        assignment_id: Uuid,
    ) -> ApiResult<Vec<SubmissionWithStudent>> {
        run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_assignment(conn, assignment_id)?;
            require_owner(conn, &user, course_id)?;

            let rows: Vec<(Submission, String, String)> = submissions::table
                .inner_join(users::table.on(users::id.eq(submissions::user_id)))
                .filter(submissions::assignment_id.eq(assignment_id))
                .order(submissions::submitted_at.asc())
                .select((Submission::as_select(), users::name, users::email))
                .load(conn)?;

            Ok(rows
                .into_iter()
                .map(|(submission, student_name, student_email)| SubmissionWithStudent {
                    submission,
                    student_name,
                    student_email,
                })
                .collect())
        })
        .await
    }

    pub async fn grade(
        &self,
        user: AuthenticatedUser,
        submission_id: Uuid,
        req: GradeSubmissionRequest,
    ) -> ApiResult<Submission> {
        let grader_id = user.user_id;
        let graded = run_blocking(&self.db, move |conn| {
            let submission = load_submission(conn, submission_id)?;
            let course_id = course_id_for_assignment(conn, submission.assignment_id)?;
            require_owner(conn, &user, course_id)?;

            let assignment = load_assignment(conn, submission.assignment_id)?;
            validate_grade(req.grade, assignment.max_points)?;

            Ok(diesel::update(submissions::table.find(submission_id))
                .set((
                    submissions::status.eq(STATUS_GRADED),
                    submissions::grade.eq(Some(req.grade)),
                    submissions::feedback.eq(req.feedback),
                    submissions::graded_at.eq(Some(Utc::now())),
                    submissions::graded_by.eq(Some(grader_id)),
                ))
                .returning(Submission::as_returning())
                .get_result(conn)?)
        })
        .await?;

        info!("Submission {} graded by {}", graded.id, grader_id);
        Ok(graded)
    }
}
