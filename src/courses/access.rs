//! Ownership and enrollment checks shared by every module that serves course content.
//!
//! All functions run on a checked-out connection, so callers invoke them from
//! inside a `run_blocking` closure alongside the query they protect.

use diesel::prelude::*;
use uuid::Uuid;

use super::types::Progress;
use crate::core::shared::schema::{
    assignments, course_modules, courses, forum_posts, forum_threads, lessons, progress, quizzes,
};
use crate::core::shared::{ApiError, ApiResult};
use crate::security::AuthenticatedUser;

/// Decides content access once owner and enrollment are known.
pub fn access_decision(user: &AuthenticatedUser, owner_id: Uuid, enrolled: bool) -> ApiResult<()> {
    if !user.is_authenticated() {
        return Err(ApiError::Unauthorized("Authentication required".to_string()));
    }
    if user.can_manage(owner_id) || enrolled {
        return Ok(());
    }
    Err(ApiError::forbidden(
        "You must be enrolled in this course to access its content",
    ))
}

pub fn ownership_decision(user: &AuthenticatedUser, owner_id: Uuid) -> ApiResult<()> {
    if user.can_manage(owner_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Only the course instructor or an admin can do this",
        ))
    }
}

pub fn course_owner(conn: &mut PgConnection, course_id: Uuid) -> ApiResult<Uuid> {
    courses::table
        .find(course_id)
        .select(courses::instructor_id)
        .first::<Uuid>(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Course"))
}

pub fn find_enrollment(
    conn: &mut PgConnection,
    user_id: Uuid,
    course_id: Uuid,
) -> ApiResult<Option<Progress>> {
    Ok(progress::table
        .filter(progress::user_id.eq(user_id))
        .filter(progress::course_id.eq(course_id))
        .select(Progress::as_select())
        .first(conn)
        .optional()?)
}

/// The enrollment gate: admin, course owner, or a user holding a Progress row.
pub fn require_access(
    conn: &mut PgConnection,
    user: &AuthenticatedUser,
    course_id: Uuid,
) -> ApiResult<()> {
    let owner_id = course_owner(conn, course_id)?;
    if user.can_manage(owner_id) {
        return Ok(());
    }
    let enrolled = user.is_authenticated() && find_enrollment(conn, user.user_id, course_id)?.is_some();
    access_decision(user, owner_id, enrolled)
}

pub fn require_owner(
    conn: &mut PgConnection,
    user: &AuthenticatedUser,
    course_id: Uuid,
) -> ApiResult<()> {
    let owner_id = course_owner(conn, course_id)?;
    ownership_decision(user, owner_id)
}

/// Like [`require_access`] but only an actual enrollment passes; used where work is recorded.
pub fn require_enrollment(
    conn: &mut PgConnection,
    user_id: Uuid,
    course_id: Uuid,
) -> ApiResult<Progress> {
    course_owner(conn, course_id)?;
    find_enrollment(conn, user_id, course_id)?.ok_or_else(|| {
        ApiError::forbidden("You must be enrolled in this course")
    })
}

pub fn can_manage_course(
    conn: &mut PgConnection,
    user: &AuthenticatedUser,
    course_id: Uuid,
) -> ApiResult<bool> {
    Ok(user.can_manage(course_owner(conn, course_id)?))
}

pub fn course_id_for_module(conn: &mut PgConnection, module_id: Uuid) -> ApiResult<Uuid> {
    course_modules::table
        .find(module_id)
        .select(course_modules::course_id)
        .first::<Uuid>(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Module"))
}

pub fn course_id_for_lesson(conn: &mut PgConnection, lesson_id: Uuid) -> ApiResult<Uuid> {
    lessons::table
        .inner_join(course_modules::table)
        .filter(lessons::id.eq(lesson_id))
        .select(course_modules::course_id)
        .first::<Uuid>(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Lesson"))
}

pub fn course_id_for_quiz(conn: &mut PgConnection, quiz_id: Uuid) -> ApiResult<Uuid> {
    quizzes::table
        .inner_join(course_modules::table)
        .filter(quizzes::id.eq(quiz_id))
        .select(course_modules::course_id)
        .first::<Uuid>(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Quiz"))
}

pub fn course_id_for_assignment(conn: &mut PgConnection, assignment_id: Uuid) -> ApiResult<Uuid> {
    assignments::table
        .inner_join(course_modules::table)
        .filter(assignments::id.eq(assignment_id))
        .select(course_modules::course_id)
        .first::<Uuid>(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Assignment"))
}

pub fn course_id_for_thread(conn: &mut PgConnection, thread_id: Uuid) -> ApiResult<Uuid> {
    forum_threads::table
        .find(thread_id)
        .select(forum_threads::course_id)
        .first::<Uuid>(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Thread"))
}

pub fn course_id_for_post(conn: &mut PgConnection, post_id: Uuid) -> ApiResult<Uuid> {
    forum_posts::table
        .inner_join(forum_threads::table)
        .filter(forum_posts::id.eq(post_id))
        .select(forum_threads::course_id)
        .first::<Uuid>(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Post"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::Role;

    #[test]
    fn test_enrolled_student_passes() {
        let student = AuthenticatedUser::new(Uuid::new_v4(), Role::Student);
        assert!(access_decision(&student, Uuid::new_v4(), true).is_ok());
    }

    #[test]
    fn test_unenrolled_student_is_forbidden() {
        let student = AuthenticatedUser::new(Uuid::new_v4(), Role::Student);
        assert!(matches!(
            access_decision(&student, Uuid::new_v4(), false),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_owner_and_admin_bypass_gate() {
        let owner_id = Uuid::new_v4();
        let owner = AuthenticatedUser::new(owner_id, Role::Instructor);
        let admin = AuthenticatedUser::new(Uuid::new_v4(), Role::Admin);
        assert!(access_decision(&owner, owner_id, false).is_ok());
        assert!(access_decision(&admin, owner_id, false).is_ok());
    }

    #[test]
    fn test_other_instructor_needs_enrollment() {
        let other = AuthenticatedUser::new(Uuid::new_v4(), Role::Instructor);
        assert!(access_decision(&other, Uuid::new_v4(), false).is_err());
        assert!(ownership_decision(&other, Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_anonymous_is_unauthorized() {
        assert!(matches!(
            access_decision(&AuthenticatedUser::anonymous(), Uuid::new_v4(), false),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
