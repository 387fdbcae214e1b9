use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use log::info;
use std::collections::HashMap;
use uuid::Uuid;

use super::access::{self, require_owner};
use super::reorder::{apply_plan, validate_plan, CourseInventory};
use super::types::*;
use crate::assignments::types::Assignment;
use crate::core::shared::schema::{
    assignments, course_modules, courses, lesson_completions, lessons, progress, quizzes, users,
};
use crate::core::shared::utils::require_non_empty;
use crate::core::shared::{run_blocking, ApiError, ApiResult, DbPool, Pagination};
use crate::lessons::types::Lesson;
use crate::quizzes::types::Quiz;
use crate::security::AuthenticatedUser;

type BoxedCourseQuery<'a> = courses::BoxedQuery<'a, Pg>;

fn filtered_courses<'a>(filters: &CourseFilters) -> BoxedCourseQuery<'a> {
    let mut query = courses::table
        .filter(courses::is_published.eq(true))
        .into_boxed();

    if let Some(category) = filters.category.clone() {
        query = query.filter(courses::category.eq(category));
    }
    if let Some(level) = filters.level.clone() {
        query = query.filter(courses::level.eq(level));
    }
    if let Some(instructor_id) = filters.instructor_id {
        query = query.filter(courses::instructor_id.eq(instructor_id));
    }
    if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        query = query.filter(
            courses::title
                .ilike(pattern.clone())
                .or(courses::description.ilike(pattern)),
        );
    }

    query
}

fn load_course(conn: &mut PgConnection, course_id: Uuid) -> ApiResult<Course> {
    courses::table
        .find(course_id)
        .select(Course::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Course"))
}

fn load_module(conn: &mut PgConnection, course_id: Uuid, module_id: Uuid) -> ApiResult<CourseModule> {
    course_modules::table
        .filter(course_modules::id.eq(module_id))
        .filter(course_modules::course_id.eq(course_id))
        .select(CourseModule::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Module"))
}

fn group_by_module<T>(rows: Vec<T>, module_of: impl Fn(&T) -> Uuid) -> HashMap<Uuid, Vec<T>> {
    let mut grouped: HashMap<Uuid, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(module_of(&row)).or_default().push(row);
    }
    grouped
}

/// Full ordered tree: modules, then lessons, quizzes and assignments inside each.
pub fn load_content(conn: &mut PgConnection, course: Course) -> ApiResult<CourseContent> {
    let modules: Vec<CourseModule> = course_modules::table
        .filter(course_modules::course_id.eq(course.id))
        .order((course_modules::module_order.asc(), course_modules::created_at.asc()))
        .select(CourseModule::as_select())
        .load(conn)?;
    let module_ids: Vec<Uuid> = modules.iter().map(|m| m.id).collect();

    let lesson_rows: Vec<Lesson> = lessons::table
        .filter(lessons::module_id.eq_any(&module_ids))
        .order((lessons::lesson_order.asc(), lessons::created_at.asc()))
        .select(Lesson::as_select())
        .load(conn)?;
    let quiz_rows: Vec<Quiz> = quizzes::table
        .filter(quizzes::module_id.eq_any(&module_ids))
        .order((quizzes::quiz_order.asc(), quizzes::created_at.asc()))
        .select(Quiz::as_select())
        .load(conn)?;
    let assignment_rows: Vec<Assignment> = assignments::table
        .filter(assignments::module_id.eq_any(&module_ids))
        .order((assignments::assignment_order.asc(), assignments::created_at.asc()))
        .select(Assignment::as_select())
        .load(conn)?;

    let mut lessons_by_module = group_by_module(lesson_rows, |l| l.module_id);
    let mut quizzes_by_module = group_by_module(quiz_rows, |q| q.module_id);
    let mut assignments_by_module = group_by_module(assignment_rows, |a| a.module_id);

    let modules = modules
        .into_iter()
        .map(|module| ModuleContent {
            lessons: lessons_by_module.remove(&module.id).unwrap_or_default(),
            quizzes: quizzes_by_module.remove(&module.id).unwrap_or_default(),
            assignments: assignments_by_module.remove(&module.id).unwrap_or_default(),
            module,
        })
        .collect();

    Ok(CourseContent { course, modules })
}

pub struct CourseEngine {
    db: DbPool,
}

impl CourseEngine {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    // ----- Course Operations -----

    pub async fn create_course(&self, instructor_id: Uuid, req: CreateCourseRequest) -> ApiResult<Course> {
        require_non_empty("title", &req.title)?;
        let level = req.level.unwrap_or_else(|| "beginner".to_string());
        validate_level(&level)?;
        let price_cents = req.price_cents.unwrap_or(0);
        validate_price(price_cents)?;

        let now = Utc::now();
        let course = Course {
            id: Uuid::new_v4(),
            instructor_id,
            title: req.title.trim().to_string(),
            description: req.description,
            category: req.category,
            level,
            price_cents,
            cover_image_url: req.cover_image_url,
            preview_video_url: req.preview_video_url,
            is_published: false,
            created_at: now,
            updated_at: now,
        };

        let course = run_blocking(&self.db, move |conn| {
            diesel::insert_into(courses::table).values(&course).execute(conn)?;
            Ok(course)
        })
        .await?;

        info!("Course {} created by {}", course.id, instructor_id);
        Ok(course)
    }

    pub async fn list_courses(
        &self,
        filters: CourseFilters,
        pagination: Pagination,
    ) -> ApiResult<(Vec<Course>, i64)> {
        run_blocking(&self.db, move |conn| {
            let total: i64 = filtered_courses(&filters).count().get_result(conn)?;
            let rows = filtered_courses(&filters)
                .order(courses::created_at.desc())
                .limit(pagination.limit())
                .offset(pagination.offset())
                .select(Course::as_select())
                .load(conn)?;
            Ok((rows, total))
        })
        .await
    }

    /// Unpublished courses are invisible to everyone but their owner and admins.
    pub async fn get_course_detail(&self, viewer: AuthenticatedUser, course_id: Uuid) -> ApiResult<CourseDetail> {
        run_blocking(&self.db, move |conn| {
            let course = load_course(conn, course_id)?;
            if !course.is_published && !viewer.can_manage(course.instructor_id) {
                return Err(ApiError::not_found("Course"));
            }

            let enrolled_count: i64 = progress::table
                .filter(progress::course_id.eq(course_id))
                .count()
                .get_result(conn)?;

            let content = load_content(conn, course)?;
            let modules = content
                .modules
                .iter()
                .map(|m| ModuleOutline {
                    id: m.module.id,
                    title: m.module.title.clone(),
                    description: m.module.description.clone(),
                    module_order: m.module.module_order,
                    lesson_count: m.lessons.len(),
                    quiz_count: m.quizzes.len(),
                    assignment_count: m.assignments.len(),
                })
                .collect();

            Ok(CourseDetail {
                course: content.course,
                modules,
                enrolled_count,
            })
        })
        .await
    }

    pub async fn list_teaching(&self, instructor_id: Uuid) -> ApiResult<Vec<Course>> {
        run_blocking(&self.db, move |conn| {
            Ok(courses::table
                .filter(courses::instructor_id.eq(instructor_id))
                .order(courses::created_at.desc())
                .select(Course::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn update_course(
        &self,
        user: AuthenticatedUser,
        course_id: Uuid,
        req: UpdateCourseRequest,
    ) -> ApiResult<Course> {
        if let Some(title) = &req.title {
            require_non_empty("title", title)?;
        }
        if let Some(level) = &req.level {
            validate_level(level)?;
        }
        if let Some(price) = req.price_cents {
            validate_price(price)?;
        }

        run_blocking(&self.db, move |conn| {
            require_owner(conn, &user, course_id)?;

            let changes = CourseChangeset {
                title: req.title.map(|t| t.trim().to_string()),
                description: req.description,
                category: req.category,
                level: req.level,
                price_cents: req.price_cents,
                cover_image_url: req.cover_image_url,
                preview_video_url: req.preview_video_url,
                is_published: req.is_published,
                updated_at: Some(Utc::now()),
            };

            Ok(diesel::update(courses::table.find(course_id))
                .set(&changes)
                .returning(Course::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn delete_course(&self, user: AuthenticatedUser, course_id: Uuid) -> ApiResult<()> {
        run_blocking(&self.db, move |conn| {
            require_owner(conn, &user, course_id)?;
            diesel::delete(courses::table.find(course_id)).execute(conn)?;
            Ok(())
        })
        .await?;

        info!("Course {course_id} deleted");
        Ok(())
    }

    // ----- Module Operations -----

    pub async fn create_module(
        &self,
        user: AuthenticatedUser,
        course_id: Uuid,
        req: CreateModuleRequest,
    ) -> ApiResult<CourseModule> {
        require_non_empty("title", &req.title)?;

        run_blocking(&self.db, move |conn| {
            require_owner(conn, &user, course_id)?;

            let max_order: Option<i32> = course_modules::table
                .filter(course_modules::course_id.eq(course_id))
                .select(diesel::dsl::max(course_modules::module_order))
                .first(conn)?;

            let now = Utc::now();
            let module = CourseModule {
                id: Uuid::new_v4(),
                course_id,
                title: req.title.trim().to_string(),
                description: req.description,
                module_order: max_order.unwrap_or(0) + 1,
                created_at: now,
                updated_at: now,
            };

            diesel::insert_into(course_modules::table)
                .values(&module)
                .execute(conn)?;
            Ok(module)
        })
        .await
    }

    pub async fn update_module(
        &self,
        user: AuthenticatedUser,
        course_id: Uuid,
        module_id: Uuid,
        req: UpdateModuleRequest,
    ) -> ApiResult<CourseModule> {
        if let Some(title) = &req.title {
            require_non_empty("title", title)?;
        }

        run_blocking(&self.db, move |conn| {
            require_owner(conn, &user, course_id)?;
            load_module(conn, course_id, module_id)?;

            let changes = ModuleChangeset {
                title: req.title.map(|t| t.trim().to_string()),
                description: req.description,
                updated_at: Some(Utc::now()),
            };

            Ok(diesel::update(course_modules::table.find(module_id))
                .set(&changes)
                .returning(CourseModule::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn delete_module(&self, user: AuthenticatedUser, course_id: Uuid, module_id: Uuid) -> ApiResult<()> {
        run_blocking(&self.db, move |conn| {
            require_owner(conn, &user, course_id)?;
            load_module(conn, course_id, module_id)?;

            conn.transaction::<_, ApiError, _>(|conn| {
                diesel::delete(course_modules::table.find(module_id)).execute(conn)?;
                super::progress::recalculate_course(conn, course_id)?;
                Ok(())
            })
        })
        .await
    }

    /// Validates the whole plan first, then writes every position in one transaction.
    pub async fn reorder(
        &self,
        user: AuthenticatedUser,
        course_id: Uuid,
        plan: ReorderRequest,
    ) -> ApiResult<CourseContent> {
        run_blocking(&self.db, move |conn| {
            require_owner(conn, &user, course_id)?;

            conn.transaction::<_, ApiError, _>(|conn| {
                let inventory = CourseInventory::load(conn, course_id)?;
                validate_plan(&plan, &inventory)?;
                apply_plan(conn, &plan)?;
                Ok(())
            })?;

            let course = load_course(conn, course_id)?;
            load_content(conn, course)
        })
        .await
    }

    pub async fn get_content(&self, user: AuthenticatedUser, course_id: Uuid) -> ApiResult<CourseContent> {
        run_blocking(&self.db, move |conn| {
            access::require_access(conn, &user, course_id)?;
            let course = load_course(conn, course_id)?;
            load_content(conn, course)
        })
        .await
    }

    // ----- Enrollment Operations -----

    /// Second enrollment is a Conflict, whether caught by the lookup or by the unique index.
    pub async fn enroll(&self, user_id: Uuid, course_id: Uuid) -> ApiResult<Progress> {
        let enrollment = run_blocking(&self.db, move |conn| {
            let course = load_course(conn, course_id)?;
            if !course.is_published {
                return Err(ApiError::validation("Course is not open for enrollment"));
            }

            if access::find_enrollment(conn, user_id, course_id)?.is_some() {
                return Err(ApiError::Conflict("Already enrolled in this course".to_string()));
            }

            let now = Utc::now();
            let enrollment = Progress {
                id: Uuid::new_v4(),
                user_id,
                course_id,
                progress_percentage: 0,
                completed: false,
                enrolled_at: now,
                updated_at: now,
                completed_at: None,
            };

            diesel::insert_into(progress::table)
                .values(&enrollment)
                .execute(conn)
                .map_err(|e| match ApiError::from(e) {
                    ApiError::Conflict(_) => {
                        ApiError::Conflict("Already enrolled in this course".to_string())
                    }
                    other => other,
                })?;

            Ok(enrollment)
        })
        .await?;

        info!("User {user_id} enrolled in course {course_id}");
        Ok(enrollment)
    }

    pub async fn unenroll(&self, user_id: Uuid, course_id: Uuid) -> ApiResult<()> {
        run_blocking(&self.db, move |conn| {
            conn.transaction::<_, ApiError, _>(|conn| {
                let deleted = diesel::delete(
                    progress::table
                        .filter(progress::user_id.eq(user_id))
                        .filter(progress::course_id.eq(course_id)),
                )
                .execute(conn)?;

                if deleted == 0 {
                    return Err(ApiError::not_found("Enrollment"));
                }

                let course_lessons = lessons::table
                    .inner_join(course_modules::table)
                    .filter(course_modules::course_id.eq(course_id))
                    .select(lessons::id);

                diesel::delete(
                    lesson_completions::table
                        .filter(lesson_completions::user_id.eq(user_id))
                        .filter(lesson_completions::lesson_id.eq_any(course_lessons)),
                )
                .execute(conn)?;

                Ok(())
            })
        })
        .await?;

        info!("User {user_id} left course {course_id}");
        Ok(())
    }

    pub async fn check_enrollment(&self, user_id: Uuid, course_id: Uuid) -> ApiResult<EnrollmentStatus> {
        run_blocking(&self.db, move |conn| {
            access::course_owner(conn, course_id)?;
            let progress = access::find_enrollment(conn, user_id, course_id)?;
            Ok(EnrollmentStatus {
                enrolled: progress.is_some(),
                progress,
            })
        })
        .await
    }

    pub async fn list_students(&self, user: AuthenticatedUser, course_id: Uuid) -> ApiResult<Vec<StudentProgress>> {
        run_blocking(&self.db, move |conn| {
            require_owner(conn, &user, course_id)?;

            let rows: Vec<(Progress, (Uuid, String, String))> = progress::table
                .inner_join(users::table.on(users::id.eq(progress::user_id)))
                .filter(progress::course_id.eq(course_id))
                .order(progress::enrolled_at.asc())
                .select((Progress::as_select(), (users::id, users::name, users::email)))
                .load(conn)?;

            Ok(rows
                .into_iter()
                .map(|(p, (user_id, name, email))| StudentProgress {
                    user_id,
                    name,
                    email,
                    progress_percentage: p.progress_percentage,
                    completed: p.completed,
                    enrolled_at: p.enrolled_at,
                    completed_at: p.completed_at,
                })
                .collect())
        })
        .await
    }

    pub async fn list_my_enrollments(&self, user_id: Uuid) -> ApiResult<Vec<EnrollmentSummary>> {
        run_blocking(&self.db, move |conn| {
            let rows: Vec<(Progress, Course)> = progress::table
                .inner_join(courses::table)
                .filter(progress::user_id.eq(user_id))
                .order(progress::enrolled_at.desc())
                .select((Progress::as_select(), Course::as_select()))
                .load(conn)?;

            Ok(rows
                .into_iter()
                .map(|(p, course)| EnrollmentSummary {
                    course,
                    progress_percentage: p.progress_percentage,
                    completed: p.completed,
                    enrolled_at: p.enrolled_at,
                    completed_at: p.completed_at,
                })
                .collect())
        })
        .await
    }
}
