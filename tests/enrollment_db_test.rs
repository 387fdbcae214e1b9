//! End-to-end enrollment, lesson, quiz and assignment flow against a real PostgreSQL.
//! Runs only when TEST_DATABASE_URL is set; otherwise each test returns early.

use chrono::{Duration, Utc};
use learnova::assignments::types::{
    CreateAssignmentRequest, GradeSubmissionRequest, SubmitAssignmentRequest,
};
use learnova::assignments::AssignmentEngine;
use learnova::core::shared::utils::{create_conn, run_migrations};
use learnova::core::shared::{ApiError, DbPool};
use learnova::courses::types::{CreateCourseRequest, CreateModuleRequest, UpdateCourseRequest};
use learnova::courses::CourseEngine;
use learnova::lessons::types::CreateLessonRequest;
use learnova::lessons::LessonEngine;
use learnova::quizzes::types::{
    CreateQuizRequest, QuestionInput, SubmitQuizRequest, SubmittedAnswer, UpdateQuizRequest,
};
use learnova::quizzes::QuizEngine;
use learnova::security::{AuthenticatedUser, Role};
use learnova::users::types::RegisterRequest;
use learnova::users::UserEngine;
use uuid::Uuid;

fn test_pool() -> Option<DbPool> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            println!("Skipping test - TEST_DATABASE_URL not set");
            return None;
        }
    };
    let pool = create_conn(&url, 4).expect("pool");
    run_migrations(&pool).expect("migrations");
    Some(pool)
}

async fn register(pool: &DbPool, role: &str) -> AuthenticatedUser {
    let engine = UserEngine::new(pool.clone());
    let user = engine
        .register(RegisterRequest {
            email: format!("{}-{}@example.com", role, Uuid::new_v4()),
            password: "quiet-meadow-lantern".to_string(),
            name: format!("Test {role}"),
            role: Some(role.to_string()),
        })
        .await
        .expect("register");
    let role: Role = user.role.parse().expect("role");
    AuthenticatedUser::new(user.id, role)
}

struct Fixture {
    instructor: AuthenticatedUser,
    course_id: Uuid,
    module_id: Uuid,
}

async fn published_course(pool: &DbPool) -> Fixture {
    let instructor = register(pool, "instructor").await;
    let courses = CourseEngine::new(pool.clone());

    let course = courses
        .create_course(
            instructor.user_id,
            CreateCourseRequest {
                title: "Rust for Everyone".to_string(),
                description: None,
                category: Some("programming".to_string()),
                level: None,
                price_cents: None,
                cover_image_url: None,
                preview_video_url: None,
            },
        )
        .await
        .expect("course");
    courses
        .update_course(
            instructor.clone(),
            course.id,
            UpdateCourseRequest {
                is_published: Some(true),
                ..Default::default()
            },
        )
        .await
        .expect("publish");
    let module = courses
        .create_module(
            instructor.clone(),
            course.id,
            CreateModuleRequest {
                title: "Basics".to_string(),
                description: None,
            },
        )
        .await
        .expect("module");

    Fixture {
        instructor,
        course_id: course.id,
        module_id: module.id,
    }
}

fn question(correct: &str) -> QuestionInput {
    QuestionInput {
        prompt: "Pick the right letter".to_string(),
        question_type: Some("single_choice".to_string()),
        options: vec!["A".to_string(), "B".to_string(), "C".to_string()],
        correct_answer: correct.to_string(),
    }
}

#[tokio::test]
async fn test_enrolling_twice_conflicts() {
    let Some(pool) = test_pool() else { return };
    let fixture = published_course(&pool).await;
    let student = register(&pool, "student").await;
    let courses = CourseEngine::new(pool.clone());

    courses
        .enroll(student.user_id, fixture.course_id)
        .await
        .expect("first enrollment");
    let second = courses.enroll(student.user_id, fixture.course_id).await;
    assert!(matches!(second, Err(ApiError::Conflict(_))));

    let status = courses
        .check_enrollment(student.user_id, fixture.course_id)
        .await
        .expect("status");
    assert!(status.enrolled);
}

#[tokio::test]
async fn test_quiz_scoring_requires_enrollment() {
    let Some(pool) = test_pool() else { return };
    let fixture = published_course(&pool).await;
    let student = register(&pool, "student").await;
    let quizzes = QuizEngine::new(pool.clone());

    let quiz = quizzes
        .create_quiz(
            fixture.instructor.clone(),
            CreateQuizRequest {
                module_id: fixture.module_id,
                title: "Letters".to_string(),
                description: None,
                questions: vec![question("A"), question("B")],
            },
        )
        .await
        .expect("quiz");
    let q1 = quiz.questions[0].id;
    let q2 = quiz.questions[1].id;
    let answers = || SubmitQuizRequest {
        answers: vec![
            SubmittedAnswer {
                question_id: q1,
                answer: "A".to_string(),
            },
            SubmittedAnswer {
                question_id: q2,
                answer: "C".to_string(),
            },
        ],
    };

    let denied = quizzes.submit_quiz(student.user_id, quiz.quiz.id, answers()).await;
    assert!(matches!(denied, Err(ApiError::Forbidden(_))));

    CourseEngine::new(pool.clone())
        .enroll(student.user_id, fixture.course_id)
        .await
        .expect("enroll");

    let result = quizzes
        .submit_quiz(student.user_id, quiz.quiz.id, answers())
        .await
        .expect("submit");
    assert_eq!(result.correct, 1);
    assert_eq!(result.total, 2);
    assert_eq!(result.percentage, 50);

    let student_view = quizzes.get_quiz(student.clone(), quiz.quiz.id).await.expect("view");
    assert!(student_view.questions.iter().all(|q| q.correct_answer.is_none()));
}

#[tokio::test]
async fn test_lesson_completion_drives_progress() {
    let Some(pool) = test_pool() else { return };
    let fixture = published_course(&pool).await;
    let student = register(&pool, "student").await;
    let lessons = LessonEngine::new(pool.clone());

    let mut lesson_ids = Vec::new();
    for title in ["Ownership", "Borrowing"] {
        let lesson = lessons
            .create_lesson(
                fixture.instructor.clone(),
                CreateLessonRequest {
                    module_id: fixture.module_id,
                    title: title.to_string(),
                    content: Some("...".to_string()),
                    content_type: None,
                    video_url: None,
                    duration_minutes: Some(10),
                },
            )
            .await
            .expect("lesson");
        lesson_ids.push(lesson.id);
    }

    let outsider = lessons.get_lesson(student.clone(), lesson_ids[0]).await;
    assert!(matches!(outsider, Err(ApiError::Forbidden(_))));

    CourseEngine::new(pool.clone())
        .enroll(student.user_id, fixture.course_id)
        .await
        .expect("enroll");

    let first = lessons
        .complete_lesson(student.user_id, lesson_ids[0])
        .await
        .expect("complete first");
    assert_eq!(first.progress_percentage, 50);
    assert!(!first.completed);

    let again = lessons
        .complete_lesson(student.user_id, lesson_ids[0])
        .await
        .expect("complete first again");
    assert_eq!(again.progress_percentage, 50);

    let done = lessons
        .complete_lesson(student.user_id, lesson_ids[1])
        .await
        .expect("complete second");
    assert_eq!(done.progress_percentage, 100);
    assert!(done.completed);
}

#[tokio::test]
async fn test_quiz_questions_frozen_after_attempt() {
    let Some(pool) = test_pool() else { return };
    let fixture = published_course(&pool).await;
    let student = register(&pool, "student").await;
    let quizzes = QuizEngine::new(pool.clone());

    let quiz = quizzes
        .create_quiz(
            fixture.instructor.clone(),
            CreateQuizRequest {
                module_id: fixture.module_id,
                title: "Letters".to_string(),
                description: None,
                questions: vec![question("A")],
            },
        )
        .await
        .expect("quiz");
    let quiz_id = quiz.quiz.id;

    let before_attempts = quizzes
        .update_quiz(
            fixture.instructor.clone(),
            quiz_id,
            UpdateQuizRequest {
                questions: Some(vec![question("B")]),
                ..Default::default()
            },
        )
        .await
        .expect("replace questions");
    let question_id = before_attempts.questions[0].id;

    CourseEngine::new(pool.clone())
        .enroll(student.user_id, fixture.course_id)
        .await
        .expect("enroll");
    quizzes
        .submit_quiz(
            student.user_id,
            quiz_id,
            SubmitQuizRequest {
                answers: vec![SubmittedAnswer {
                    question_id,
                    answer: "B".to_string(),
                }],
            },
        )
        .await
        .expect("submit");

    let replaced = quizzes
        .update_quiz(
            fixture.instructor.clone(),
            quiz_id,
            UpdateQuizRequest {
                questions: Some(vec![question("C")]),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(replaced, Err(ApiError::Conflict(_))));

    let renamed = quizzes
        .update_quiz(
            fixture.instructor.clone(),
            quiz_id,
            UpdateQuizRequest {
                title: Some("Letters, revised".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("rename");
    assert_eq!(renamed.questions[0].id, question_id);
}

fn assignment_request(module_id: Uuid, due_in: Duration) -> CreateAssignmentRequest {
    CreateAssignmentRequest {
        module_id,
        title: "Write a linked list".to_string(),
        description: None,
        due_date: Some(Utc::now() + due_in),
        max_points: Some(10),
    }
}

fn body(text: &str) -> SubmitAssignmentRequest {
    SubmitAssignmentRequest {
        content: Some(text.to_string()),
        attachment_url: None,
    }
}

#[tokio::test]
async fn test_resubmission_clears_grade() {
    let Some(pool) = test_pool() else { return };
    let fixture = published_course(&pool).await;
    let student = register(&pool, "student").await;
    let assignments = AssignmentEngine::new(pool.clone());

    let assignment = assignments
        .create_assignment(
            fixture.instructor.clone(),
            assignment_request(fixture.module_id, Duration::days(7)),
        )
        .await
        .expect("assignment");
    let assignment_id = assignment.assignment.id;

    CourseEngine::new(pool.clone())
        .enroll(student.user_id, fixture.course_id)
        .await
        .expect("enroll");

    let first = assignments
        .submit(student.user_id, assignment_id, body("draft"))
        .await
        .expect("submit");
    let graded = assignments
        .grade(
            fixture.instructor.clone(),
            first.id,
            GradeSubmissionRequest {
                grade: 7,
                feedback: Some("Handle the empty list".to_string()),
            },
        )
        .await
        .expect("grade");
    assert_eq!(graded.status, "graded");
    assert_eq!(graded.grade, Some(7));

    let resubmitted = assignments
        .submit(student.user_id, assignment_id, body("final"))
        .await
        .expect("resubmit");
    assert_eq!(resubmitted.id, first.id);
    assert_eq!(resubmitted.status, "submitted");
    assert_eq!(resubmitted.content.as_deref(), Some("final"));
    assert_eq!(resubmitted.grade, None);
    assert_eq!(resubmitted.feedback, None);
    assert_eq!(resubmitted.graded_at, None);
    assert_eq!(resubmitted.graded_by, None);

    let stored = assignments
        .my_submission(student.user_id, assignment_id)
        .await
        .expect("my submission");
    assert_eq!(stored.grade, None);
    assert_eq!(stored.status, "submitted");
}

#[tokio::test]
async fn test_late_submission_rejected() {
    let Some(pool) = test_pool() else { return };
    let fixture = published_course(&pool).await;
    let student = register(&pool, "student").await;
    let assignments = AssignmentEngine::new(pool.clone());

    let assignment = assignments
        .create_assignment(
            fixture.instructor.clone(),
            assignment_request(fixture.module_id, Duration::days(-1)),
        )
        .await
        .expect("assignment");

    CourseEngine::new(pool.clone())
        .enroll(student.user_id, fixture.course_id)
        .await
        .expect("enroll");

    let late = assignments
        .submit(student.user_id, assignment.assignment.id, body("sorry"))
        .await;
    assert!(matches!(late, Err(ApiError::Validation(_))));

    let missing = assignments
        .my_submission(student.user_id, assignment.assignment.id)
        .await;
    assert!(matches!(missing, Err(ApiError::NotFound(_))));
}
