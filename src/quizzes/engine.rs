use chrono::Utc;
use diesel::prelude::*;
use log::info;
use uuid::Uuid;

use super::grading::grade_quiz;
use super::types::*;
use crate::core::shared::schema::{quiz_answers, quiz_attempts, quiz_questions, quizzes};
use crate::core::shared::utils::require_non_empty;
use crate::core::shared::{run_blocking, ApiError, ApiResult, DbPool};
use crate::courses::access::{
    can_manage_course, course_id_for_module, course_id_for_quiz, require_access,
    require_enrollment, require_owner,
};
use crate::courses::progress::touch_progress;
use crate::security::AuthenticatedUser;

pub fn validate_question(question: &QuestionInput) -> ApiResult<()> {
    require_non_empty("prompt", &question.prompt)?;

    let question_type = question.question_type.as_deref().unwrap_or("single_choice");
    if !QUESTION_TYPES.contains(&question_type) {
        return Err(ApiError::validation(format!(
            "question_type must be one of: {}",
            QUESTION_TYPES.join(", ")
        )));
    }

    match question_type {
        "single_choice" | "multiple_choice" => {
            if question.options.len() < 2 {
                return Err(ApiError::validation(
                    "Choice questions need at least two options",
                ));
            }
            if question_type == "single_choice" && !question.options.contains(&question.correct_answer) {
                return Err(ApiError::validation(
                    "correct_answer must be one of the options",
                ));
            }
        }
        "true_false" => {
            if !matches!(question.correct_answer.as_str(), "true" | "false") {
                return Err(ApiError::validation(
                    "correct_answer for a true_false question must be \"true\" or \"false\"",
                ));
            }
        }
        _ => {}
    }

    Ok(())
}

fn build_questions(quiz_id: Uuid, inputs: Vec<QuestionInput>) -> Vec<QuizQuestion> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(pos, input)| {
            let question_type = input
                .question_type
                .unwrap_or_else(|| "single_choice".to_string());
            let options = if question_type == "true_false" && input.options.is_empty() {
                vec!["true".to_string(), "false".to_string()]
            } else {
                input.options
            };
            QuizQuestion {
                id: Uuid::new_v4(),
                quiz_id,
                prompt: input.prompt.trim().to_string(),
                question_type,
                options: serde_json::Value::from(options),
                correct_answer: input.correct_answer,
                question_order: pos as i32 + 1,
            }
        })
        .collect()
}

fn load_quiz(conn: &mut PgConnection, quiz_id: Uuid) -> ApiResult<Quiz> {
    quizzes::table
        .find(quiz_id)
        .select(Quiz::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Quiz"))
}

fn load_questions(conn: &mut PgConnection, quiz_id: Uuid) -> QueryResult<Vec<QuizQuestion>> {
    quiz_questions::table
        .filter(quiz_questions::quiz_id.eq(quiz_id))
        .order(quiz_questions::question_order.asc())
        .select(QuizQuestion::as_select())
        .load(conn)
}

fn quiz_detail(
    conn: &mut PgConnection,
    quiz: Quiz,
    course_id: Uuid,
    reveal_answers: bool,
) -> ApiResult<QuizDetail> {
    let questions = load_questions(conn, quiz.id)?
        .into_iter()
        .map(|q| QuestionView::from_question(q, reveal_answers))
        .collect();
    Ok(QuizDetail {
        quiz,
        course_id,
        questions,
    })
}

pub struct QuizEngine {
    db: DbPool,
}

impl QuizEngine {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn create_quiz(&self, user: AuthenticatedUser, req: CreateQuizRequest) -> ApiResult<QuizDetail> {
        require_non_empty("title", &req.title)?;
        for question in &req.questions {
            validate_question(question)?;
        }

        let detail = run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_module(conn, req.module_id)?;
            require_owner(conn, &user, course_id)?;

            let quiz = conn.transaction::<_, ApiError, _>(|conn| {
                let max_order: Option<i32> = quizzes::table
                    .filter(quizzes::module_id.eq(req.module_id))
                    .select(diesel::dsl::max(quizzes::quiz_order))
                    .first(conn)?;

                let now = Utc::now();
                let quiz = Quiz {
                    id: Uuid::new_v4(),
                    module_id: req.module_id,
                    title: req.title.trim().to_string(),
                    description: req.description,
                    quiz_order: max_order.unwrap_or(0) + 1,
                    created_at: now,
                    updated_at: now,
                };
                diesel::insert_into(quizzes::table).values(&quiz).execute(conn)?;

                let questions = build_questions(quiz.id, req.questions);
                diesel::insert_into(quiz_questions::table)
                    .values(&questions)
                    .execute(conn)?;
                Ok(quiz)
            })?;

            quiz_detail(conn, quiz, course_id, true)
        })
        .await?;

        info!("Quiz {} created with {} questions", detail.quiz.id, detail.questions.len());
        Ok(detail)
    }

    /// Answer keys are only shown to the course owner and admins.
    pub async fn get_quiz(&self, user: AuthenticatedUser, quiz_id: Uuid) -> ApiResult<QuizDetail> {
        run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_quiz(conn, quiz_id)?;
            require_access(conn, &user, course_id)?;
            let reveal = can_manage_course(conn, &user, course_id)?;
            let quiz = load_quiz(conn, quiz_id)?;
            quiz_detail(conn, quiz, course_id, reveal)
        })
        .await
    }

    /// Question replacement happens in the same transaction as the quiz update and is refused
    /// once attempts exist, since their stored answers reference the current questions.
    pub async fn update_quiz(
        &self,
        user: AuthenticatedUser,
        quiz_id: Uuid,
        req: UpdateQuizRequest,
    ) -> ApiResult<QuizDetail> {
        if let Some(title) = &req.title {
            require_non_empty("title", title)?;
        }
        if let Some(questions) = &req.questions {
            for question in questions {
                validate_question(question)?;
            }
        }

        run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_quiz(conn, quiz_id)?;
            require_owner(conn, &user, course_id)?;

            let quiz = conn.transaction::<_, ApiError, _>(|conn| {
                let changes = QuizChangeset {
                    title: req.title.map(|t| t.trim().to_string()),
                    description: req.description,
                    updated_at: Some(Utc::now()),
                };
                let quiz = diesel::update(quizzes::table.find(quiz_id))
                    .set(&changes)
                    .returning(Quiz::as_returning())
                    .get_result(conn)?;

                if let Some(inputs) = req.questions {
                    let attempts: i64 = quiz_attempts::table
                        .filter(quiz_attempts::quiz_id.eq(quiz_id))
                        .count()
                        .get_result(conn)?;
                    if attempts > 0 {
                        return Err(ApiError::Conflict(
                            "Questions cannot be replaced after the quiz has attempts".to_string(),
                        ));
                    }
                    diesel::delete(quiz_questions::table.filter(quiz_questions::quiz_id.eq(quiz_id)))
                        .execute(conn)?;
                    let questions = build_questions(quiz_id, inputs);
                    diesel::insert_into(quiz_questions::table)
                        .values(&questions)
                        .execute(conn)?;
                }
                Ok(quiz)
            })?;

            quiz_detail(conn, quiz, course_id, true)
        })
        .await
    }

    pub async fn delete_quiz(&self, user: AuthenticatedUser, quiz_id: Uuid) -> ApiResult<()> {
        run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_quiz(conn, quiz_id)?;
            require_owner(conn, &user, course_id)?;
            diesel::delete(quizzes::table.find(quiz_id)).execute(conn)?;
            Ok(())
        })
        .await?;

        info!("Quiz {quiz_id} deleted");
        Ok(())
    }

    /// Scores a submission and stores the attempt with one answer row per question atomically.
    /// Requires enrollment; submitting never enrolls.
    pub async fn submit_quiz(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
        req: SubmitQuizRequest,
    ) -> ApiResult<QuizResult> {
        let result = run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_quiz(conn, quiz_id)?;
            require_enrollment(conn, user_id, course_id)?;

            let questions = load_questions(conn, quiz_id)?;
            let report = grade_quiz(&questions, &req.answers);

            conn.transaction::<_, ApiError, _>(|conn| {
                let now = Utc::now();
                let attempt = QuizAttempt {
                    id: Uuid::new_v4(),
                    quiz_id,
                    user_id,
                    correct_count: report.correct,
                    total_count: report.total,
                    percentage: report.percentage,
                    submitted_at: now,
                };
                diesel::insert_into(quiz_attempts::table)
                    .values(&attempt)
                    .execute(conn)?;

                let answer_rows: Vec<QuizAnswer> = report
                    .outcomes
                    .iter()
                    .map(|outcome| QuizAnswer {
                        id: Uuid::new_v4(),
                        attempt_id: attempt.id,
                        question_id: outcome.question_id,
                        user_id,
                        answer: outcome.answer.clone(),
                        is_correct: outcome.is_correct,
                        created_at: now,
                    })
                    .collect();
                diesel::insert_into(quiz_answers::table)
                    .values(&answer_rows)
                    .execute(conn)?;

                touch_progress(conn, user_id, course_id)?;

                Ok(QuizResult {
                    attempt_id: attempt.id,
                    quiz_id,
                    correct: report.correct,
                    total: report.total,
                    percentage: report.percentage,
                    answers: report.outcomes.clone(),
                    submitted_at: now,
                })
            })
        })
        .await?;

        info!(
            "User {} scored {}/{} on quiz {}",
            user_id, result.correct, result.total, quiz_id
        );
        Ok(result)
    }

    /// Owners and admins see every attempt; everyone else sees their own.
    pub async fn list_attempts(&self, user: AuthenticatedUser, quiz_id: Uuid) -> ApiResult<Vec<QuizAttempt>> {
        run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_quiz(conn, quiz_id)?;
            require_access(conn, &user, course_id)?;

            let mut query = quiz_attempts::table
                .filter(quiz_attempts::quiz_id.eq(quiz_id))
                .into_boxed();
            if !can_manage_course(conn, &user, course_id)? {
                query = query.filter(quiz_attempts::user_id.eq(user.user_id));
            }

            Ok(query
                .order(quiz_attempts::submitted_at.desc())
                .select(QuizAttempt::as_select())
                .load(conn)?)
        })
        .await
    }
}
