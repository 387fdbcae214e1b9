use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::shared::schema::{quiz_answers, quiz_attempts, quiz_questions, quizzes};

pub const QUESTION_TYPES: [&str; 4] = ["single_choice", "multiple_choice", "true_false", "short_answer"];

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = quizzes)]
pub struct Quiz {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub quiz_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = quizzes)]
pub struct QuizChangeset {
    pub title: Option<String>,
    pub description: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = quiz_questions)]
pub struct QuizQuestion {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub prompt: String,
    pub question_type: String,
    pub options: serde_json::Value,
    pub correct_answer: String,
    pub question_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = quiz_attempts)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub user_id: Uuid,
    pub correct_count: i32,
    pub total_count: i32,
    pub percentage: i32,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = quiz_answers)]
pub struct QuizAnswer {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub question_id: Uuid,
    pub user_id: Uuid,
    pub answer: String,
    pub is_correct: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionInput {
    pub prompt: String,
    pub question_type: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuizRequest {
    pub module_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
}

/// `questions`, when present, replaces the whole question set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateQuizRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub questions: Option<Vec<QuestionInput>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    pub answer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitQuizRequest {
    pub answers: Vec<SubmittedAnswer>,
}

/// Question as shown to a caller who may not see the answer key.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: Uuid,
    pub prompt: String,
    pub question_type: String,
    pub options: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    pub question_order: i32,
}

impl QuestionView {
    pub fn from_question(question: QuizQuestion, reveal_answer: bool) -> Self {
        Self {
            id: question.id,
            prompt: question.prompt,
            question_type: question.question_type,
            options: question.options,
            correct_answer: reveal_answer.then_some(question.correct_answer),
            question_order: question.question_order,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub course_id: Uuid,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub question_id: Uuid,
    pub answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizResult {
    pub attempt_id: Uuid,
    pub quiz_id: Uuid,
    pub correct: i32,
    pub total: i32,
    pub percentage: i32,
    pub answers: Vec<AnswerOutcome>,
    pub submitted_at: DateTime<Utc>,
}
