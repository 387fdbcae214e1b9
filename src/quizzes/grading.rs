//! Quiz scoring. Answers are compared by exact string equality: no trimming,
//! no case folding and no partial credit.

use std::collections::HashMap;
use uuid::Uuid;

use super::types::{AnswerOutcome, QuizQuestion, SubmittedAnswer};
use crate::core::shared::utils::percentage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeReport {
    pub correct: i32,
    pub total: i32,
    pub percentage: i32,
    pub outcomes: Vec<AnswerOutcome>,
}

/// Grades `answers` against `questions`, producing one outcome per question in question order.
/// The first answer for a question wins, answers to unknown questions are dropped,
/// and unanswered questions count as an incorrect empty answer.
pub fn grade_quiz(questions: &[QuizQuestion], answers: &[SubmittedAnswer]) -> GradeReport {
    let mut submitted: HashMap<Uuid, &str> = HashMap::new();
    for answer in answers {
        submitted
            .entry(answer.question_id)
            .or_insert(answer.answer.as_str());
    }

    let mut ordered: Vec<&QuizQuestion> = questions.iter().collect();
    ordered.sort_by_key(|q| q.question_order);

    let outcomes: Vec<AnswerOutcome> = ordered
        .into_iter()
        .map(|question| {
            let answer = submitted.get(&question.id).copied();
            AnswerOutcome {
                question_id: question.id,
                answer: answer.unwrap_or_default().to_string(),
                is_correct: answer == Some(question.correct_answer.as_str()),
            }
        })
        .collect();

    let total = outcomes.len() as i32;
    let correct = outcomes.iter().filter(|o| o.is_correct).count() as i32;

    GradeReport {
        correct,
        total,
        percentage: percentage(correct as i64, total as i64),
        outcomes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(order: i32, correct: &str) -> QuizQuestion {
        QuizQuestion {
            id: Uuid::new_v4(),
            quiz_id: Uuid::nil(),
            prompt: format!("Question {order}"),
            question_type: "single_choice".to_string(),
            options: json!(["A", "B", "C"]),
            correct_answer: correct.to_string(),
            question_order: order,
        }
    }

    fn answer(question: &QuizQuestion, value: &str) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: question.id,
            answer: value.to_string(),
        }
    }

    #[test]
    fn test_half_correct() {
        let q1 = question(1, "A");
        let q2 = question(2, "B");
        let report = grade_quiz(&[q1.clone(), q2.clone()], &[answer(&q1, "A"), answer(&q2, "C")]);

        assert_eq!(report.correct, 1);
        assert_eq!(report.total, 2);
        assert_eq!(report.percentage, 50);
    }

    #[test]
    fn test_exact_match_only() {
        let q1 = question(1, "Paris");
        let report = grade_quiz(&[q1.clone()], &[answer(&q1, "paris ")]);
        assert_eq!(report.correct, 0);
        assert_eq!(report.percentage, 0);
    }

    #[test]
    fn test_empty_quiz_scores_zero() {
        let report = grade_quiz(&[], &[]);
        assert_eq!(report.total, 0);
        assert_eq!(report.percentage, 0);
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn test_first_answer_wins_and_unknown_ignored() {
        let q1 = question(1, "A");
        let stray = SubmittedAnswer {
            question_id: Uuid::new_v4(),
            answer: "A".to_string(),
        };
        let report = grade_quiz(
            &[q1.clone()],
            &[answer(&q1, "B"), answer(&q1, "A"), stray],
        );

        assert_eq!(report.correct, 0);
        assert_eq!(report.total, 1);
        assert_eq!(report.outcomes[0].answer, "B");
    }

    #[test]
    fn test_unanswered_is_incorrect_empty() {
        let q1 = question(1, "A");
        let q2 = question(2, "B");
        let report = grade_quiz(&[q1.clone(), q2.clone()], &[answer(&q2, "B")]);

        assert_eq!(report.outcomes[0].question_id, q1.id);
        assert_eq!(report.outcomes[0].answer, "");
        assert!(!report.outcomes[0].is_correct);
        assert!(report.outcomes[1].is_correct);
    }

    #[test]
    fn test_outcomes_follow_question_order() {
        let q1 = question(2, "A");
        let q2 = question(1, "B");
        let report = grade_quiz(&[q1.clone(), q2.clone()], &[]);
        assert_eq!(report.outcomes[0].question_id, q2.id);
        assert_eq!(report.outcomes[1].question_id, q1.id);
    }

    #[test]
    fn test_percentage_rounds_and_never_exceeds_total() {
        let questions: Vec<QuizQuestion> = (1..=3).map(|i| question(i, "A")).collect();
        for hits in 0..=3 {
            let answers: Vec<SubmittedAnswer> =
                questions.iter().take(hits).map(|q| answer(q, "A")).collect();
            let report = grade_quiz(&questions, &answers);
            assert!(report.correct <= report.total);
            assert_eq!(
                report.percentage,
                (100.0 * report.correct as f64 / report.total as f64).round() as i32
            );
        }
    }
}
