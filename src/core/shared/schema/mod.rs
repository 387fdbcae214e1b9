pub mod accounts;
pub mod forums;
pub mod learn;

pub use self::accounts::*;
pub use self::forums::*;
pub use self::learn::*;

diesel::joinable!(courses -> users (instructor_id));
diesel::joinable!(course_modules -> courses (course_id));
diesel::joinable!(lessons -> course_modules (module_id));
diesel::joinable!(quizzes -> course_modules (module_id));
diesel::joinable!(quiz_questions -> quizzes (quiz_id));
diesel::joinable!(quiz_attempts -> quizzes (quiz_id));
diesel::joinable!(quiz_answers -> quiz_attempts (attempt_id));
diesel::joinable!(assignments -> course_modules (module_id));
diesel::joinable!(submissions -> assignments (assignment_id));
diesel::joinable!(progress -> courses (course_id));
diesel::joinable!(lesson_completions -> lessons (lesson_id));
diesel::joinable!(forum_threads -> courses (course_id));
diesel::joinable!(forum_posts -> forum_threads (thread_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    courses,
    course_modules,
    lessons,
    quizzes,
    quiz_questions,
    quiz_attempts,
    quiz_answers,
    assignments,
    submissions,
    progress,
    lesson_completions,
    forum_threads,
    forum_posts,
);
