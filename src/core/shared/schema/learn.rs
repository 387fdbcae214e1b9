diesel::table! {
    courses (id) {
        id -> Uuid,
        instructor_id -> Uuid,
        title -> Text,
        description -> Nullable<Text>,
        category -> Nullable<Text>,
        level -> Text,
        price_cents -> Int4,
        cover_image_url -> Nullable<Text>,
        preview_video_url -> Nullable<Text>,
        is_published -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    course_modules (id) {
        id -> Uuid,
        course_id -> Uuid,
        title -> Text,
        description -> Nullable<Text>,
        module_order -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    lessons (id) {
        id -> Uuid,
        module_id -> Uuid,
        title -> Text,
        content -> Nullable<Text>,
        content_type -> Text,
        video_url -> Nullable<Text>,
        duration_minutes -> Int4,
        lesson_order -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    quizzes (id) {
        id -> Uuid,
        module_id -> Uuid,
        title -> Text,
        description -> Nullable<Text>,
        quiz_order -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    quiz_questions (id) {
        id -> Uuid,
        quiz_id -> Uuid,
        prompt -> Text,
        question_type -> Text,
        options -> Jsonb,
        correct_answer -> Text,
        question_order -> Int4,
    }
}

diesel::table! {
    quiz_attempts (id) {
        id -> Uuid,
        quiz_id -> Uuid,
        user_id -> Uuid,
        correct_count -> Int4,
        total_count -> Int4,
        percentage -> Int4,
        submitted_at -> Timestamptz,
    }
}

diesel::table! {
    quiz_answers (id) {
        id -> Uuid,
        attempt_id -> Uuid,
        question_id -> Uuid,
        user_id -> Uuid,
        answer -> Text,
        is_correct -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    assignments (id) {
        id -> Uuid,
        module_id -> Uuid,
        title -> Text,
        description -> Nullable<Text>,
        due_date -> Nullable<Timestamptz>,
        max_points -> Int4,
        assignment_order -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    submissions (id) {
        id -> Uuid,
        assignment_id -> Uuid,
        user_id -> Uuid,
        content -> Nullable<Text>,
        attachment_url -> Nullable<Text>,
        status -> Text,
        grade -> Nullable<Int4>,
        feedback -> Nullable<Text>,
        submitted_at -> Timestamptz,
        graded_at -> Nullable<Timestamptz>,
        graded_by -> Nullable<Uuid>,
    }
}

diesel::table! {
    progress (id) {
        id -> Uuid,
        user_id -> Uuid,
        course_id -> Uuid,
        progress_percentage -> Int4,
        completed -> Bool,
        enrolled_at -> Timestamptz,
        updated_at -> Timestamptz,
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    lesson_completions (id) {
        id -> Uuid,
        user_id -> Uuid,
        lesson_id -> Uuid,
        completed_at -> Timestamptz,
    }
}
