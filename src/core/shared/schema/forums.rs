diesel::table! {
    forum_threads (id) {
        id -> Uuid,
        course_id -> Uuid,
        author_id -> Uuid,
        title -> Text,
        body -> Text,
        is_pinned -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    forum_posts (id) {
        id -> Uuid,
        thread_id -> Uuid,
        author_id -> Uuid,
        body -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
