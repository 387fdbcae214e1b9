#[derive(Debug)]
pub struct ApiUrls;

impl ApiUrls {
    pub const HEALTH: &'static str = "/health";
    pub const API_HEALTH: &'static str = "/api/health";

    // Users and auth
    pub const USERS: &'static str = "/api/users";
    pub const USER_REGISTER: &'static str = "/api/users/register";
    pub const USER_LOGIN: &'static str = "/api/users/login";
    pub const USER_REFRESH: &'static str = "/api/users/refresh";
    pub const USER_LOGOUT: &'static str = "/api/users/logout";
    pub const USER_ME: &'static str = "/api/users/me";
    pub const USER_ME_ENROLLMENTS: &'static str = "/api/users/me/enrollments";
    pub const USER_ME_ACHIEVEMENTS: &'static str = "/api/users/me/achievements";
    pub const USER_BY_ID: &'static str = "/api/users/:id";
    pub const USER_ROLE: &'static str = "/api/users/:id/role";
    pub const USER_ACHIEVEMENTS: &'static str = "/api/users/:id/achievements";

    // Courses
    pub const COURSES: &'static str = "/api/courses";
    pub const COURSES_TEACHING: &'static str = "/api/courses/teaching";
    pub const COURSE_BY_ID: &'static str = "/api/courses/:id";
    pub const COURSE_MODULES: &'static str = "/api/courses/:id/modules";
    pub const COURSE_MODULE_BY_ID: &'static str = "/api/courses/:id/modules/:module_id";
    pub const COURSE_REORDER: &'static str = "/api/courses/:id/reorder";
    pub const COURSE_CONTENT: &'static str = "/api/courses/:id/content";
    pub const COURSE_STUDENTS: &'static str = "/api/courses/:id/students";
    pub const COURSE_ENROLLMENT: &'static str = "/api/courses/:id/enrollment";

    // Lessons
    pub const LESSONS: &'static str = "/api/lessons";
    pub const LESSON_BY_ID: &'static str = "/api/lessons/:id";
    pub const LESSON_COMPLETE: &'static str = "/api/lessons/:id/complete";

    // Quizzes
    pub const QUIZZES: &'static str = "/api/quizzes";
    pub const QUIZ_BY_ID: &'static str = "/api/quizzes/:id";
    pub const QUIZ_SUBMIT: &'static str = "/api/quizzes/:id/submit";
    pub const QUIZ_ATTEMPTS: &'static str = "/api/quizzes/:id/attempts";

    // Assignments
    pub const ASSIGNMENTS: &'static str = "/api/assignments";
    pub const ASSIGNMENT_BY_ID: &'static str = "/api/assignments/:id";
    pub const ASSIGNMENT_SUBMIT: &'static str = "/api/assignments/:id/submit";
    pub const ASSIGNMENT_MY_SUBMISSION: &'static str = "/api/assignments/:id/submission";
    pub const ASSIGNMENT_SUBMISSIONS: &'static str = "/api/assignments/:id/submissions";
    pub const SUBMISSION_GRADE: &'static str = "/api/assignments/submissions/:id/grade";

    // Forums
    pub const FORUM_COURSE_THREADS: &'static str = "/api/forums/courses/:course_id/threads";
    pub const FORUM_THREAD_BY_ID: &'static str = "/api/forums/threads/:id";
    pub const FORUM_THREAD_PIN: &'static str = "/api/forums/threads/:id/pin";
    pub const FORUM_THREAD_POSTS: &'static str = "/api/forums/threads/:id/posts";
    pub const FORUM_POST_BY_ID: &'static str = "/api/forums/posts/:id";
}
