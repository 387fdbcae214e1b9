use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::auth_api::{AuthError, AuthenticatedUser, Permission};
use crate::core::urls::ApiUrls;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RbacConfig {
    pub default_deny: bool,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            default_deny: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessDecision {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessDecisionResult {
    pub decision: AccessDecision,
    pub reason: String,
    pub matched_rule: Option<String>,
}

impl AccessDecisionResult {
    pub fn allow(reason: &str) -> Self {
        Self {
            decision: AccessDecision::Allow,
            reason: reason.to_string(),
            matched_rule: None,
        }
    }

    pub fn deny(reason: &str) -> Self {
        Self {
            decision: AccessDecision::Deny,
            reason: reason.to_string(),
            matched_rule: None,
        }
    }

    pub fn with_rule(mut self, rule: String) -> Self {
        self.matched_rule = Some(rule);
        self
    }

    pub fn is_allowed(&self) -> bool {
        self.decision == AccessDecision::Allow
    }
}

/// One row of the route table. Without a capability the route only needs an authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePermission {
    pub path_pattern: String,
    pub method: String,
    pub required_permission: Option<Permission>,
    pub allow_anonymous: bool,
}

impl RoutePermission {
    pub fn new(path_pattern: &str, method: &str) -> Self {
        Self {
            path_pattern: path_pattern.to_string(),
            method: method.to_string(),
            required_permission: None,
            allow_anonymous: false,
        }
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.required_permission = Some(permission);
        self
    }

    pub fn with_anonymous(mut self, allow: bool) -> Self {
        self.allow_anonymous = allow;
        self
    }

    pub fn matches_method(&self, method: &str) -> bool {
        self.method == "*" || self.method.eq_ignore_ascii_case(method)
    }

    /// `:param` matches one segment, `*` matches one segment, a trailing `**` matches the rest.
    pub fn matches_path(&self, path: &str) -> bool {
        let pattern_parts: Vec<&str> = self.path_pattern.trim_end_matches('/').split('/').collect();
        let path_parts: Vec<&str> = path.trim_end_matches('/').split('/').collect();

        for (i, pattern_part) in pattern_parts.iter().enumerate() {
            if *pattern_part == "**" {
                return true;
            }

            let Some(path_part) = path_parts.get(i) else {
                return false;
            };

            if *pattern_part == "*" || pattern_part.starts_with(':') {
                if path_part.is_empty() {
                    return false;
                }
                continue;
            }

            if pattern_part != path_part {
                return false;
            }
        }

        pattern_parts.len() == path_parts.len()
    }
}

/// First-match route table consulted by [`rbac_middleware`] for every request.
pub struct RbacManager {
    config: RbacConfig,
    route_permissions: Arc<RwLock<Vec<RoutePermission>>>,
}

impl RbacManager {
    pub fn new(config: RbacConfig) -> Self {
        Self {
            config,
            route_permissions: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn with_default_routes() -> Self {
        let manager = Self::new(RbacConfig::default());
        manager
            .register_routes(build_default_route_permissions())
            .await;
        manager
    }

    pub async fn register_route(&self, permission: RoutePermission) {
        self.route_permissions.write().await.push(permission);
    }

    pub async fn register_routes(&self, permissions: Vec<RoutePermission>) {
        self.route_permissions.write().await.extend(permissions);
    }

    pub async fn route_count(&self) -> usize {
        self.route_permissions.read().await.len()
    }

    pub async fn check_route_access(
        &self,
        path: &str,
        method: &str,
        user: &AuthenticatedUser,
    ) -> AccessDecisionResult {
        let routes = self.route_permissions.read().await;

        let Some(route) = routes
            .iter()
            .find(|r| r.matches_method(method) && r.matches_path(path))
        else {
            return if self.config.default_deny {
                AccessDecisionResult::deny("No matching route permission found")
            } else {
                AccessDecisionResult::allow("Default allow - no matching rule")
            };
        };

        let rule = format!("{} {}", route.method, route.path_pattern);

        if route.allow_anonymous {
            return AccessDecisionResult::allow("Anonymous access allowed").with_rule(rule);
        }

        if !user.is_authenticated() {
            return AccessDecisionResult::deny("Authentication required").with_rule(rule);
        }

        match route.required_permission {
            Some(permission) if !user.has_permission(&permission) => {
                AccessDecisionResult::deny(&format!("Missing required capability {permission:?}"))
                    .with_rule(rule)
            }
            _ => AccessDecisionResult::allow("Access granted").with_rule(rule),
        }
    }
}

pub async fn rbac_middleware(
    State(rbac): State<Arc<RbacManager>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let method = request.method().to_string();

    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .cloned()
        .unwrap_or_else(AuthenticatedUser::anonymous);

    let decision = rbac.check_route_access(&path, &method, &user).await;

    debug!(
        "RBAC decision for {} {} by user {}: {:?} - {}",
        method, path, user.user_id, decision.decision, decision.reason
    );

    if decision.is_allowed() {
        return next.run(request).await;
    }

    if !user.is_authenticated() {
        return AuthError::MissingToken.into_response();
    }

    AuthError::InsufficientPermissions(decision.reason).into_response()
}

pub fn build_default_route_permissions() -> Vec<RoutePermission> {
    use Permission::*;

    vec![
        RoutePermission::new(ApiUrls::HEALTH, "GET").with_anonymous(true),
        RoutePermission::new(ApiUrls::API_HEALTH, "GET").with_anonymous(true),
        // Users
        RoutePermission::new(ApiUrls::USER_REGISTER, "POST").with_anonymous(true),
        RoutePermission::new(ApiUrls::USER_LOGIN, "POST").with_anonymous(true),
        RoutePermission::new(ApiUrls::USER_REFRESH, "POST").with_anonymous(true),
        RoutePermission::new(ApiUrls::USER_LOGOUT, "POST"),
        RoutePermission::new(ApiUrls::USER_ME, "GET"),
        RoutePermission::new(ApiUrls::USER_ME, "PUT"),
        RoutePermission::new(ApiUrls::USER_ME_ENROLLMENTS, "GET").with_permission(Enroll),
        RoutePermission::new(ApiUrls::USER_ME_ACHIEVEMENTS, "GET"),
        RoutePermission::new(ApiUrls::USERS, "GET").with_permission(ManageUsers),
        RoutePermission::new(ApiUrls::USER_ACHIEVEMENTS, "GET"),
        RoutePermission::new(ApiUrls::USER_ROLE, "PUT").with_permission(ManageUsers),
        RoutePermission::new(ApiUrls::USER_BY_ID, "GET"),
        RoutePermission::new(ApiUrls::USER_BY_ID, "DELETE").with_permission(ManageUsers),
        // Courses; the literal /teaching segment must precede /:id
        RoutePermission::new(ApiUrls::COURSES_TEACHING, "GET").with_permission(AuthorCourses),
        RoutePermission::new(ApiUrls::COURSES, "GET").with_anonymous(true),
        RoutePermission::new(ApiUrls::COURSES, "POST").with_permission(AuthorCourses),
        RoutePermission::new(ApiUrls::COURSE_BY_ID, "GET").with_anonymous(true),
        RoutePermission::new(ApiUrls::COURSE_BY_ID, "PUT").with_permission(AuthorCourses),
        RoutePermission::new(ApiUrls::COURSE_BY_ID, "DELETE").with_permission(AuthorCourses),
        RoutePermission::new(ApiUrls::COURSE_MODULES, "POST").with_permission(AuthorCourses),
        RoutePermission::new(ApiUrls::COURSE_MODULE_BY_ID, "PUT").with_permission(AuthorCourses),
        RoutePermission::new(ApiUrls::COURSE_MODULE_BY_ID, "DELETE")
            .with_permission(AuthorCourses),
        RoutePermission::new(ApiUrls::COURSE_REORDER, "PUT").with_permission(AuthorCourses),
        RoutePermission::new(ApiUrls::COURSE_CONTENT, "GET").with_permission(ConsumeContent),
        RoutePermission::new(ApiUrls::COURSE_STUDENTS, "GET").with_permission(AuthorCourses),
        RoutePermission::new(ApiUrls::COURSE_ENROLLMENT, "*").with_permission(Enroll),
        // Lessons
        RoutePermission::new(ApiUrls::LESSONS, "POST").with_permission(AuthorCourses),
        RoutePermission::new(ApiUrls::LESSON_COMPLETE, "POST").with_permission(ConsumeContent),
        RoutePermission::new(ApiUrls::LESSON_BY_ID, "GET").with_permission(ConsumeContent),
        RoutePermission::new(ApiUrls::LESSON_BY_ID, "PUT").with_permission(AuthorCourses),
        RoutePermission::new(ApiUrls::LESSON_BY_ID, "DELETE").with_permission(AuthorCourses),
        // Quizzes
        RoutePermission::new(ApiUrls::QUIZZES, "POST").with_permission(AuthorCourses),
        RoutePermission::new(ApiUrls::QUIZ_SUBMIT, "POST").with_permission(SubmitWork),
        RoutePermission::new(ApiUrls::QUIZ_ATTEMPTS, "GET").with_permission(ConsumeContent),
        RoutePermission::new(ApiUrls::QUIZ_BY_ID, "GET").with_permission(ConsumeContent),
        RoutePermission::new(ApiUrls::QUIZ_BY_ID, "PUT").with_permission(AuthorCourses),
        RoutePermission::new(ApiUrls::QUIZ_BY_ID, "DELETE").with_permission(AuthorCourses),
        // Assignments; the literal /submissions segment must precede /:id
        RoutePermission::new(ApiUrls::SUBMISSION_GRADE, "PUT").with_permission(GradeSubmissions),
        RoutePermission::new(ApiUrls::ASSIGNMENTS, "POST").with_permission(AuthorCourses),
        RoutePermission::new(ApiUrls::ASSIGNMENT_SUBMIT, "POST").with_permission(SubmitWork),
        RoutePermission::new(ApiUrls::ASSIGNMENT_MY_SUBMISSION, "GET").with_permission(SubmitWork),
        RoutePermission::new(ApiUrls::ASSIGNMENT_SUBMISSIONS, "GET")
            .with_permission(GradeSubmissions),
        RoutePermission::new(ApiUrls::ASSIGNMENT_BY_ID, "GET").with_permission(ConsumeContent),
        RoutePermission::new(ApiUrls::ASSIGNMENT_BY_ID, "PUT").with_permission(AuthorCourses),
        RoutePermission::new(ApiUrls::ASSIGNMENT_BY_ID, "DELETE").with_permission(AuthorCourses),
        // Forums
        RoutePermission::new(ApiUrls::FORUM_COURSE_THREADS, "GET").with_permission(Discuss),
        RoutePermission::new(ApiUrls::FORUM_COURSE_THREADS, "POST").with_permission(Discuss),
        RoutePermission::new(ApiUrls::FORUM_THREAD_PIN, "PUT").with_permission(ModerateForums),
        RoutePermission::new(ApiUrls::FORUM_THREAD_POSTS, "POST").with_permission(Discuss),
        RoutePermission::new(ApiUrls::FORUM_THREAD_BY_ID, "GET").with_permission(Discuss),
        RoutePermission::new(ApiUrls::FORUM_THREAD_BY_ID, "DELETE").with_permission(Discuss),
        RoutePermission::new(ApiUrls::FORUM_POST_BY_ID, "PUT").with_permission(Discuss),
        RoutePermission::new(ApiUrls::FORUM_POST_BY_ID, "DELETE").with_permission(Discuss),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::auth_api::Role;
    use uuid::Uuid;

    fn user(role: Role) -> AuthenticatedUser {
        AuthenticatedUser::new(Uuid::new_v4(), role)
    }

    async fn manager() -> RbacManager {
        RbacManager::with_default_routes().await
    }

    #[test]
    fn test_route_permission_exact_match() {
        let route = RoutePermission::new("/api/users", "GET");

        assert!(route.matches_path("/api/users"));
        assert!(route.matches_path("/api/users/"));
        assert!(!route.matches_path("/api/users/123"));
        assert!(!route.matches_path("/api/user"));
    }

    #[test]
    fn test_route_permission_param_match() {
        let route = RoutePermission::new("/api/courses/:id/modules/:module_id", "PUT");

        assert!(route.matches_path("/api/courses/1/modules/2"));
        assert!(!route.matches_path("/api/courses/1/modules"));
        assert!(!route.matches_path("/api/courses/1/modules/2/lessons"));
        assert!(!route.matches_path("/api/courses//modules/2"));
    }

    #[test]
    fn test_route_permission_wildcards() {
        let rest = RoutePermission::new("/api/forums/**", "GET");
        assert!(rest.matches_path("/api/forums/threads/1"));
        assert!(rest.matches_path("/api/forums"));
        assert!(!rest.matches_path("/api/courses"));

        let single = RoutePermission::new("/api/*/info", "GET");
        assert!(single.matches_path("/api/users/info"));
        assert!(!single.matches_path("/api/users/x/info"));
    }

    #[test]
    fn test_method_matching() {
        let any = RoutePermission::new("/api/courses/:id/enrollment", "*");
        assert!(any.matches_method("DELETE"));
        let get = RoutePermission::new("/api/courses", "get");
        assert!(get.matches_method("GET"));
        assert!(!get.matches_method("POST"));
    }

    #[tokio::test]
    async fn test_catalog_is_public() {
        let rbac = manager().await;
        let anon = AuthenticatedUser::anonymous();

        assert!(rbac
            .check_route_access("/api/courses", "GET", &anon)
            .await
            .is_allowed());
        assert!(rbac
            .check_route_access(&format!("/api/courses/{}", Uuid::new_v4()), "GET", &anon)
            .await
            .is_allowed());
    }

    #[tokio::test]
    async fn test_anonymous_denied_on_protected_route() {
        let rbac = manager().await;
        let result = rbac
            .check_route_access("/api/courses/1/enrollment", "POST", &AuthenticatedUser::anonymous())
            .await;

        assert!(!result.is_allowed());
        assert_eq!(result.reason, "Authentication required");
    }

    #[tokio::test]
    async fn test_student_cannot_author() {
        let rbac = manager().await;
        let student = user(Role::Student);

        assert!(!rbac
            .check_route_access("/api/courses", "POST", &student)
            .await
            .is_allowed());
        assert!(!rbac
            .check_route_access("/api/courses/teaching", "GET", &student)
            .await
            .is_allowed());
        assert!(!rbac
            .check_route_access("/api/assignments/submissions/1/grade", "PUT", &student)
            .await
            .is_allowed());
        assert!(rbac
            .check_route_access("/api/courses/1/enrollment", "POST", &student)
            .await
            .is_allowed());
        assert!(rbac
            .check_route_access("/api/quizzes/1/submit", "POST", &student)
            .await
            .is_allowed());
    }

    #[tokio::test]
    async fn test_instructor_and_admin_capabilities() {
        let rbac = manager().await;
        let instructor = user(Role::Instructor);
        let admin = user(Role::Admin);

        assert!(rbac
            .check_route_access("/api/courses", "POST", &instructor)
            .await
            .is_allowed());
        assert!(rbac
            .check_route_access("/api/forums/threads/1/pin", "PUT", &instructor)
            .await
            .is_allowed());
        assert!(!rbac
            .check_route_access("/api/users", "GET", &instructor)
            .await
            .is_allowed());
        assert!(rbac
            .check_route_access("/api/users", "GET", &admin)
            .await
            .is_allowed());
        assert!(rbac
            .check_route_access("/api/users/1/role", "PUT", &admin)
            .await
            .is_allowed());
    }

    #[tokio::test]
    async fn test_unknown_route_denied_by_default() {
        let rbac = manager().await;
        let result = rbac
            .check_route_access("/api/unknown", "GET", &user(Role::Admin))
            .await;
        assert!(!result.is_allowed());
        assert!(result.matched_rule.is_none());
    }

    #[tokio::test]
    async fn test_default_allow_when_configured() {
        let rbac = RbacManager::new(RbacConfig {
            default_deny: false,
        });
        assert!(rbac
            .check_route_access("/anything", "GET", &AuthenticatedUser::anonymous())
            .await
            .is_allowed());
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let rbac = RbacManager::new(RbacConfig::default());
        rbac.register_route(RoutePermission::new("/api/x/:id", "GET").with_anonymous(true))
            .await;
        rbac.register_route(RoutePermission::new("/api/x/:id", "GET").with_permission(Permission::ManageUsers))
            .await;

        let result = rbac
            .check_route_access("/api/x/1", "GET", &AuthenticatedUser::anonymous())
            .await;
        assert!(result.is_allowed());
        assert_eq!(result.matched_rule.as_deref(), Some("GET /api/x/:id"));
        assert_eq!(rbac.route_count().await, 2);
    }
}
