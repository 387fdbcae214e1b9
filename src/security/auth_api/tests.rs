#[cfg(test)]
mod tests {
    use super::super::types::*;
    use super::super::utils::{extract_cookie, extract_token, is_jwt_format};
    use super::super::*;
    use crate::security::jwt::JwtManager;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::IntoResponse;
    use uuid::Uuid;

    fn manager() -> JwtManager {
        JwtManager::from_secret("this-is-a-very-long-secret-key-for-testing-purposes-only")
            .expect("Failed to create manager")
    }

    #[test]
    fn test_role_permissions() {
        assert!(Role::Anonymous.permissions().is_empty());
        assert!(!Role::Anonymous.has_permission(&Permission::Enroll));

        assert!(Role::Student.has_permission(&Permission::Enroll));
        assert!(Role::Student.has_permission(&Permission::SubmitWork));
        assert!(!Role::Student.has_permission(&Permission::AuthorCourses));
        assert!(!Role::Student.has_permission(&Permission::GradeSubmissions));

        assert!(Role::Instructor.has_permission(&Permission::AuthorCourses));
        assert!(Role::Instructor.has_permission(&Permission::ModerateForums));
        assert!(!Role::Instructor.has_permission(&Permission::ManageUsers));

        assert!(Role::Admin.has_permission(&Permission::ManageUsers));
        assert!(Role::Admin.has_permission(&Permission::Enroll));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Instructor".parse::<Role>(), Ok(Role::Instructor));
        assert_eq!(" admin ".parse::<Role>(), Ok(Role::Admin));
        assert!("superuser".parse::<Role>().is_err());
        assert_eq!(Role::Student.to_string(), "student");
        assert!(!Role::Anonymous.is_assignable());
    }

    #[test]
    fn test_anonymous_user() {
        let anon = AuthenticatedUser::anonymous();
        assert!(!anon.is_authenticated());
        assert!(!anon.can_manage(Uuid::nil()));
        assert!(!anon.has_permission(&Permission::ConsumeContent));
    }

    #[test]
    fn test_can_manage() {
        let owner_id = Uuid::new_v4();
        let owner = AuthenticatedUser::new(owner_id, Role::Instructor);
        let other = AuthenticatedUser::new(Uuid::new_v4(), Role::Instructor);
        let admin = AuthenticatedUser::new(Uuid::new_v4(), Role::Admin);

        assert!(owner.can_manage(owner_id));
        assert!(!other.can_manage(owner_id));
        assert!(admin.can_manage(owner_id));
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(AuthError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::ExpiredToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::InsufficientPermissions("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::InsufficientPermissions("x".into())
                .into_response()
                .status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_anonymous_paths() {
        let config = AuthConfig::default();
        assert!(config.is_anonymous_allowed("/health"));
        assert!(config.is_anonymous_allowed("/api/users/login"));
        assert!(!config.is_anonymous_allowed("/api/users/me"));
        assert!(!config.is_anonymous_allowed("/api/users/loginx"));
    }

    #[test]
    fn test_token_from_header_wins_over_cookie() {
        let config = AuthConfig::default();
        let request = Request::builder()
            .uri("/api/users/me")
            .header(header::AUTHORIZATION, "Bearer header.token.value")
            .header(header::COOKIE, "learnova_token=cookie.token.value")
            .body(Body::empty())
            .expect("request");

        assert_eq!(
            extract_token(request.headers(), &config).as_deref(),
            Some("header.token.value")
        );
    }

    #[test]
    fn test_token_from_cookie() {
        let config = AuthConfig::default();
        let request = Request::builder()
            .uri("/api/users/me")
            .header(header::COOKIE, "theme=dark; learnova_token=cookie.token.value")
            .body(Body::empty())
            .expect("request");

        assert_eq!(
            extract_token(request.headers(), &config).as_deref(),
            Some("cookie.token.value")
        );
        assert_eq!(extract_cookie(request.headers(), "theme").as_deref(), Some("dark"));
        assert_eq!(extract_cookie(request.headers(), "missing"), None);
    }

    #[test]
    fn test_is_jwt_format() {
        assert!(is_jwt_format("a.b.c"));
        assert!(!is_jwt_format("a.b"));
        assert!(!is_jwt_format("a..c"));
    }

    #[tokio::test]
    async fn test_authenticate_valid_token() {
        let jwt = manager();
        let user_id = Uuid::new_v4();
        let pair = jwt
            .generate_token_pair(user_id, "grace@example.com", "instructor")
            .expect("pair");

        let user = authenticate_token(&pair.access_token, &jwt)
            .await
            .expect("authenticated");
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.role, Role::Instructor);
        assert_eq!(user.email.as_deref(), Some("grace@example.com"));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_refresh_and_revoked_tokens() {
        let jwt = manager();
        let pair = jwt
            .generate_token_pair(Uuid::new_v4(), "a@b.c", "student")
            .expect("pair");

        assert!(matches!(
            authenticate_token(&pair.refresh_token, &jwt).await,
            Err(AuthError::InvalidToken)
        ));

        jwt.revoke_by_token(&pair.access_token).await.expect("revoke");
        assert!(matches!(
            authenticate_token(&pair.access_token, &jwt).await,
            Err(AuthError::RevokedToken)
        ));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_anonymous_role_claim() {
        let jwt = manager();
        let pair = jwt
            .generate_token_pair(Uuid::new_v4(), "a@b.c", "anonymous")
            .expect("pair");

        assert!(matches!(
            authenticate_token(&pair.access_token, &jwt).await,
            Err(AuthError::InvalidToken)
        ));
    }
}
