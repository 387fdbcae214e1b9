use chrono::Utc;
use diesel::prelude::*;
use log::info;
use uuid::Uuid;

use super::types::{RegisterRequest, UpdateProfileRequest, User, UserChangeset};
use crate::core::shared::schema::users;
use crate::core::shared::{run_blocking, ApiError, ApiResult, DbPool, Pagination};
use crate::security::{hash_password, validate_password, verify_password, Role};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Checks a registration payload and resolves the requested role.
/// Self-registration may pick `student` (default) or `instructor`, never `admin`.
pub fn validate_registration(req: &RegisterRequest) -> ApiResult<Role> {
    let email = normalize_email(&req.email);
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::validation("A valid email address is required"));
    }

    if req.name.trim().is_empty() {
        return Err(ApiError::validation("Name is required"));
    }

    if let Some(issue) = validate_password(&req.password, Some(&email)) {
        return Err(ApiError::Validation(issue));
    }

    let role = match req.role.as_deref() {
        None => Role::Student,
        Some(raw) => raw.parse::<Role>().map_err(ApiError::Validation)?,
    };

    match role {
        Role::Student | Role::Instructor => Ok(role),
        Role::Admin => Err(ApiError::validation(
            "Admin accounts cannot be self-registered",
        )),
        Role::Anonymous => Err(ApiError::validation("Invalid role")),
    }
}

fn hashing_error(e: anyhow::Error) -> ApiError {
    ApiError::internal(format!("Password hashing failed: {e:#}"))
}

pub struct UserEngine {
    db: DbPool,
}

impl UserEngine {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn register(&self, req: RegisterRequest) -> ApiResult<User> {
        let role = validate_registration(&req)?;
        let email = normalize_email(&req.email);

        let user = run_blocking(&self.db, move |conn| {
            let taken: i64 = users::table
                .filter(users::email.eq(&email))
                .count()
                .get_result(conn)?;
            if taken > 0 {
                return Err(ApiError::Conflict("Email already registered".to_string()));
            }

            let now = Utc::now();
            let user = User {
                id: Uuid::new_v4(),
                email,
                password_hash: hash_password(&req.password).map_err(hashing_error)?,
                role: role.as_str().to_string(),
                name: req.name.trim().to_string(),
                bio: None,
                avatar_url: None,
                created_at: now,
                updated_at: now,
            };

            diesel::insert_into(users::table)
                .values(&user)
                .execute(conn)
                .map_err(|e| match ApiError::from(e) {
                    ApiError::Conflict(_) => {
                        ApiError::Conflict("Email already registered".to_string())
                    }
                    other => other,
                })?;

            Ok(user)
        })
        .await?;

        info!("Registered user {} as {}", user.id, user.role);
        Ok(user)
    }

    /// Unknown email and wrong password fail identically.
    pub async fn authenticate(&self, email: &str, password: &str) -> ApiResult<User> {
        let email = normalize_email(email);
        let password = password.to_string();

        run_blocking(&self.db, move |conn| {
            let user = users::table
                .filter(users::email.eq(&email))
                .select(User::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

            if !verify_password(&password, &user.password_hash).map_err(hashing_error)? {
                return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }

            Ok(user)
        })
        .await
    }

    pub async fn get_user(&self, user_id: Uuid) -> ApiResult<User> {
        run_blocking(&self.db, move |conn| {
            users::table
                .find(user_id)
                .select(User::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("User"))
        })
        .await
    }

    pub async fn list_users(&self, pagination: Pagination) -> ApiResult<(Vec<User>, i64)> {
        run_blocking(&self.db, move |conn| {
            let total: i64 = users::table.count().get_result(conn)?;
            let rows = users::table
                .order(users::created_at.desc())
                .limit(pagination.limit())
                .offset(pagination.offset())
                .select(User::as_select())
                .load(conn)?;
            Ok((rows, total))
        })
        .await
    }

    /// A password change needs the current password and passes the same strength rules as registration.
    pub async fn update_profile(&self, user_id: Uuid, req: UpdateProfileRequest) -> ApiResult<User> {
        if let Some(name) = &req.name {
            if name.trim().is_empty() {
                return Err(ApiError::validation("Name must not be empty"));
            }
        }

        run_blocking(&self.db, move |conn| {
            let user = users::table
                .find(user_id)
                .select(User::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("User"))?;

            let password_hash = match req.new_password.as_deref() {
                None => None,
                Some(new_password) => {
                    let current = req.current_password.as_deref().ok_or_else(|| {
                        ApiError::validation("Current password is required to change password")
                    })?;
                    if !verify_password(current, &user.password_hash).map_err(hashing_error)? {
                        return Err(ApiError::Unauthorized(
                            "Current password is incorrect".to_string(),
                        ));
                    }
                    if let Some(issue) = validate_password(new_password, Some(&user.email)) {
                        return Err(ApiError::Validation(issue));
                    }
                    Some(hash_password(new_password).map_err(hashing_error)?)
                }
            };

            let changes = UserChangeset {
                name: req.name.map(|n| n.trim().to_string()),
                bio: req.bio,
                avatar_url: req.avatar_url,
                password_hash,
                role: None,
                updated_at: Some(Utc::now()),
            };

            Ok(diesel::update(users::table.find(user_id))
                .set(&changes)
                .returning(User::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn change_role(&self, user_id: Uuid, role: Role) -> ApiResult<User> {
        if !role.is_assignable() {
            return Err(ApiError::validation("Invalid role"));
        }

        let user = run_blocking(&self.db, move |conn| {
            let changes = UserChangeset {
                role: Some(role.as_str().to_string()),
                updated_at: Some(Utc::now()),
                ..UserChangeset::default()
            };
            diesel::update(users::table.find(user_id))
                .set(&changes)
                .returning(User::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("User"))
        })
        .await?;

        info!("User {} role changed to {}", user.id, user.role);
        Ok(user)
    }

    pub async fn delete_user(&self, user_id: Uuid) -> ApiResult<()> {
        let deleted = run_blocking(&self.db, move |conn| {
            Ok(diesel::delete(users::table.find(user_id)).execute(conn)?)
        })
        .await?;

        if deleted == 0 {
            return Err(ApiError::not_found("User"));
        }
        info!("Deleted user {user_id}");
        Ok(())
    }
}
