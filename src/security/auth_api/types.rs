use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Capabilities a route or operation can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Enroll,
    ConsumeContent,
    SubmitWork,
    Discuss,
    AuthorCourses,
    GradeSubmissions,
    ModerateForums,
    ManageUsers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Anonymous,
    Student,
    Instructor,
    Admin,
}

impl Role {
    pub fn permissions(&self) -> HashSet<Permission> {
        match self {
            Self::Anonymous => HashSet::new(),
            Self::Student => {
                let mut perms = Self::Anonymous.permissions();
                perms.insert(Permission::Enroll);
                perms.insert(Permission::ConsumeContent);
                perms.insert(Permission::SubmitWork);
                perms.insert(Permission::Discuss);
                perms
            }
            Self::Instructor => {
                let mut perms = Self::Student.permissions();
                perms.insert(Permission::AuthorCourses);
                perms.insert(Permission::GradeSubmissions);
                perms.insert(Permission::ModerateForums);
                perms
            }
            Self::Admin => {
                let mut perms = Self::Instructor.permissions();
                perms.insert(Permission::ManageUsers);
                perms
            }
        }
    }

    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.permissions().contains(permission)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Student => "student",
            Self::Instructor => "instructor",
            Self::Admin => "admin",
        }
    }

    /// Roles a stored user row may carry.
    pub fn is_assignable(&self) -> bool {
        !matches!(self, Self::Anonymous)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anonymous" => Ok(Self::Anonymous),
            "student" => Ok(Self::Student),
            "instructor" => Ok(Self::Instructor),
            "admin" => Ok(Self::Admin),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// The caller as seen by handlers, placed in request extensions by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Role,
}

impl Default for AuthenticatedUser {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl AuthenticatedUser {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            email: None,
            role,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            user_id: Uuid::nil(),
            email: None,
            role: Role::Anonymous,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.role.has_permission(permission)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_authenticated(&self) -> bool {
        self.role != Role::Anonymous && self.user_id != Uuid::nil()
    }

    /// Owner-or-admin check used for resources with a single owning user.
    pub fn can_manage(&self, owner_id: Uuid) -> bool {
        self.is_admin() || (self.is_authenticated() && self.user_id == owner_id)
    }
}
