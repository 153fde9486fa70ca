use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::User;
use crate::db::types::UserRole;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UserCreate {
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub(crate) name: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserLogin {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AdminUserCreate {
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub(crate) name: String,
    pub(crate) password: String,
    #[serde(default = "default_user_role")]
    pub(crate) role: UserRole,
    #[serde(default)]
    pub(crate) credits: Option<i32>,
    #[serde(default = "default_true")]
    #[serde(alias = "isActive")]
    pub(crate) is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AdminUserUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) password: Option<String>,
    #[serde(default)]
    pub(crate) role: Option<UserRole>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    pub(crate) is_active: Option<bool>,
    #[serde(default)]
    pub(crate) credits: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OnboardingUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255, message = "school must be at most 255 characters"))]
    pub(crate) school: Option<String>,
    #[serde(default)]
    #[serde(alias = "gradeLevel")]
    #[validate(length(max = 64, message = "grade_level must be at most 64 characters"))]
    pub(crate) grade_level: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) name: String,
    pub(crate) role: UserRole,
    pub(crate) credits: i32,
    pub(crate) is_active: bool,
    pub(crate) school: Option<String>,
    pub(crate) grade_level: Option<String>,
    pub(crate) onboarding_completed: bool,
    pub(crate) created_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            credits: user.credits,
            is_active: user.is_active,
            school: user.school,
            grade_level: user.grade_level,
            onboarding_completed: user.onboarding_completed,
            created_at: format_primitive(user.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ProgressResponse {
    pub(crate) attempted: i64,
    pub(crate) solved: i64,
    pub(crate) hints_unlocked: i64,
    pub(crate) credits_spent: i64,
    pub(crate) credits: i32,
    pub(crate) max_credits: i32,
}

fn default_user_role() -> UserRole {
    UserRole::Student
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn signup_requires_valid_email_and_name() {
        let payload: UserCreate = serde_json::from_value(serde_json::json!({
            "email": "not-an-email",
            "name": "",
            "password": "longenough"
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("name"));
    }

    #[test]
    fn admin_create_defaults_to_active_student() {
        let payload: AdminUserCreate = serde_json::from_value(serde_json::json!({
            "email": "s@example.com",
            "name": "S",
            "password": "password123"
        }))
        .unwrap();

        assert_eq!(payload.role, UserRole::Student);
        assert!(payload.is_active);
        assert_eq!(payload.credits, None);
    }
}
