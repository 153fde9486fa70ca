use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::pagination::default_limit;
use crate::api::validation::{normalize_email, validate_password_len};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::user::{
    AdminUserCreate, AdminUserUpdate, OnboardingUpdate, ProgressResponse, UserResponse,
};
use crate::services::credits::{clamp_credits, MAX_CREDITS};


#[derive(Debug, Deserialize)]
pub(crate) struct UserListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<UserRole>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    is_active: Option<bool>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/me/onboarding", patch(complete_onboarding))
        .route("/me/progress", get(my_progress))
        .route("/", get(list_users).post(create_user))
        .route("/:user_id", get(get_user).patch(update_user))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn complete_onboarding(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<OnboardingUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let updated = repositories::users::complete_onboarding(
        state.db(),
        &user.id,
        repositories::users::UpdateOnboarding {
            name: trimmed(payload.name),
            school: trimmed(payload.school),
            grade_level: trimmed(payload.grade_level),
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update onboarding profile"))?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from_db(updated)))
}

async fn my_progress(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let progress = repositories::users::progress(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load progress"))?;

    Ok(Json(ProgressResponse {
        attempted: progress.attempted,
        solved: progress.solved,
        hints_unlocked: progress.hints_unlocked,
        credits_spent: progress.credits_spent,
        credits: user.credits,
        max_credits: MAX_CREDITS,
    }))
}

async fn list_users(
    Query(params): Query<UserListQuery>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = repositories::users::list(
        state.db(),
        repositories::users::ListUsersParams {
            email: params.email,
            role: params.role,
            is_active: params.is_active,
            skip: params.skip,
            limit: params.limit,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    Ok(Json(users.into_iter().map(UserResponse::from_db).collect()))
}

async fn get_user(
    Path(user_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = fetch_user(&state, &user_id).await?;
    Ok(Json(UserResponse::from_db(user)))
}

async fn create_user(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AdminUserCreate>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    payload.validate().map_err(ApiError::validation)?;
    let email = normalize_email(&payload.email)?;
    validate_password_len(&payload.password)?;

    if payload.role.is_staff() && admin.role != UserRole::Superadmin {
        return Err(ApiError::Forbidden("Only a superadmin can create admin accounts"));
    }

    let exists = repositories::users::exists_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if exists {
        return Err(ApiError::Conflict("User with this email already exists".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    let credits = clamp_credits(
        payload.credits.unwrap_or(state.settings().credits().initial_credits),
    );

    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email: &email,
            hashed_password,
            name: payload.name.trim(),
            role: payload.role,
            credits,
            is_active: payload.is_active,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if repositories::is_unique_violation(&e) {
            ApiError::Conflict("User with this email already exists".to_string())
        } else {
            ApiError::internal(e, "Failed to create user")
        }
    })?;

    tracing::info!(
        action = "user_create",
        admin_id = %admin.id,
        user_id = %user.id,
        role = ?user.role,
        "Admin created user"
    );

    Ok((StatusCode::CREATED, Json(UserResponse::from_db(user))))
}

async fn update_user(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AdminUserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;
    let target = fetch_user(&state, &user_id).await?;

    let is_superadmin = admin.role == UserRole::Superadmin;
    if !is_superadmin {
        if payload.role.is_some_and(|role| role != target.role) {
            return Err(ApiError::Forbidden("Only a superadmin can change roles"));
        }
        if target.role.is_staff() && target.id != admin.id {
            return Err(ApiError::Forbidden("Only a superadmin can modify admin accounts"));
        }
    }

    let hashed_password = match payload.password.as_deref() {
        Some(password) => {
            validate_password_len(password)?;
            Some(
                security::hash_password(password)
                    .map_err(|e| ApiError::internal(e, "Failed to hash password"))?,
            )
        }
        None => None,
    };

    let updated = repositories::users::update(
        state.db(),
        &target.id,
        repositories::users::UpdateUser {
            name: trimmed(payload.name),
            role: payload.role,
            is_active: payload.is_active,
            credits: payload.credits.map(clamp_credits),
            hashed_password,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update user"))?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(
        action = "user_update",
        admin_id = %admin.id,
        user_id = %updated.id,
        "Admin updated user"
    );

    Ok(Json(UserResponse::from_db(updated)))
}

async fn fetch_user(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    repositories::users::find_by_id(state.db(), user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string())
}
