use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::User;
use crate::db::types::UserRole;

pub(crate) const COLUMNS: &str = "\
    id, email, hashed_password, name, role, credits, is_active, school, grade_level, \
    onboarding_completed, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_by_email(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email.trim().to_lowercase())
        .fetch_one(pool)
        .await
}

pub(crate) struct CreateUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub hashed_password: String,
    pub name: &'a str,
    pub role: UserRole,
    pub credits: i32,
    pub is_active: bool,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, email, hashed_password, name, role, credits, is_active,
            onboarding_completed, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,FALSE,$8,$8)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.email.trim().to_lowercase())
    .bind(params.hashed_password)
    .bind(params.name)
    .bind(params.role)
    .bind(params.credits)
    .bind(params.is_active)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateUser {
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub credits: Option<i32>,
    pub hashed_password: Option<String>,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateUser,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET
            name = COALESCE($1, name),
            role = COALESCE($2, role),
            is_active = COALESCE($3, is_active),
            credits = COALESCE($4, credits),
            hashed_password = COALESCE($5, hashed_password),
            updated_at = $6
         WHERE id = $7
         RETURNING {COLUMNS}",
    ))
    .bind(params.name)
    .bind(params.role)
    .bind(params.is_active)
    .bind(params.credits)
    .bind(params.hashed_password)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct UpdateOnboarding {
    pub name: Option<String>,
    pub school: Option<String>,
    pub grade_level: Option<String>,
    pub updated_at: PrimitiveDateTime,
}

pub(crate) async fn complete_onboarding(
    pool: &PgPool,
    id: &str,
    params: UpdateOnboarding,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET
            name = COALESCE($1, name),
            school = COALESCE($2, school),
            grade_level = COALESCE($3, grade_level),
            onboarding_completed = TRUE,
            updated_at = $4
         WHERE id = $5
         RETURNING {COLUMNS}",
    ))
    .bind(params.name)
    .bind(params.school)
    .bind(params.grade_level)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct ListUsersParams {
    pub(crate) email: Option<String>,
    pub(crate) role: Option<UserRole>,
    pub(crate) is_active: Option<bool>,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

pub(crate) async fn list(pool: &PgPool, params: ListUsersParams) -> Result<Vec<User>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM users WHERE TRUE"));

    if let Some(email) = params.email {
        builder.push(" AND email ILIKE ");
        builder.push_bind(format!("%{}%", email.trim().to_lowercase()));
    }
    if let Some(role) = params.role {
        builder.push(" AND role = ");
        builder.push_bind(role);
    }
    if let Some(is_active) = params.is_active {
        builder.push(" AND is_active = ");
        builder.push_bind(is_active);
    }

    builder.push(" ORDER BY created_at DESC");
    builder.push(" OFFSET ");
    builder.push_bind(params.skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(params.limit.clamp(1, 1000));

    builder.build_query_as::<User>().fetch_all(pool).await
}

/// Locks the user row for the rest of the transaction and returns the balance.
pub(crate) async fn lock_credits(
    executor: &mut sqlx::Transaction<'_, Postgres>,
    id: &str,
) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT credits FROM users WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **executor)
        .await
}

pub(crate) async fn set_credits(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    credits: i32,
    updated_at: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET credits = $1, updated_at = $2 WHERE id = $3")
        .bind(credits)
        .bind(updated_at)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn refill_student_credits(
    pool: &PgPool,
    amount: i32,
    cap: i32,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users
         SET credits = LEAST(credits + $1, $2)
         WHERE role = 'student' AND is_active = TRUE AND credits < $2",
    )
    .bind(amount)
    .bind(cap)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProgressRow {
    pub(crate) attempted: i64,
    pub(crate) solved: i64,
    pub(crate) hints_unlocked: i64,
    pub(crate) credits_spent: i64,
}

pub(crate) async fn progress(pool: &PgPool, id: &str) -> Result<ProgressRow, sqlx::Error> {
    sqlx::query_as::<_, ProgressRow>(
        "SELECT
            (SELECT COUNT(*) FROM solutions WHERE user_id = $1) AS attempted,
            (SELECT COUNT(*) FROM solutions WHERE user_id = $1 AND is_correct) AS solved,
            (SELECT COUNT(*) FROM hint_usages WHERE user_id = $1) AS hints_unlocked,
            (SELECT COALESCE(SUM(cost), 0)::BIGINT FROM hint_usages WHERE user_id = $1)
                AS credits_spent",
    )
    .bind(id)
    .fetch_one(pool)
    .await
}
