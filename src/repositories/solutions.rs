use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Solution;
use crate::db::types::ReviewStatus;

pub(crate) const COLUMNS: &str = "\
    id, user_id, exercise_id, answer_text, image_key, submitted_answers, correct_count, \
    is_correct, review_status, review_comment, reviewed_by, reviewed_at, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Solution>, sqlx::Error> {
    sqlx::query_as::<_, Solution>(&format!("SELECT {COLUMNS} FROM solutions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_for_user_exercise(
    pool: &PgPool,
    user_id: &str,
    exercise_id: &str,
) -> Result<Option<Solution>, sqlx::Error> {
    sqlx::query_as::<_, Solution>(&format!(
        "SELECT {COLUMNS} FROM solutions WHERE user_id = $1 AND exercise_id = $2"
    ))
    .bind(user_id)
    .bind(exercise_id)
    .fetch_optional(pool)
    .await
}

/// Creates an empty solution row if none exists, then locks it.
pub(crate) async fn lock_or_create(
    executor: &mut sqlx::Transaction<'_, Postgres>,
    new_id: &str,
    user_id: &str,
    exercise_id: &str,
    now: PrimitiveDateTime,
) -> Result<Solution, sqlx::Error> {
    sqlx::query(
        "INSERT INTO solutions (id, user_id, exercise_id, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $4)
         ON CONFLICT (user_id, exercise_id) DO NOTHING",
    )
    .bind(new_id)
    .bind(user_id)
    .bind(exercise_id)
    .bind(now)
    .execute(&mut **executor)
    .await?;

    sqlx::query_as::<_, Solution>(&format!(
        "SELECT {COLUMNS} FROM solutions WHERE user_id = $1 AND exercise_id = $2 FOR UPDATE"
    ))
    .bind(user_id)
    .bind(exercise_id)
    .fetch_one(&mut **executor)
    .await
}

pub(crate) struct GradingUpdate {
    pub(crate) submitted_answers: Vec<Option<String>>,
    pub(crate) correct_count: i32,
    pub(crate) is_correct: bool,
}

pub(crate) struct SubmissionUpdate {
    pub(crate) answer_text: Option<String>,
    pub(crate) image_key: Option<String>,
    pub(crate) grading: Option<GradingUpdate>,
}

/// Applies a submission to a locked row. A resubmission goes back to review.
pub(crate) async fn apply_submission(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    params: SubmissionUpdate,
    now: PrimitiveDateTime,
) -> Result<Solution, sqlx::Error> {
    let (submitted, correct_count, is_correct) = match params.grading {
        Some(grading) => (
            Some(Json(grading.submitted_answers)),
            Some(grading.correct_count),
            Some(grading.is_correct),
        ),
        None => (None, None, None),
    };

    sqlx::query_as::<_, Solution>(&format!(
        "UPDATE solutions SET
            answer_text = COALESCE($1, answer_text),
            image_key = COALESCE($2, image_key),
            submitted_answers = COALESCE($3, submitted_answers),
            correct_count = COALESCE($4, correct_count),
            is_correct = COALESCE($5, is_correct),
            review_status = 'pending',
            review_comment = NULL,
            reviewed_by = NULL,
            reviewed_at = NULL,
            updated_at = $6
         WHERE id = $7
         RETURNING {COLUMNS}"
    ))
    .bind(params.answer_text)
    .bind(params.image_key)
    .bind(submitted)
    .bind(correct_count)
    .bind(is_correct)
    .bind(now)
    .bind(id)
    .fetch_one(executor)
    .await
}

/// Stores the outcome of a single-blank answer without touching review state.
pub(crate) async fn update_grading(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    grading: GradingUpdate,
    now: PrimitiveDateTime,
) -> Result<Solution, sqlx::Error> {
    sqlx::query_as::<_, Solution>(&format!(
        "UPDATE solutions SET
            submitted_answers = $1,
            correct_count = $2,
            is_correct = $3,
            updated_at = $4
         WHERE id = $5
         RETURNING {COLUMNS}"
    ))
    .bind(Json(grading.submitted_answers))
    .bind(grading.correct_count)
    .bind(grading.is_correct)
    .bind(now)
    .bind(id)
    .fetch_one(executor)
    .await
}

#[derive(Debug, Default)]
pub(crate) struct ListSolutionsParams {
    pub(crate) user_id: Option<String>,
    pub(crate) exercise_id: Option<String>,
    pub(crate) status: Option<ReviewStatus>,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

pub(crate) async fn list(
    pool: &PgPool,
    params: ListSolutionsParams,
) -> Result<Vec<Solution>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM solutions WHERE TRUE"));

    if let Some(user_id) = params.user_id {
        builder.push(" AND user_id = ");
        builder.push_bind(user_id);
    }
    if let Some(exercise_id) = params.exercise_id {
        builder.push(" AND exercise_id = ");
        builder.push_bind(exercise_id);
    }
    if let Some(status) = params.status {
        builder.push(" AND review_status = ");
        builder.push_bind(status);
    }

    builder.push(" ORDER BY updated_at DESC, id");
    builder.push(" OFFSET ");
    builder.push_bind(params.skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(params.limit.clamp(1, 1000));

    builder.build_query_as::<Solution>().fetch_all(pool).await
}

pub(crate) struct ReviewSolution<'a> {
    pub(crate) status: ReviewStatus,
    pub(crate) comment: Option<&'a str>,
    pub(crate) reviewed_by: &'a str,
    pub(crate) reviewed_at: PrimitiveDateTime,
}

pub(crate) async fn update_review(
    pool: &PgPool,
    id: &str,
    params: ReviewSolution<'_>,
) -> Result<Option<Solution>, sqlx::Error> {
    sqlx::query_as::<_, Solution>(&format!(
        "UPDATE solutions SET
            review_status = $1,
            review_comment = $2,
            reviewed_by = $3,
            reviewed_at = $4,
            updated_at = $4
         WHERE id = $5
         RETURNING {COLUMNS}"
    ))
    .bind(params.status)
    .bind(params.comment)
    .bind(params.reviewed_by)
    .bind(params.reviewed_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM solutions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Exercise ids among `exercise_ids` that the user has completed.
pub(crate) async fn completed_exercise_ids(
    pool: &PgPool,
    user_id: &str,
    exercise_ids: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    if exercise_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_scalar::<_, String>(
        "SELECT exercise_id FROM solutions
         WHERE user_id = $1 AND exercise_id = ANY($2) AND is_correct",
    )
    .bind(user_id)
    .bind(exercise_ids)
    .fetch_all(pool)
    .await
}

/// Locks every solution of an exercise; used when its answer key changes.
pub(crate) async fn lock_by_exercise(
    executor: &mut sqlx::Transaction<'_, Postgres>,
    exercise_id: &str,
) -> Result<Vec<Solution>, sqlx::Error> {
    sqlx::query_as::<_, Solution>(&format!(
        "SELECT {COLUMNS} FROM solutions WHERE exercise_id = $1 ORDER BY id FOR UPDATE"
    ))
    .bind(exercise_id)
    .fetch_all(&mut **executor)
    .await
}
