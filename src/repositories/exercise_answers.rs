use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::ExerciseAnswer;

const COLUMNS: &str = "id, user_id, exercise_id, answer_index, answer, is_correct, created_at";

pub(crate) struct CreateExerciseAnswer<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) exercise_id: &'a str,
    pub(crate) answer_index: i32,
    pub(crate) answer: &'a str,
    pub(crate) is_correct: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn insert(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateExerciseAnswer<'_>,
) -> Result<ExerciseAnswer, sqlx::Error> {
    sqlx::query_as::<_, ExerciseAnswer>(&format!(
        "INSERT INTO exercise_answers (
            id, user_id, exercise_id, answer_index, answer, is_correct, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.exercise_id)
    .bind(params.answer_index)
    .bind(params.answer)
    .bind(params.is_correct)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

/// Attempt history, oldest first.
pub(crate) async fn list_for_user_exercise(
    pool: &PgPool,
    user_id: &str,
    exercise_id: &str,
) -> Result<Vec<ExerciseAnswer>, sqlx::Error> {
    sqlx::query_as::<_, ExerciseAnswer>(&format!(
        "SELECT {COLUMNS} FROM exercise_answers
         WHERE user_id = $1 AND exercise_id = $2
         ORDER BY created_at, answer_index"
    ))
    .bind(user_id)
    .bind(exercise_id)
    .fetch_all(pool)
    .await
}

/// Every attempt on an exercise, for re-grading after the key changes.
pub(crate) async fn list_for_exercise(
    executor: impl sqlx::PgExecutor<'_>,
    exercise_id: &str,
) -> Result<Vec<ExerciseAnswer>, sqlx::Error> {
    sqlx::query_as::<_, ExerciseAnswer>(&format!(
        "SELECT {COLUMNS} FROM exercise_answers WHERE exercise_id = $1 FOR UPDATE"
    ))
    .bind(exercise_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn set_correctness(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[String],
    is_correct: bool,
) -> Result<u64, sqlx::Error> {
    if ids.is_empty() {
        return Ok(0);
    }
    let result = sqlx::query("UPDATE exercise_answers SET is_correct = $1 WHERE id = ANY($2)")
        .bind(is_correct)
        .bind(ids)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
