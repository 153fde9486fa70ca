use time::PrimitiveDateTime;

use crate::db::models::HintUsage;

const COLUMNS: &str = "id, user_id, exercise_id, level, cost, created_at";

pub(crate) async fn levels_for_user(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    exercise_id: &str,
) -> Result<Vec<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "SELECT level FROM hint_usages WHERE user_id = $1 AND exercise_id = $2 ORDER BY level",
    )
    .bind(user_id)
    .bind(exercise_id)
    .fetch_all(executor)
    .await
}

pub(crate) struct CreateHintUsage<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) exercise_id: &'a str,
    pub(crate) level: i32,
    pub(crate) cost: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn insert(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateHintUsage<'_>,
) -> Result<HintUsage, sqlx::Error> {
    sqlx::query_as::<_, HintUsage>(&format!(
        "INSERT INTO hint_usages (id, user_id, exercise_id, level, cost, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.exercise_id)
    .bind(params.level)
    .bind(params.cost)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}
