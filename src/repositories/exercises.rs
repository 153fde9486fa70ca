use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Exercise;
use crate::db::types::DifficultyLevel;
use crate::repositories::taxonomy::TaxonomyKind;

pub(crate) const COLUMNS: &str = "\
    e.id, e.title, e.problem_text, e.problem_image_key, e.solution_text, e.hint_1, e.hint_2, \
    e.hint_3, e.correct_answers, e.difficulty, e.created_by, e.created_at, e.updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExerciseListRow {
    #[sqlx(flatten)]
    pub(crate) exercise: Exercise,
    pub(crate) total_count: i64,
}

pub(crate) struct CreateExercise<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) problem_text: &'a str,
    pub(crate) problem_image_key: Option<&'a str>,
    pub(crate) solution_text: Option<&'a str>,
    pub(crate) hints: [Option<&'a str>; 3],
    pub(crate) correct_answers: Vec<String>,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) created_by: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateExercise<'_>,
) -> Result<Exercise, sqlx::Error> {
    sqlx::query_as::<_, Exercise>(&format!(
        "INSERT INTO exercises AS e (
            id, title, problem_text, problem_image_key, solution_text,
            hint_1, hint_2, hint_3, correct_answers, difficulty, created_by,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$12)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.problem_text)
    .bind(params.problem_image_key)
    .bind(params.solution_text)
    .bind(params.hints[0])
    .bind(params.hints[1])
    .bind(params.hints[2])
    .bind(Json(params.correct_answers))
    .bind(params.difficulty)
    .bind(params.created_by)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Exercise>, sqlx::Error> {
    sqlx::query_as::<_, Exercise>(&format!("SELECT {COLUMNS} FROM exercises e WHERE e.id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

#[derive(Default)]
pub(crate) struct UpdateExercise {
    pub(crate) title: Option<String>,
    pub(crate) problem_text: Option<String>,
    pub(crate) problem_image_key: Option<String>,
    pub(crate) solution_text: Option<String>,
    pub(crate) hint_1: Option<String>,
    pub(crate) hint_2: Option<String>,
    pub(crate) hint_3: Option<String>,
    pub(crate) correct_answers: Option<Vec<String>>,
    pub(crate) difficulty: Option<DifficultyLevel>,
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    params: UpdateExercise,
    updated_at: PrimitiveDateTime,
) -> Result<Option<Exercise>, sqlx::Error> {
    sqlx::query_as::<_, Exercise>(&format!(
        "UPDATE exercises e SET
            title = COALESCE($1, e.title),
            problem_text = COALESCE($2, e.problem_text),
            problem_image_key = COALESCE($3, e.problem_image_key),
            solution_text = COALESCE($4, e.solution_text),
            hint_1 = COALESCE($5, e.hint_1),
            hint_2 = COALESCE($6, e.hint_2),
            hint_3 = COALESCE($7, e.hint_3),
            correct_answers = COALESCE($8, e.correct_answers),
            difficulty = COALESCE($9, e.difficulty),
            updated_at = $10
         WHERE e.id = $11
         RETURNING {COLUMNS}"
    ))
    .bind(params.title)
    .bind(params.problem_text)
    .bind(params.problem_image_key)
    .bind(params.solution_text)
    .bind(params.hint_1)
    .bind(params.hint_2)
    .bind(params.hint_3)
    .bind(params.correct_answers.map(Json))
    .bind(params.difficulty)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM exercises WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Default)]
pub(crate) struct ListExercisesParams {
    pub(crate) tag: Option<String>,
    pub(crate) source: Option<String>,
    pub(crate) section: Option<String>,
    pub(crate) theme: Option<String>,
    pub(crate) difficulty: Option<DifficultyLevel>,
    pub(crate) search: Option<String>,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

pub(crate) async fn list(
    pool: &PgPool,
    params: &ListExercisesParams,
) -> Result<Vec<ExerciseListRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS}, COUNT(*) OVER() AS total_count FROM exercises e WHERE TRUE"
    ));
    push_filters(&mut builder, params);

    builder.push(" ORDER BY e.created_at DESC, e.id");
    builder.push(" OFFSET ");
    builder.push_bind(params.skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(params.limit.clamp(1, 100));

    builder.build_query_as::<ExerciseListRow>().fetch_all(pool).await
}

/// Total matching `params`, ignoring pagination.
pub(crate) async fn count(pool: &PgPool, params: &ListExercisesParams) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM exercises e WHERE TRUE");
    push_filters(&mut builder, params);

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, params: &ListExercisesParams) {
    let filters = [
        (TaxonomyKind::Tag, &params.tag),
        (TaxonomyKind::Source, &params.source),
        (TaxonomyKind::Section, &params.section),
        (TaxonomyKind::Theme, &params.theme),
    ];
    for (kind, value) in filters {
        if let Some(value) = value.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
            kind.push_exists_filter(builder, value.to_string());
        }
    }

    if let Some(difficulty) = params.difficulty {
        builder.push(" AND e.difficulty = ");
        builder.push_bind(difficulty);
    }
    if let Some(search) = params.search.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        builder.push(" AND (e.title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR e.problem_text ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

/// Escapes `ILIKE` wildcards; backslash is the default escape character.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("v_0"), "v\\_0");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("Free fall"), "Free fall");
    }
}
