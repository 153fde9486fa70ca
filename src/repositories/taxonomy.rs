use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::TaxonomyEntry;

const COLUMNS: &str = "id, name, created_at, updated_at";

/// The four classification tables share one shape and one link-table layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TaxonomyKind {
    Tag,
    Source,
    Section,
    Theme,
}

impl TaxonomyKind {
    pub(crate) const ALL: [TaxonomyKind; 4] = [Self::Tag, Self::Source, Self::Section, Self::Theme];

    fn table(self) -> &'static str {
        match self {
            Self::Tag => "tags",
            Self::Source => "sources",
            Self::Section => "sections",
            Self::Theme => "themes",
        }
    }

    fn link_table(self) -> &'static str {
        match self {
            Self::Tag => "exercise_tags",
            Self::Source => "exercise_sources",
            Self::Section => "exercise_sections",
            Self::Theme => "exercise_themes",
        }
    }

    fn link_column(self) -> &'static str {
        match self {
            Self::Tag => "tag_id",
            Self::Source => "source_id",
            Self::Section => "section_id",
            Self::Theme => "theme_id",
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Tag => "Tag",
            Self::Source => "Source",
            Self::Section => "Section",
            Self::Theme => "Theme",
        }
    }

    /// Appends `EXISTS (...)` matching exercises linked to an entry by id or name.
    pub(crate) fn push_exists_filter(self, builder: &mut QueryBuilder<'_, Postgres>, value: String) {
        builder.push(format!(
            " AND EXISTS (SELECT 1 FROM {link} l JOIN {table} t ON t.id = l.{column} \
             WHERE l.exercise_id = e.id AND (t.id = ",
            link = self.link_table(),
            table = self.table(),
            column = self.link_column(),
        ));
        builder.push_bind(value.clone());
        builder.push(" OR LOWER(t.name) = LOWER(");
        builder.push_bind(value);
        builder.push(")))");
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct LinkedEntryRow {
    pub(crate) exercise_id: String,
    pub(crate) id: String,
    pub(crate) name: String,
}

pub(crate) async fn list(pool: &PgPool, kind: TaxonomyKind) -> Result<Vec<TaxonomyEntry>, sqlx::Error> {
    sqlx::query_as::<_, TaxonomyEntry>(&format!(
        "SELECT {COLUMNS} FROM {} ORDER BY name",
        kind.table()
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn create(
    pool: &PgPool,
    kind: TaxonomyKind,
    id: &str,
    name: &str,
    now: PrimitiveDateTime,
) -> Result<TaxonomyEntry, sqlx::Error> {
    sqlx::query_as::<_, TaxonomyEntry>(&format!(
        "INSERT INTO {} (id, name, created_at, updated_at) VALUES ($1, $2, $3, $3)
         RETURNING {COLUMNS}",
        kind.table()
    ))
    .bind(id)
    .bind(name)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn rename(
    pool: &PgPool,
    kind: TaxonomyKind,
    id: &str,
    name: &str,
    now: PrimitiveDateTime,
) -> Result<Option<TaxonomyEntry>, sqlx::Error> {
    sqlx::query_as::<_, TaxonomyEntry>(&format!(
        "UPDATE {} SET name = $1, updated_at = $2 WHERE id = $3 RETURNING {COLUMNS}",
        kind.table()
    ))
    .bind(name)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, kind: TaxonomyKind, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", kind.table()))
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns the ids from `ids` that have no row in the kind's table.
pub(crate) async fn find_missing_ids(
    pool: &PgPool,
    kind: TaxonomyKind,
    ids: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let existing = sqlx::query_scalar::<_, String>(&format!(
        "SELECT id FROM {} WHERE id = ANY($1)",
        kind.table()
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(ids.iter().filter(|id| !existing.contains(id)).cloned().collect())
}

pub(crate) async fn replace_links(
    executor: &mut sqlx::Transaction<'_, Postgres>,
    kind: TaxonomyKind,
    exercise_id: &str,
    ids: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!("DELETE FROM {} WHERE exercise_id = $1", kind.link_table()))
        .bind(exercise_id)
        .execute(&mut **executor)
        .await?;

    if ids.is_empty() {
        return Ok(());
    }

    sqlx::query(&format!(
        "INSERT INTO {} (exercise_id, {})
         SELECT $1, UNNEST($2::varchar[])
         ON CONFLICT DO NOTHING",
        kind.link_table(),
        kind.link_column()
    ))
    .bind(exercise_id)
    .bind(ids)
    .execute(&mut **executor)
    .await?;

    Ok(())
}

pub(crate) async fn list_for_exercises(
    pool: &PgPool,
    kind: TaxonomyKind,
    exercise_ids: &[String],
) -> Result<Vec<LinkedEntryRow>, sqlx::Error> {
    if exercise_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, LinkedEntryRow>(&format!(
        "SELECT l.exercise_id, t.id, t.name
         FROM {link} l
         JOIN {table} t ON t.id = l.{column}
         WHERE l.exercise_id = ANY($1)
         ORDER BY t.name",
        link = kind.link_table(),
        table = kind.table(),
        column = kind.link_column(),
    ))
    .bind(exercise_ids)
    .fetch_all(pool)
    .await
}
