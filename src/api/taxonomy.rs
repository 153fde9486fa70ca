use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::taxonomy::TaxonomyKind;
use crate::schemas::taxonomy::{TaxonomyResponse, TaxonomyWrite};

#[cfg(test)]
mod tests;

/// Tags, sources, sections and themes share these routes; `kind` picks the table.
pub(crate) fn router(kind: TaxonomyKind) -> Router<AppState> {
    Router::new()
        .route("/", get(list_entries).post(create_entry))
        .route("/:entry_id", patch(rename_entry).delete(delete_entry))
        .layer(Extension(kind))
}

async fn list_entries(
    Extension(kind): Extension<TaxonomyKind>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<TaxonomyResponse>>, ApiError> {
    let entries = repositories::taxonomy::list(state.db(), kind)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list taxonomy entries"))?;

    Ok(Json(entries.into_iter().map(TaxonomyResponse::from_db).collect()))
}

async fn create_entry(
    Extension(kind): Extension<TaxonomyKind>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<TaxonomyWrite>,
) -> Result<(StatusCode, Json<TaxonomyResponse>), ApiError> {
    let name = validated_name(&payload)?;

    let entry = repositories::taxonomy::create(
        state.db(),
        kind,
        &Uuid::new_v4().to_string(),
        &name,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| map_write_error(e, kind, "Failed to create taxonomy entry"))?;

    tracing::info!(
        action = "taxonomy_create",
        kind = kind.label(),
        admin_id = %admin.id,
        entry_id = %entry.id,
        "Taxonomy entry created"
    );

    Ok((StatusCode::CREATED, Json(TaxonomyResponse::from_db(entry))))
}

async fn rename_entry(
    Path(entry_id): Path<String>,
    Extension(kind): Extension<TaxonomyKind>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<TaxonomyWrite>,
) -> Result<Json<TaxonomyResponse>, ApiError> {
    let name = validated_name(&payload)?;

    let entry =
        repositories::taxonomy::rename(state.db(), kind, &entry_id, &name, primitive_now_utc())
            .await
            .map_err(|e| map_write_error(e, kind, "Failed to rename taxonomy entry"))?
            .ok_or_else(|| ApiError::NotFound(format!("{} not found", kind.label())))?;

    tracing::info!(
        action = "taxonomy_rename",
        kind = kind.label(),
        admin_id = %admin.id,
        entry_id = %entry.id,
        "Taxonomy entry renamed"
    );

    Ok(Json(TaxonomyResponse::from_db(entry)))
}

async fn delete_entry(
    Path(entry_id): Path<String>,
    Extension(kind): Extension<TaxonomyKind>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::taxonomy::delete(state.db(), kind, &entry_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete taxonomy entry"))?;
    if !deleted {
        return Err(ApiError::NotFound(format!("{} not found", kind.label())));
    }

    tracing::info!(
        action = "taxonomy_delete",
        kind = kind.label(),
        admin_id = %admin.id,
        entry_id = %entry_id,
        "Taxonomy entry deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

fn validated_name(payload: &TaxonomyWrite) -> Result<String, ApiError> {
    payload.validate().map_err(ApiError::validation)?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

fn map_write_error(err: sqlx::Error, kind: TaxonomyKind, context: &'static str) -> ApiError {
    if repositories::is_unique_violation(&err) {
        return ApiError::Conflict(format!("{} with this name already exists", kind.label()));
    }
    ApiError::internal(err, context)
}
