use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::validate_image_upload;
use crate::core::state::AppState;
use crate::db::models::User;
use crate::schemas::upload::{UploadResponse, UploadViewQuery, UploadViewResponse};
use crate::services::storage::{
    build_object_key, content_type_for, is_valid_object_key, StorageService, UPLOAD_FOLDERS,
};

#[cfg(test)]
mod tests;

const DEFAULT_FOLDER: &str = "solutions";

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", post(upload_image)).route("/view", get(view_image))
}

async fn upload_image(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let storage = require_storage(&state)?;
    let max_upload_mb = state.settings().storage().max_upload_size_mb;
    let max_bytes = max_upload_mb * 1024 * 1024;

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut folder = DEFAULT_FOLDER.to_string();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            filename = field.file_name().map(|s| s.to_string());
            content_type = field.content_type().map(|s| s.to_string());
            let mut bytes = Vec::new();
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
            {
                if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                    return Err(ApiError::BadRequest(format!(
                        "File size exceeds {max_upload_mb}MB limit"
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }
            file_bytes = Some(bytes);
        } else if name == "folder" {
            folder = field
                .text()
                .await
                .map_err(|_| ApiError::BadRequest("Invalid folder".to_string()))?
                .trim()
                .to_string();
        }
    }

    if !UPLOAD_FOLDERS.contains(&folder.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "Folder must be one of: {}",
            UPLOAD_FOLDERS.join(", ")
        )));
    }
    if folder == "exercises" && !user.role.is_staff() {
        return Err(ApiError::Forbidden("Admin access required"));
    }

    let file_bytes = file_bytes.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;
    if file_bytes.is_empty() {
        return Err(ApiError::BadRequest("File is empty".to_string()));
    }
    let filename = filename.unwrap_or_default();
    let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());
    let extension = validate_image_upload(
        &filename,
        &content_type,
        &state.settings().storage().allowed_image_extensions,
    )?;

    let key = build_object_key(&folder, &user.id, &extension);
    let stored = storage
        .upload_bytes(key, content_type_for(&extension), file_bytes)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to upload file"))?;
    let url = storage
        .presign_get(&stored.key)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to presign file URL"))?;

    tracing::info!(
        user_id = %user.id,
        key = %stored.key,
        size = stored.size,
        "Image uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            key: stored.key,
            url,
            size: stored.size,
            content_type: content_type_for(&extension).to_string(),
            sha256: stored.sha256,
            expires_in_seconds: storage.presign_ttl().as_secs(),
        }),
    ))
}

async fn view_image(
    Query(params): Query<UploadViewQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<UploadViewResponse>, ApiError> {
    let key = params.key.trim();
    if !is_valid_object_key(key) {
        return Err(ApiError::BadRequest("Invalid image key".to_string()));
    }
    if !can_view(&user, key) {
        return Err(ApiError::Forbidden("Not enough permissions"));
    }

    let storage = require_storage(&state)?;
    let url = storage
        .presign_get(key)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to presign file URL"))?;

    Ok(Json(UploadViewResponse {
        key: key.to_string(),
        url,
        expires_in_seconds: storage.presign_ttl().as_secs(),
    }))
}

fn require_storage(state: &AppState) -> Result<&StorageService, ApiError> {
    state
        .storage()
        .ok_or_else(|| ApiError::ServiceUnavailable("File storage is not configured".to_string()))
}

/// Exercise images are public to signed-in users; other folders belong to the uploader.
fn can_view(user: &User, key: &str) -> bool {
    let mut parts = key.split('/');
    match (parts.next(), parts.next()) {
        (Some("exercises"), _) => true,
        (Some(_), Some(owner)) => owner == user.id || user.role.is_staff(),
        _ => false,
    }
}
