use axum::{
    extract::{Path, State},
    Json,
};

use super::helpers::{fetch_exercise, hint_statuses};
use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::hint::{HintUnlockResponse, HintsResponse};
use crate::services::hints::{self, HintLevel};

pub(super) async fn list_hints(
    Path(exercise_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<HintsResponse>, ApiError> {
    let exercise = fetch_exercise(&state, &exercise_id).await?;
    let unlocked = repositories::hint_usages::levels_for_user(state.db(), &user.id, &exercise.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load hint usage"))?;

    Ok(Json(HintsResponse {
        hints: hint_statuses(&exercise, &unlocked, user.role.is_staff()),
        exercise_id: exercise.id,
        credits: user.credits,
    }))
}

/// Staff read hints for free and leave no usage record.
pub(super) async fn unlock_hint(
    Path((exercise_id, level)): Path<(String, i32)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<HintUnlockResponse>, ApiError> {
    let level = HintLevel::from_number(level)
        .ok_or_else(|| ApiError::BadRequest("Hint level must be 1, 2 or 3".to_string()))?;
    let exercise = fetch_exercise(&state, &exercise_id).await?;

    if user.role.is_staff() {
        let text = level.text(&exercise).ok_or_else(|| {
            ApiError::from(hints::HintError::Unavailable(level.number()))
        })?;
        return Ok(Json(HintUnlockResponse {
            level,
            text: text.to_string(),
            cost_charged: 0,
            remaining_credits: user.credits,
            already_unlocked: true,
        }));
    }

    let outcome = hints::unlock_hint(state.db(), &user.id, &exercise, level).await?;
    Ok(Json(outcome.into()))
}
