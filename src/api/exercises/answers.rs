use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::helpers::{decrypt_answers, fetch_exercise};
use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::repositories;
use crate::schemas::exercise::{AnswerAttemptResponse, AnswerHistoryResponse, AnswerSubmit};
use crate::services::grading::{AnswerSheet, PartialGrade};

/// Grades one blank. The solution row is locked while the sheet is updated, so
/// parallel submissions for other blanks of the same exercise are not lost.
pub(super) async fn submit_answer(
    Path(exercise_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AnswerSubmit>,
) -> Result<Json<PartialGrade>, ApiError> {
    if user.role.is_staff() {
        return Err(ApiError::Forbidden("Only students can submit answers"));
    }
    payload.validate().map_err(ApiError::validation)?;

    let exercise = fetch_exercise(&state, &exercise_id).await?;
    let correct = decrypt_answers(&state, &exercise)?;
    let answer = payload.answer.trim();
    let now = primitive_now_utc();

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to begin transaction"))?;

    let solution = repositories::solutions::lock_or_create(
        &mut tx,
        &Uuid::new_v4().to_string(),
        &user.id,
        &exercise.id,
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to load solution"))?;

    let mut sheet = AnswerSheet::new(&correct, &solution.submitted_answers.0);
    let grade = sheet.record(payload.index, answer).map_err(ApiError::from)?;

    repositories::exercise_answers::insert(
        &mut *tx,
        repositories::exercise_answers::CreateExerciseAnswer {
            id: &Uuid::new_v4().to_string(),
            user_id: &user.id,
            exercise_id: &exercise.id,
            answer_index: grade.index as i32,
            answer,
            is_correct: grade.is_correct,
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record answer"))?;

    repositories::solutions::update_grading(
        &mut *tx,
        &solution.id,
        repositories::solutions::GradingUpdate {
            submitted_answers: sheet.into_answers(),
            correct_count: grade.correct_count as i32,
            is_correct: grade.completed,
        },
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update solution"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit answer"))?;

    let result = if grade.is_correct { "correct" } else { "incorrect" };
    metrics::counter!("answers_graded_total", "result" => result).increment(1);
    tracing::debug!(
        user_id = %user.id,
        exercise_id = %exercise.id,
        index = grade.index,
        is_correct = grade.is_correct,
        completed = grade.completed,
        "Answer graded"
    );

    Ok(Json(grade))
}

pub(super) async fn answer_history(
    Path(exercise_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AnswerHistoryResponse>, ApiError> {
    let exercise = fetch_exercise(&state, &exercise_id).await?;
    let correct = decrypt_answers(&state, &exercise)?;

    let solution =
        repositories::solutions::find_for_user_exercise(state.db(), &user.id, &exercise.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load solution"))?;
    let attempts =
        repositories::exercise_answers::list_for_user_exercise(state.db(), &user.id, &exercise.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load answer history"))?;

    let previous = solution.map(|solution| solution.submitted_answers.0).unwrap_or_default();
    let sheet = AnswerSheet::new(&correct, &previous);

    Ok(Json(AnswerHistoryResponse {
        exercise_id: exercise.id,
        total: sheet.total(),
        correct_count: sheet.correct_count(),
        completed: sheet.is_complete(),
        latest: sheet.into_answers(),
        attempts: attempts
            .into_iter()
            .map(|attempt| AnswerAttemptResponse {
                index: attempt.answer_index,
                answer: attempt.answer,
                is_correct: attempt.is_correct,
                created_at: format_primitive(attempt.created_at),
            })
            .collect(),
    }))
}
