use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::exercises::helpers::{decrypt_answers, fetch_exercise, validate_image_key};
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Solution;
use crate::repositories;
use crate::schemas::solution::{
    SolutionListQuery, SolutionResponse, SolutionStatusUpdate, SolutionUpsert,
};
use crate::services::grading::{answers_match, grade_all, merge_submission};

/// Students only ever see their own rows; staff may filter by any user.
pub(super) async fn list_solutions(
    Query(params): Query<SolutionListQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SolutionResponse>>, ApiError> {
    let user_id = if user.role.is_staff() { params.user_id } else { Some(user.id) };

    let solutions = repositories::solutions::list(
        state.db(),
        repositories::solutions::ListSolutionsParams {
            user_id,
            exercise_id: params.exercise_id,
            status: params.status,
            skip: params.skip,
            limit: params.limit,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list solutions"))?;

    Ok(Json(solutions.into_iter().map(SolutionResponse::from_db).collect()))
}

pub(super) async fn upsert_solution(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SolutionUpsert>,
) -> Result<Json<SolutionResponse>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let answer_text = payload.answer_text.filter(|text| !text.trim().is_empty());
    let image_key = payload.image_key.map(|key| key.trim().to_string()).filter(|key| !key.is_empty());
    if answer_text.is_none() && image_key.is_none() && payload.submitted_answers.is_none() {
        return Err(ApiError::BadRequest(
            "Provide answer_text, image_key or submitted_answers".to_string(),
        ));
    }
    validate_image_key(image_key.as_deref())?;

    let exercise = fetch_exercise(&state, payload.exercise_id.trim()).await?;
    let correct = match payload.submitted_answers {
        Some(_) => decrypt_answers(&state, &exercise)?,
        None => Vec::new(),
    };
    let now = primitive_now_utc();

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to begin transaction"))?;

    let existing = repositories::solutions::lock_or_create(
        &mut tx,
        &Uuid::new_v4().to_string(),
        &user.id,
        &exercise.id,
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to load solution"))?;

    let grading = match payload.submitted_answers {
        Some(submitted) => {
            let merged =
                merge_submission(&existing.submitted_answers.0, &submitted, correct.len())?;
            let (answers, correct_count, completed) = grade_all(&merged, &correct)?;

            // Every newly given blank goes to the attempt log so the latest
            // attempt per index keeps matching the stored sheet.
            for (index, answer) in submitted.iter().enumerate() {
                let Some(answer) = answer.as_deref().map(str::trim).filter(|a| !a.is_empty()) else {
                    continue;
                };
                repositories::exercise_answers::insert(
                    &mut *tx,
                    repositories::exercise_answers::CreateExerciseAnswer {
                        id: &Uuid::new_v4().to_string(),
                        user_id: &user.id,
                        exercise_id: &exercise.id,
                        answer_index: index as i32,
                        answer,
                        is_correct: answers_match(answer, &correct[index]),
                        created_at: now,
                    },
                )
                .await
                .map_err(|e| ApiError::internal(e, "Failed to record answer"))?;
            }

            Some(repositories::solutions::GradingUpdate {
                submitted_answers: answers,
                correct_count: correct_count as i32,
                is_correct: completed,
            })
        }
        None => None,
    };

    let solution = repositories::solutions::apply_submission(
        &mut *tx,
        &existing.id,
        repositories::solutions::SubmissionUpdate { answer_text, image_key, grading },
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save solution"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit solution"))?;

    tracing::info!(
        user_id = %user.id,
        exercise_id = %exercise.id,
        solution_id = %solution.id,
        is_correct = solution.is_correct,
        "Solution submitted"
    );

    Ok(Json(SolutionResponse::from_db(solution)))
}

pub(super) async fn get_solution(
    Path(solution_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SolutionResponse>, ApiError> {
    let solution = fetch_solution(&state, &solution_id).await?;
    if solution.user_id != user.id && !user.role.is_staff() {
        return Err(ApiError::Forbidden("Not enough permissions"));
    }

    Ok(Json(SolutionResponse::from_db(solution)))
}

pub(super) async fn update_status(
    Path(solution_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<SolutionStatusUpdate>,
) -> Result<Json<SolutionResponse>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let comment = payload.review_comment.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let solution = repositories::solutions::update_review(
        state.db(),
        &solution_id,
        repositories::solutions::ReviewSolution {
            status: payload.status,
            comment,
            reviewed_by: &admin.id,
            reviewed_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update solution status"))?
    .ok_or_else(|| ApiError::NotFound("Solution not found".to_string()))?;

    tracing::info!(
        action = "solution_review",
        admin_id = %admin.id,
        solution_id = %solution.id,
        status = ?solution.review_status,
        "Solution reviewed"
    );

    Ok(Json(SolutionResponse::from_db(solution)))
}

pub(super) async fn delete_solution(
    Path(solution_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::solutions::delete(state.db(), &solution_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete solution"))?;
    if !deleted {
        return Err(ApiError::NotFound("Solution not found".to_string()));
    }

    tracing::info!(
        action = "solution_delete",
        admin_id = %admin.id,
        solution_id = %solution_id,
        "Solution deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_solution(state: &AppState, solution_id: &str) -> Result<Solution, ApiError> {
    repositories::solutions::find_by_id(state.db(), solution_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch solution"))?
        .ok_or_else(|| ApiError::NotFound("Solution not found".to_string()))
}
