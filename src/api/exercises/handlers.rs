use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::helpers::{
    decrypt_answers, fetch_exercise, hint_statuses, load_taxonomy, normalize_correct_answers,
    regrade_solutions, replace_taxonomy_links, validate_image_key, validate_taxonomy_ids,
};
use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::pagination::PaginatedResponse;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::{Exercise, User};
use crate::repositories;
use crate::repositories::taxonomy::TaxonomyKind;
use crate::schemas::exercise::{
    CorrectAnswersResponse, ExerciseCreate, ExerciseDetail, ExerciseListQuery, ExerciseSummary,
    ExerciseUpdate,
};

pub(super) async fn list_exercises(
    Query(params): Query<ExerciseListQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<ExerciseSummary>>, ApiError> {
    let (skip, limit) = (params.skip, params.limit);
    let filters = repositories::exercises::ListExercisesParams {
        tag: params.tag,
        source: params.source,
        section: params.section,
        theme: params.theme,
        difficulty: params.difficulty,
        search: params.search,
        skip,
        limit,
    };
    let rows = repositories::exercises::list(state.db(), &filters)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exercises"))?;

    // An empty page past the end still reports the full total.
    let total_count = match rows.first() {
        Some(row) => row.total_count,
        None if skip > 0 => repositories::exercises::count(state.db(), &filters)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count exercises"))?,
        None => 0,
    };
    let ids: Vec<String> = rows.iter().map(|row| row.exercise.id.clone()).collect();

    let mut taxonomy = load_taxonomy(&state, &ids).await?;
    let completed = repositories::solutions::completed_exercise_ids(state.db(), &user.id, &ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load completion state"))?;

    let items = rows
        .into_iter()
        .map(|row| {
            let exercise = row.exercise;
            ExerciseSummary {
                answer_count: exercise.answer_count(),
                completed: completed.contains(&exercise.id),
                taxonomy: taxonomy.remove(&exercise.id).unwrap_or_default(),
                created_at: format_primitive(exercise.created_at),
                id: exercise.id,
                title: exercise.title,
                difficulty: exercise.difficulty,
            }
        })
        .collect();

    Ok(Json(PaginatedResponse::new(items, total_count, skip, limit)))
}

pub(super) async fn create_exercise(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ExerciseCreate>,
) -> Result<(StatusCode, Json<ExerciseDetail>), ApiError> {
    payload.validate().map_err(ApiError::validation)?;
    validate_image_key(payload.problem_image_key.as_deref())?;
    let correct_answers = normalize_correct_answers(payload.correct_answers)?;

    let links = vec![
        (TaxonomyKind::Tag, Some(payload.tag_ids)),
        (TaxonomyKind::Source, Some(payload.source_ids)),
        (TaxonomyKind::Section, Some(payload.section_ids)),
        (TaxonomyKind::Theme, Some(payload.theme_ids)),
    ];
    validate_taxonomy_ids(&state, &links).await?;

    let exercise_id = Uuid::new_v4().to_string();
    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to begin transaction"))?;

    let exercise = repositories::exercises::create(
        &mut *tx,
        repositories::exercises::CreateExercise {
            id: &exercise_id,
            title: payload.title.trim(),
            problem_text: &payload.problem_text,
            problem_image_key: payload.problem_image_key.as_deref(),
            solution_text: payload.solution_text.as_deref(),
            hints: [
                payload.hint_1.as_deref(),
                payload.hint_2.as_deref(),
                payload.hint_3.as_deref(),
            ],
            correct_answers: state.cipher().encrypt_all(&correct_answers),
            difficulty: payload.difficulty,
            created_by: &admin.id,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exercise"))?;

    replace_taxonomy_links(&mut tx, &exercise.id, links).await?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit exercise"))?;

    tracing::info!(
        action = "exercise_create",
        admin_id = %admin.id,
        exercise_id = %exercise.id,
        answers = correct_answers.len(),
        "Exercise created"
    );

    let detail = build_detail(&state, exercise, &admin).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub(super) async fn get_exercise(
    Path(exercise_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ExerciseDetail>, ApiError> {
    let exercise = fetch_exercise(&state, &exercise_id).await?;
    Ok(Json(build_detail(&state, exercise, &user).await?))
}

pub(super) async fn update_exercise(
    Path(exercise_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ExerciseUpdate>,
) -> Result<Json<ExerciseDetail>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;
    validate_image_key(payload.problem_image_key.as_deref())?;
    fetch_exercise(&state, &exercise_id).await?;

    let correct_answers = payload.correct_answers.map(normalize_correct_answers).transpose()?;

    let links = vec![
        (TaxonomyKind::Tag, payload.tag_ids),
        (TaxonomyKind::Source, payload.source_ids),
        (TaxonomyKind::Section, payload.section_ids),
        (TaxonomyKind::Theme, payload.theme_ids),
    ];
    validate_taxonomy_ids(&state, &links).await?;

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to begin transaction"))?;

    let exercise = repositories::exercises::update(
        &mut *tx,
        &exercise_id,
        repositories::exercises::UpdateExercise {
            title: payload.title.map(|title| title.trim().to_string()),
            problem_text: payload.problem_text,
            problem_image_key: payload.problem_image_key,
            solution_text: payload.solution_text,
            hint_1: payload.hint_1,
            hint_2: payload.hint_2,
            hint_3: payload.hint_3,
            correct_answers: correct_answers
                .as_ref()
                .map(|answers| state.cipher().encrypt_all(answers)),
            difficulty: payload.difficulty,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update exercise"))?
    .ok_or_else(|| ApiError::NotFound("Exercise not found".to_string()))?;

    replace_taxonomy_links(&mut tx, &exercise.id, links).await?;

    let regraded = match correct_answers.as_deref() {
        Some(answers) => regrade_solutions(&mut tx, &exercise.id, answers).await?,
        None => 0,
    };

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit exercise update"))?;

    tracing::info!(
        action = "exercise_update",
        admin_id = %admin.id,
        exercise_id = %exercise.id,
        regraded,
        "Exercise updated"
    );

    Ok(Json(build_detail(&state, exercise, &admin).await?))
}

pub(super) async fn delete_exercise(
    Path(exercise_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::exercises::delete(state.db(), &exercise_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exercise"))?;

    if !deleted {
        return Err(ApiError::NotFound("Exercise not found".to_string()));
    }

    tracing::info!(
        action = "exercise_delete",
        admin_id = %admin.id,
        exercise_id = %exercise_id,
        "Exercise deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn correct_answers(
    Path(exercise_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<CorrectAnswersResponse>, ApiError> {
    let exercise = fetch_exercise(&state, &exercise_id).await?;
    let correct_answers = decrypt_answers(&state, &exercise)?;

    Ok(Json(CorrectAnswersResponse { exercise_id: exercise.id, correct_answers }))
}

/// Staff see every hint and the worked solution; students see unlocked hints
/// and the solution only after completing the exercise.
async fn build_detail(
    state: &AppState,
    exercise: Exercise,
    viewer: &User,
) -> Result<ExerciseDetail, ApiError> {
    let is_staff = viewer.role.is_staff();

    let completed =
        repositories::solutions::find_for_user_exercise(state.db(), &viewer.id, &exercise.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load solution"))?
            .is_some_and(|solution| solution.is_correct);

    let unlocked = if is_staff {
        Vec::new()
    } else {
        repositories::hint_usages::levels_for_user(state.db(), &viewer.id, &exercise.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load hint usage"))?
    };

    let mut taxonomy = load_taxonomy(state, std::slice::from_ref(&exercise.id)).await?;

    Ok(ExerciseDetail {
        hints: hint_statuses(&exercise, &unlocked, is_staff),
        answer_count: exercise.answer_count(),
        taxonomy: taxonomy.remove(&exercise.id).unwrap_or_default(),
        solution_text: exercise.solution_text.filter(|_| is_staff || completed),
        created_at: format_primitive(exercise.created_at),
        updated_at: format_primitive(exercise.updated_at),
        id: exercise.id,
        title: exercise.title,
        problem_text: exercise.problem_text,
        problem_image_key: exercise.problem_image_key,
        difficulty: exercise.difficulty,
        completed,
        created_by: exercise.created_by,
    })
}
