use std::collections::{HashMap, HashSet};

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Exercise;
use crate::repositories;
use crate::repositories::taxonomy::TaxonomyKind;
use crate::schemas::exercise::{ExerciseTaxonomy, TaxonomyRef};
use crate::schemas::hint::HintStatusResponse;
use crate::services::grading::{attempt_is_correct, AnswerSheet};
use crate::services::hints::HintLevel;

pub(crate) async fn fetch_exercise(state: &AppState, exercise_id: &str) -> Result<Exercise, ApiError> {
    repositories::exercises::find_by_id(state.db(), exercise_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exercise"))?
        .ok_or_else(|| ApiError::NotFound("Exercise not found".to_string()))
}

pub(crate) fn decrypt_answers(state: &AppState, exercise: &Exercise) -> Result<Vec<String>, ApiError> {
    state
        .cipher()
        .decrypt_all(&exercise.correct_answers.0)
        .map_err(|e| ApiError::internal(e, "Failed to decrypt stored answers"))
}

/// Trims each answer; every blank needs a non-empty expected value.
pub(super) fn normalize_correct_answers(answers: Vec<String>) -> Result<Vec<String>, ApiError> {
    let answers: Vec<String> = answers.into_iter().map(|answer| answer.trim().to_string()).collect();
    if answers.is_empty() || answers.iter().any(String::is_empty) {
        return Err(ApiError::BadRequest("Correct answers must not be empty".to_string()));
    }
    Ok(answers)
}

pub(crate) fn validate_image_key(key: Option<&str>) -> Result<(), ApiError> {
    match key {
        Some(key) if !crate::services::storage::is_valid_object_key(key) => {
            Err(ApiError::BadRequest("Invalid image key".to_string()))
        }
        _ => Ok(()),
    }
}

pub(super) async fn load_taxonomy(
    state: &AppState,
    exercise_ids: &[String],
) -> Result<HashMap<String, ExerciseTaxonomy>, ApiError> {
    let mut by_exercise: HashMap<String, ExerciseTaxonomy> = HashMap::new();

    for kind in TaxonomyKind::ALL {
        let rows = repositories::taxonomy::list_for_exercises(state.db(), kind, exercise_ids)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load exercise taxonomy"))?;

        for row in rows {
            let entry = by_exercise.entry(row.exercise_id).or_default();
            let target = match kind {
                TaxonomyKind::Tag => &mut entry.tags,
                TaxonomyKind::Source => &mut entry.sources,
                TaxonomyKind::Section => &mut entry.sections,
                TaxonomyKind::Theme => &mut entry.themes,
            };
            target.push(TaxonomyRef { id: row.id, name: row.name });
        }
    }

    Ok(by_exercise)
}

/// Checks that every referenced entry exists before any link is written.
pub(super) async fn validate_taxonomy_ids(
    state: &AppState,
    links: &[(TaxonomyKind, Option<Vec<String>>)],
) -> Result<(), ApiError> {
    for (kind, ids) in links {
        let Some(ids) = ids else {
            continue;
        };
        let missing = repositories::taxonomy::find_missing_ids(state.db(), *kind, ids)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to validate taxonomy ids"))?;
        if !missing.is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Unknown {} id(s): {}",
                kind.label().to_lowercase(),
                missing.join(", ")
            )));
        }
    }
    Ok(())
}

pub(super) async fn replace_taxonomy_links(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    exercise_id: &str,
    links: Vec<(TaxonomyKind, Option<Vec<String>>)>,
) -> Result<(), ApiError> {
    for (kind, ids) in links {
        let Some(ids) = ids else {
            continue;
        };
        let mut seen = HashSet::new();
        let ids: Vec<String> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();

        repositories::taxonomy::replace_links(tx, kind, exercise_id, &ids)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to link exercise taxonomy"))?;
    }
    Ok(())
}

/// Re-grades stored solutions and the attempt history after the answer key
/// of an exercise changed.
pub(super) async fn regrade_solutions(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    exercise_id: &str,
    correct: &[String],
) -> Result<usize, ApiError> {
    let solutions = repositories::solutions::lock_by_exercise(tx, exercise_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to lock solutions"))?;
    let now = primitive_now_utc();
    let count = solutions.len();

    for solution in solutions {
        let sheet = AnswerSheet::new(correct, &solution.submitted_answers.0);
        let grading = repositories::solutions::GradingUpdate {
            correct_count: sheet.correct_count() as i32,
            is_correct: sheet.is_complete(),
            submitted_answers: sheet.into_answers(),
        };
        repositories::solutions::update_grading(&mut **tx, &solution.id, grading, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to re-grade solution"))?;
    }

    let attempts = repositories::exercise_answers::list_for_exercise(&mut **tx, exercise_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to lock answer history"))?;
    let (now_correct, now_wrong): (Vec<_>, Vec<_>) = attempts
        .into_iter()
        .filter(|attempt| {
            attempt.is_correct != attempt_is_correct(correct, attempt.answer_index, &attempt.answer)
        })
        .partition(|attempt| !attempt.is_correct);
    for (rows, is_correct) in [(now_correct, true), (now_wrong, false)] {
        let ids: Vec<String> = rows.into_iter().map(|attempt| attempt.id).collect();
        repositories::exercise_answers::set_correctness(&mut **tx, &ids, is_correct)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to re-grade answer history"))?;
    }

    Ok(count)
}

/// Hint texts are shown for unlocked levels, or for every level when `reveal_all`.
pub(super) fn hint_statuses(
    exercise: &Exercise,
    unlocked: &[i32],
    reveal_all: bool,
) -> Vec<HintStatusResponse> {
    HintLevel::ALL
        .iter()
        .map(|level| {
            let text = level.text(exercise);
            let is_unlocked = unlocked.contains(&level.number());
            HintStatusResponse {
                level: *level,
                cost: level.cost(),
                available: text.is_some(),
                unlocked: is_unlocked,
                text: text.filter(|_| reveal_all || is_unlocked).map(str::to_string),
            }
        })
        .collect()
}
