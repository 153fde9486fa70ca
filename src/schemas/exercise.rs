use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::pagination::default_limit;
use crate::db::types::DifficultyLevel;
use crate::schemas::hint::HintStatusResponse;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExerciseCreate {
    #[validate(length(min = 1, max = 500, message = "title must be 1-500 characters"))]
    pub(crate) title: String,
    #[serde(alias = "problemText")]
    #[validate(length(min = 1, message = "problem_text must not be empty"))]
    pub(crate) problem_text: String,
    #[serde(default)]
    #[serde(alias = "problemImageKey")]
    pub(crate) problem_image_key: Option<String>,
    #[serde(default)]
    #[serde(alias = "solutionText")]
    pub(crate) solution_text: Option<String>,
    #[serde(default)]
    pub(crate) hint_1: Option<String>,
    #[serde(default)]
    pub(crate) hint_2: Option<String>,
    #[serde(default)]
    pub(crate) hint_3: Option<String>,
    #[serde(alias = "correctAnswers")]
    #[validate(length(min = 1, message = "at least one correct answer is required"))]
    pub(crate) correct_answers: Vec<String>,
    #[serde(default = "default_difficulty")]
    pub(crate) difficulty: DifficultyLevel,
    #[serde(default)]
    pub(crate) tag_ids: Vec<String>,
    #[serde(default)]
    pub(crate) source_ids: Vec<String>,
    #[serde(default)]
    pub(crate) section_ids: Vec<String>,
    #[serde(default)]
    pub(crate) theme_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct ExerciseUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 500, message = "title must be 1-500 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    #[serde(alias = "problemText")]
    #[validate(length(min = 1, message = "problem_text must not be empty"))]
    pub(crate) problem_text: Option<String>,
    #[serde(default)]
    #[serde(alias = "problemImageKey")]
    pub(crate) problem_image_key: Option<String>,
    #[serde(default)]
    #[serde(alias = "solutionText")]
    pub(crate) solution_text: Option<String>,
    #[serde(default)]
    pub(crate) hint_1: Option<String>,
    #[serde(default)]
    pub(crate) hint_2: Option<String>,
    #[serde(default)]
    pub(crate) hint_3: Option<String>,
    #[serde(default)]
    #[serde(alias = "correctAnswers")]
    #[validate(length(min = 1, message = "at least one correct answer is required"))]
    pub(crate) correct_answers: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) difficulty: Option<DifficultyLevel>,
    #[serde(default)]
    pub(crate) tag_ids: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) source_ids: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) section_ids: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) theme_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExerciseListQuery {
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
    #[serde(default)]
    pub(crate) tag: Option<String>,
    #[serde(default)]
    pub(crate) source: Option<String>,
    #[serde(default)]
    pub(crate) section: Option<String>,
    #[serde(default)]
    pub(crate) theme: Option<String>,
    #[serde(default)]
    pub(crate) difficulty: Option<DifficultyLevel>,
    #[serde(default)]
    pub(crate) search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct TaxonomyRef {
    pub(crate) id: String,
    pub(crate) name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct ExerciseTaxonomy {
    pub(crate) tags: Vec<TaxonomyRef>,
    pub(crate) sources: Vec<TaxonomyRef>,
    pub(crate) sections: Vec<TaxonomyRef>,
    pub(crate) themes: Vec<TaxonomyRef>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExerciseSummary {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) answer_count: usize,
    pub(crate) completed: bool,
    #[serde(flatten)]
    pub(crate) taxonomy: ExerciseTaxonomy,
    pub(crate) created_at: String,
}

/// Students receive `solution_text` only once the exercise is completed.
#[derive(Debug, Serialize)]
pub(crate) struct ExerciseDetail {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) problem_text: String,
    pub(crate) problem_image_key: Option<String>,
    pub(crate) solution_text: Option<String>,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) answer_count: usize,
    pub(crate) completed: bool,
    pub(crate) hints: Vec<HintStatusResponse>,
    #[serde(flatten)]
    pub(crate) taxonomy: ExerciseTaxonomy,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CorrectAnswersResponse {
    pub(crate) exercise_id: String,
    pub(crate) correct_answers: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AnswerSubmit {
    pub(crate) index: usize,
    #[validate(length(min = 1, max = 1000, message = "answer must be 1-1000 characters"))]
    pub(crate) answer: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerAttemptResponse {
    pub(crate) index: i32,
    pub(crate) answer: String,
    pub(crate) is_correct: bool,
    pub(crate) created_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerHistoryResponse {
    pub(crate) exercise_id: String,
    pub(crate) total: usize,
    pub(crate) correct_count: usize,
    pub(crate) completed: bool,
    pub(crate) latest: Vec<Option<String>>,
    pub(crate) attempts: Vec<AnswerAttemptResponse>,
}

fn default_difficulty() -> DifficultyLevel {
    DifficultyLevel::Medium
}
