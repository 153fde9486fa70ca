use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::pagination::default_limit;
use crate::core::time::{format_optional, format_primitive};
use crate::db::models::Solution;
use crate::db::types::ReviewStatus;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SolutionUpsert {
    #[serde(alias = "exerciseId")]
    #[validate(length(min = 1, message = "exercise_id must not be empty"))]
    pub(crate) exercise_id: String,
    #[serde(default)]
    #[serde(alias = "answerText")]
    #[validate(length(max = 20000, message = "answer_text is too long"))]
    pub(crate) answer_text: Option<String>,
    #[serde(default)]
    #[serde(alias = "imageKey")]
    pub(crate) image_key: Option<String>,
    #[serde(default)]
    #[serde(alias = "submittedAnswers")]
    pub(crate) submitted_answers: Option<Vec<Option<String>>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SolutionListQuery {
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
    #[serde(default)]
    pub(crate) status: Option<ReviewStatus>,
    #[serde(default)]
    pub(crate) exercise_id: Option<String>,
    #[serde(default)]
    pub(crate) user_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SolutionStatusUpdate {
    pub(crate) status: ReviewStatus,
    #[serde(default)]
    #[serde(alias = "reviewComment")]
    #[validate(length(max = 5000, message = "review_comment is too long"))]
    pub(crate) review_comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SolutionResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) exercise_id: String,
    pub(crate) answer_text: Option<String>,
    pub(crate) image_key: Option<String>,
    pub(crate) submitted_answers: Vec<Option<String>>,
    pub(crate) correct_count: i32,
    pub(crate) is_correct: bool,
    pub(crate) review_status: ReviewStatus,
    pub(crate) review_comment: Option<String>,
    pub(crate) reviewed_by: Option<String>,
    pub(crate) reviewed_at: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl SolutionResponse {
    pub(crate) fn from_db(solution: Solution) -> Self {
        Self {
            id: solution.id,
            user_id: solution.user_id,
            exercise_id: solution.exercise_id,
            answer_text: solution.answer_text,
            image_key: solution.image_key,
            submitted_answers: solution.submitted_answers.0,
            correct_count: solution.correct_count,
            is_correct: solution.is_correct,
            review_status: solution.review_status,
            review_comment: solution.review_comment,
            reviewed_by: solution.reviewed_by,
            reviewed_at: format_optional(solution.reviewed_at),
            created_at: format_primitive(solution.created_at),
            updated_at: format_primitive(solution.updated_at),
        }
    }
}
