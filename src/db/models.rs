use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{DifficultyLevel, ReviewStatus, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) name: String,
    pub(crate) role: UserRole,
    pub(crate) credits: i32,
    pub(crate) is_active: bool,
    pub(crate) school: Option<String>,
    pub(crate) grade_level: Option<String>,
    pub(crate) onboarding_completed: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// `correct_answers` holds ciphertexts produced by `AnswerCipher`; one per blank.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exercise {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) problem_text: String,
    pub(crate) problem_image_key: Option<String>,
    pub(crate) solution_text: Option<String>,
    pub(crate) hint_1: Option<String>,
    pub(crate) hint_2: Option<String>,
    pub(crate) hint_3: Option<String>,
    pub(crate) correct_answers: Json<Vec<String>>,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl Exercise {
    pub(crate) fn answer_count(&self) -> usize {
        self.correct_answers.0.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct TaxonomyEntry {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Solution {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) exercise_id: String,
    pub(crate) answer_text: Option<String>,
    pub(crate) image_key: Option<String>,
    pub(crate) submitted_answers: Json<Vec<Option<String>>>,
    pub(crate) correct_count: i32,
    pub(crate) is_correct: bool,
    pub(crate) review_status: ReviewStatus,
    pub(crate) review_comment: Option<String>,
    pub(crate) reviewed_by: Option<String>,
    pub(crate) reviewed_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExerciseAnswer {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) exercise_id: String,
    pub(crate) answer_index: i32,
    pub(crate) answer: String,
    pub(crate) is_correct: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct HintUsage {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) exercise_id: String,
    pub(crate) level: i32,
    pub(crate) cost: i32,
    pub(crate) created_at: PrimitiveDateTime,
}
