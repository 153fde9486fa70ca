use serde::Serialize;

use crate::services::hints::{HintLevel, UnlockOutcome};

/// `text` is present only for unlocked levels (or for staff).
#[derive(Debug, Serialize)]
pub(crate) struct HintStatusResponse {
    pub(crate) level: HintLevel,
    pub(crate) cost: i32,
    pub(crate) available: bool,
    pub(crate) unlocked: bool,
    pub(crate) text: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HintsResponse {
    pub(crate) exercise_id: String,
    pub(crate) credits: i32,
    pub(crate) hints: Vec<HintStatusResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HintUnlockResponse {
    pub(crate) level: HintLevel,
    pub(crate) text: String,
    pub(crate) cost_charged: i32,
    pub(crate) remaining_credits: i32,
    pub(crate) already_unlocked: bool,
}

impl From<UnlockOutcome> for HintUnlockResponse {
    fn from(outcome: UnlockOutcome) -> Self {
        Self {
            level: outcome.level,
            text: outcome.text,
            cost_charged: outcome.cost_charged,
            remaining_credits: outcome.remaining_credits,
            already_unlocked: outcome.already_unlocked,
        }
    }
}
