use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::Exercise;
use crate::repositories;
use crate::services::credits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "i32")]
pub(crate) enum HintLevel {
    First,
    Second,
    Third,
}

impl From<HintLevel> for i32 {
    fn from(level: HintLevel) -> Self {
        level.number()
    }
}

impl HintLevel {
    pub(crate) const ALL: [HintLevel; 3] = [Self::First, Self::Second, Self::Third];

    pub(crate) fn from_number(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::First),
            2 => Some(Self::Second),
            3 => Some(Self::Third),
            _ => None,
        }
    }

    pub(crate) fn number(self) -> i32 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
        }
    }

    pub(crate) fn cost(self) -> i32 {
        match self {
            Self::First => 1,
            Self::Second => 3,
            Self::Third => 5,
        }
    }

    pub(crate) fn previous(self) -> Option<Self> {
        match self {
            Self::First => None,
            Self::Second => Some(Self::First),
            Self::Third => Some(Self::Second),
        }
    }

    /// Nearest lower level with text; empty levels are skipped.
    pub(crate) fn required_before(self, exercise: &Exercise) -> Option<Self> {
        let mut candidate = self.previous();
        while let Some(level) = candidate {
            if level.text(exercise).is_some() {
                return Some(level);
            }
            candidate = level.previous();
        }
        None
    }

    pub(crate) fn text(self, exercise: &Exercise) -> Option<&str> {
        let text = match self {
            Self::First => exercise.hint_1.as_deref(),
            Self::Second => exercise.hint_2.as_deref(),
            Self::Third => exercise.hint_3.as_deref(),
        };
        text.filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Error)]
pub(crate) enum HintError {
    #[error("This exercise has no hint at level {0}")]
    Unavailable(i32),
    #[error("Unlock hint level {0} first")]
    PreviousLevelLocked(i32),
    #[error("Not enough credits: {cost} required, {available} available")]
    InsufficientCredits { cost: i32, available: i32 },
    #[error("User not found")]
    UserNotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct UnlockOutcome {
    pub(crate) level: HintLevel,
    pub(crate) text: String,
    pub(crate) cost_charged: i32,
    pub(crate) remaining_credits: i32,
    pub(crate) already_unlocked: bool,
}

/// Debits the hint cost and records the usage in one transaction.
///
/// The user row is locked first, so concurrent unlocks by the same user are
/// serialised and cannot spend the same credits twice. Re-unlocking a level is
/// free.
pub(crate) async fn unlock_hint(
    pool: &PgPool,
    user_id: &str,
    exercise: &Exercise,
    level: HintLevel,
) -> Result<UnlockOutcome, HintError> {
    let text = level.text(exercise).ok_or(HintError::Unavailable(level.number()))?.to_string();

    let mut tx = pool.begin().await?;

    let available = repositories::users::lock_credits(&mut tx, user_id)
        .await?
        .ok_or(HintError::UserNotFound)?;
    let unlocked =
        repositories::hint_usages::levels_for_user(&mut *tx, user_id, &exercise.id).await?;

    if unlocked.contains(&level.number()) {
        tx.rollback().await?;
        return Ok(UnlockOutcome {
            level,
            text,
            cost_charged: 0,
            remaining_credits: available,
            already_unlocked: true,
        });
    }

    if let Some(required) = level.required_before(exercise) {
        if !unlocked.contains(&required.number()) {
            return Err(HintError::PreviousLevelLocked(required.number()));
        }
    }

    let cost = level.cost();
    let remaining = credits::debit(available, cost)
        .ok_or(HintError::InsufficientCredits { cost, available })?;

    let now = primitive_now_utc();
    repositories::users::set_credits(&mut *tx, user_id, remaining, now).await?;
    let usage = repositories::hint_usages::insert(
        &mut *tx,
        repositories::hint_usages::CreateHintUsage {
            id: &Uuid::new_v4().to_string(),
            user_id,
            exercise_id: &exercise.id,
            level: level.number(),
            cost,
            created_at: now,
        },
    )
    .await?;

    tx.commit().await?;

    metrics::counter!("hint_unlocks_total", "level" => level.number().to_string()).increment(1);
    tracing::info!(
        user_id,
        exercise_id = %exercise.id,
        usage_id = %usage.id,
        level = usage.level,
        cost = usage.cost,
        remaining,
        "Hint unlocked"
    );

    Ok(UnlockOutcome {
        level,
        text,
        cost_charged: cost,
        remaining_credits: remaining,
        already_unlocked: false,
    })
}
