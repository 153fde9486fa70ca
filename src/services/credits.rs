use sqlx::PgPool;

use crate::repositories;

/// Upper bound on a student's credit balance.
pub(crate) const MAX_CREDITS: i32 = 20;

pub(crate) fn clamp_credits(value: i32) -> i32 {
    value.clamp(0, MAX_CREDITS)
}

/// Adds `amount` credits, saturating at [`MAX_CREDITS`].
pub(crate) fn refill(current: i32, amount: i32) -> i32 {
    clamp_credits(current.saturating_add(amount.max(0)))
}

/// Returns the remaining balance, or `None` when the balance cannot cover `cost`.
pub(crate) fn debit(current: i32, cost: i32) -> Option<i32> {
    if cost < 0 {
        return None;
    }
    current.checked_sub(cost).filter(|remaining| *remaining >= 0)
}

/// Tops up every active student below the cap. Each row is updated on its own.
pub(crate) async fn refill_all_students(pool: &PgPool, amount: i32) -> Result<u64, sqlx::Error> {
    if amount <= 0 {
        return Ok(0);
    }
    repositories::users::refill_student_credits(pool, amount, MAX_CREDITS).await
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::services::hints::HintLevel;

    #[test]
    fn refill_saturates_at_cap() {
        assert_eq!(refill(18, 5), MAX_CREDITS);
        assert_eq!(refill(3, 2), 5);
        assert_eq!(refill(MAX_CREDITS, 1), MAX_CREDITS);
        assert_eq!(refill(4, -3), 4);
        assert_eq!(refill(i32::MAX - 1, 10), MAX_CREDITS);
    }

    #[test]
    fn debit_refuses_to_go_negative() {
        assert_eq!(debit(5, 5), Some(0));
        assert_eq!(debit(5, 3), Some(2));
        assert_eq!(debit(2, 3), None);
        assert_eq!(debit(2, -1), None);
    }

    #[test]
    fn balance_stays_in_bounds_for_random_sequences() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..200 {
            let mut balance = rng.gen_range(0..=MAX_CREDITS);
            for _ in 0..100 {
                if rng.gen_bool(0.6) {
                    let level = HintLevel::ALL[rng.gen_range(0..HintLevel::ALL.len())];
                    if let Some(remaining) = debit(balance, level.cost()) {
                        balance = remaining;
                    }
                } else {
                    balance = refill(balance, rng.gen_range(0..=6));
                }
                assert!((0..=MAX_CREDITS).contains(&balance), "balance {balance} out of range");
            }
        }
    }
}
