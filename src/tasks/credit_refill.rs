use crate::core::state::AppState;
use crate::services::credits;

/// One replenishment pass over all active students.
pub(crate) async fn run_once(state: &AppState) -> Result<u64, sqlx::Error> {
    let amount = state.settings().credits().refill_amount;
    let refilled = credits::refill_all_students(state.db(), amount).await?;

    metrics::counter!("credits_refilled_users_total").increment(refilled);
    if refilled > 0 {
        tracing::info!(refilled, amount, "Student credits replenished");
    } else {
        tracing::debug!(amount, "No students needed a credit refill");
    }

    Ok(refilled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::UserRole;
    use crate::test_support;

    async fn credits_of(state: &AppState, user_id: &str) -> i32 {
        sqlx::query_scalar("SELECT credits FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(state.db())
            .await
            .expect("credits")
    }

    #[tokio::test]
    async fn refill_tops_up_active_students_up_to_cap() {
        let ctx = test_support::setup_test_context().await;
        std::env::set_var("CREDIT_REFILL_AMOUNT", "3");
        let settings = crate::core::config::Settings::load().expect("settings");
        std::env::remove_var("CREDIT_REFILL_AMOUNT");
        let state = AppState::new(
            settings,
            ctx.state.db().clone(),
            ctx.state.redis().clone(),
            ctx.state.cipher().clone(),
            None,
        );

        let low = test_support::insert_student(state.db(), "low@example.com", 2).await;
        let near_cap = test_support::insert_student(state.db(), "near@example.com", 19).await;
        let full = test_support::insert_student(state.db(), "full@example.com", 20).await;
        let admin =
            test_support::insert_user(state.db(), "admin@example.com", UserRole::Admin, 0).await;
        let inactive = test_support::insert_student(state.db(), "off@example.com", 1).await;
        sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
            .bind(&inactive.id)
            .execute(state.db())
            .await
            .expect("deactivate");

        let refilled = run_once(&state).await.expect("refill");
        assert_eq!(refilled, 2);

        assert_eq!(credits_of(&state, &low.id).await, 5);
        assert_eq!(credits_of(&state, &near_cap.id).await, 20);
        assert_eq!(credits_of(&state, &full.id).await, 20);
        assert_eq!(credits_of(&state, &admin.id).await, 0);
        assert_eq!(credits_of(&state, &inactive.id).await, 1);
    }
}
