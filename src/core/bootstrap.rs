use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::services::credits::MAX_CREDITS;

/// Creates or repairs the configured superadmin account.
pub(crate) async fn ensure_superadmin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_superadmin_password.is_empty() {
        tracing::warn!("FIRST_SUPERADMIN_PASSWORD not configured; skipping superadmin creation");
        return Ok(());
    }

    let email = &admin.first_superadmin_email;
    let now = primitive_now_utc();

    if let Some(user) = repositories::users::find_by_email(state.db(), email).await? {
        let password_matches =
            security::verify_password(&admin.first_superadmin_password, &user.hashed_password)
                .unwrap_or(false);

        if password_matches && user.role == UserRole::Superadmin && user.is_active {
            tracing::info!("Default superadmin already up to date");
            return Ok(());
        }

        let hashed_password = if password_matches {
            None
        } else {
            Some(security::hash_password(&admin.first_superadmin_password)?)
        };

        repositories::users::update(
            state.db(),
            &user.id,
            repositories::users::UpdateUser {
                name: None,
                role: Some(UserRole::Superadmin),
                is_active: Some(true),
                credits: None,
                hashed_password,
                updated_at: now,
            },
        )
        .await?;

        tracing::info!(email = %email, "Updated default superadmin");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_superadmin_password)?;
    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email,
            hashed_password,
            name: "Super Admin",
            role: UserRole::Superadmin,
            credits: MAX_CREDITS,
            is_active: true,
            created_at: now,
        },
    )
    .await?;

    tracing::info!(email = %email, "Created default superadmin");
    Ok(())
}
