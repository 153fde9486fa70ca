mod handlers;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_solutions).post(handlers::upsert_solution))
        .route("/:solution_id", get(handlers::get_solution).delete(handlers::delete_solution))
        .route("/:solution_id/status", patch(handlers::update_status))
}

#[cfg(test)]
mod tests;
