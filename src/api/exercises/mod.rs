mod answers;
mod handlers;
pub(crate) mod helpers;
mod hints;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_exercises).post(handlers::create_exercise))
        .route(
            "/:exercise_id",
            get(handlers::get_exercise)
                .patch(handlers::update_exercise)
                .delete(handlers::delete_exercise),
        )
        .route("/:exercise_id/correct-answers", get(handlers::correct_answers))
        .route("/:exercise_id/answers", post(answers::submit_answer).get(answers::answer_history))
        .route("/:exercise_id/hints", get(hints::list_hints))
        .route("/:exercise_id/hints/:level", post(hints::unlock_hint))
}
