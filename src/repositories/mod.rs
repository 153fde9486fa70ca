pub(crate) mod exercise_answers;
pub(crate) mod exercises;
pub(crate) mod health;
pub(crate) mod hint_usages;
pub(crate) mod solutions;
pub(crate) mod taxonomy;
pub(crate) mod users;

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error().is_some_and(|db_err| db_err.is_unique_violation())
}
