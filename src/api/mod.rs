pub(crate) mod auth;
pub(crate) mod errors;
pub(crate) mod exercises;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod pagination;
pub(crate) mod router;
pub(crate) mod solutions;
pub(crate) mod taxonomy;
pub(crate) mod uploads;
pub(crate) mod users;
pub(crate) mod validation;
