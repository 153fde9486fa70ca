use serde::Serialize;

pub(crate) const fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total_count: i64,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

impl<T> PaginatedResponse<T> {
    pub(crate) fn new(items: Vec<T>, total_count: i64, skip: i64, limit: i64) -> Self {
        Self { items, total_count, skip: skip.max(0), limit: clamp_limit(limit) }
    }
}

pub(crate) fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, 100)
}
