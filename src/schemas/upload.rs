use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct UploadResponse {
    pub(crate) key: String,
    pub(crate) url: String,
    pub(crate) size: i64,
    pub(crate) content_type: String,
    pub(crate) sha256: String,
    pub(crate) expires_in_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadViewQuery {
    pub(crate) key: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadViewResponse {
    pub(crate) key: String,
    pub(crate) url: String,
    pub(crate) expires_in_seconds: u64,
}
