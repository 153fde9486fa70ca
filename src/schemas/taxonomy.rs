use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::TaxonomyEntry;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TaxonomyWrite {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub(crate) name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TaxonomyResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl TaxonomyResponse {
    pub(crate) fn from_db(entry: TaxonomyEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            created_at: format_primitive(entry.created_at),
            updated_at: format_primitive(entry.updated_at),
        }
    }
}
