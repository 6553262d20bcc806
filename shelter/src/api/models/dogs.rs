use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::dogs::DogFields;

/// A stored dog
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct DogResponse {
    #[serde(rename = "ID")]
    pub id: String,
    /// RFC 3339 UTC timestamp assigned at creation
    pub created_date: String,
    #[serde(flatten)]
    pub fields: DogFields,
}
