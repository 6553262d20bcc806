use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::users::UserFields;

/// A stored user
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct UserResponse {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(flatten)]
    pub fields: UserFields,
}
