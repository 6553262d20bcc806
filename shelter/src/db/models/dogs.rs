use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

use super::DocumentFields;

/// Writable fields of a dog document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DogFields {
    pub name: Option<String>,
    pub birth_date: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>)]
    pub picture: Option<Url>,
    pub is_adopted: Option<bool>,
    /// `ID` of the user that owns the dog
    pub id_user: Option<String>,
}

impl DocumentFields for DogFields {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.birth_date.is_none() && self.picture.is_none() && self.is_adopted.is_none() && self.id_user.is_none()
    }

    fn validate(&self) -> Result<(), String> {
        match &self.picture {
            Some(url) if !matches!(url.scheme(), "http" | "https") => Err(format!("picture must be an http(s) URL, got scheme '{}'", url.scheme())),
            _ => Ok(()),
        }
    }
}
