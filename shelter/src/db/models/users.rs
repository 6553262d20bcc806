use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use super::DocumentFields;

/// Writable fields of a user document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserFields {
    pub name: Option<String>,
    pub last_name: Option<String>,
    #[schema(value_type = Option<String>, format = "email")]
    pub email: Option<Email>,
}

impl DocumentFields for UserFields {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.last_name.is_none() && self.email.is_none()
    }
}

/// A syntactically valid email address.
///
/// Checks the shape `local@domain.tld` only; deliverability is not our concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let invalid = || format!("'{value}' is not a valid email address");
        let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
        if local.is_empty() || local.len() > 64 || local.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        let labels: Vec<&str> = domain.split('.').collect();
        let valid_domain = labels.len() >= 2
            && labels
                .iter()
                .all(|label| !label.is_empty() && !label.starts_with('-') && !label.ends_with('-') && label.chars().all(|c| c.is_alphanumeric() || c == '-'));
        if !valid_domain {
            return Err(invalid());
        }
        Ok(Email(value))
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
