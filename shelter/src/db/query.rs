//! Query normalization: turns optional filter fields into a collection-specific equality filter.

use serde_json::Value;

use crate::{
    db::collection::{Collection, FilterField},
    errors::{Error, Result},
    types::Filter,
};

/// Number of records returned when the caller does not ask for a limit.
pub const DEFAULT_LIMIT: i64 = 1;

/// Optional filter and limit fields, as supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    pub limit: Option<i64>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub is_adopted: Option<bool>,
    pub id_user: Option<String>,
}

impl QueryFilter {
    /// Filter selecting by public `ID` only.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Maximum number of records to return. Must be positive.
    pub fn limit(&self) -> Result<i64> {
        match self.limit {
            None => Ok(DEFAULT_LIMIT),
            Some(limit) if limit > 0 => Ok(limit),
            Some(limit) => Err(Error::validation(format!("length must be greater than 0, got {limit}"))),
        }
    }

    fn value(&self, field: FilterField) -> Option<Value> {
        match field {
            FilterField::Id => self.id.clone().map(Value::String),
            FilterField::Name => self.name.clone().map(Value::String),
            FilterField::LastName => self.last_name.clone().map(Value::String),
            FilterField::IsAdopted => self.is_adopted.map(Value::Bool),
            FilterField::IdUser => self.id_user.clone().map(Value::String),
        }
    }

    /// Build the equality filter for `collection`.
    ///
    /// Fields that do not apply to the collection and fields left unset contribute nothing.
    /// The limit is a result-size directive and never appears in the filter.
    pub fn normalize(&self, collection: Collection) -> Filter {
        collection
            .filter_fields()
            .iter()
            .filter_map(|&field| self.value(field).map(|value| (field.key().to_string(), value)))
            .collect()
    }
}
