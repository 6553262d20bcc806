//! Per-collection configuration.
//!
//! Every collection-specific rule lives here: which filter fields apply, whether creation is
//! timestamped, and which payload schema validates writes. The query normalizer and the
//! document manager are generic over [`Collection`] instead of branching on collection names.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use utoipa::ToSchema;

use crate::{
    db::models::{DocumentFields, dogs::DogFields, users::UserFields},
    errors::{Error, Result},
    types::Record,
};

/// Public identifier field, derived from the store-native id at creation.
pub const ID_FIELD: &str = "ID";
/// Creation timestamp field, present on collections that stamp creation.
pub const CREATED_DATE_FIELD: &str = "created_date";

/// A field that may be used to select records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Id,
    Name,
    LastName,
    IsAdopted,
    IdUser,
}

impl FilterField {
    /// Record key this filter field matches against
    pub const fn key(self) -> &'static str {
        match self {
            FilterField::Id => ID_FIELD,
            FilterField::Name => "name",
            FilterField::LastName => "last_name",
            FilterField::IsAdopted => "is_adopted",
            FilterField::IdUser => "id_user",
        }
    }
}

const DOG_FILTERS: &[FilterField] = &[FilterField::Id, FilterField::Name, FilterField::IsAdopted, FilterField::IdUser];
const USER_FILTERS: &[FilterField] = &[FilterField::Id, FilterField::Name, FilterField::LastName];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Dogs,
    Users,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Dogs, Collection::Users];

    /// Name of the collection in the document store
    pub const fn name(self) -> &'static str {
        match self {
            Collection::Dogs => "dogs",
            Collection::Users => "users",
        }
    }

    /// Filter fields that may select records of this collection
    pub const fn filter_fields(self) -> &'static [FilterField] {
        match self {
            Collection::Dogs => DOG_FILTERS,
            Collection::Users => USER_FILTERS,
        }
    }

    /// Whether records carry a `created_date` assigned at insertion
    pub const fn stamps_creation(self) -> bool {
        matches!(self, Collection::Dogs)
    }

    /// Validate a create payload and return the record to insert.
    ///
    /// Unknown fields are dropped; schema fields the caller left out are stored as `null`.
    pub fn creation_record(self, payload: Value) -> Result<Record> {
        match self {
            Collection::Dogs => to_record(&parse::<DogFields>(payload)?),
            Collection::Users => to_record(&parse::<UserFields>(payload)?),
        }
    }

    /// Validate an update payload and return only the values to set.
    ///
    /// Null fields mean "leave unchanged" and are removed.
    pub fn update_values(self, payload: Value) -> Result<Record> {
        let mut values = match self {
            Collection::Dogs => to_record(&parse::<DogFields>(payload)?)?,
            Collection::Users => to_record(&parse::<UserFields>(payload)?)?,
        };
        values.retain(|_, value| !value.is_null());
        // ID and created_date are write-once
        values.remove(ID_FIELD);
        values.remove(CREATED_DATE_FIELD);
        Ok(values)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn parse<F: DocumentFields>(payload: Value) -> Result<F> {
    let fields: F = serde_json::from_value(payload).map_err(|e| Error::validation(format!("Invalid document: {e}")))?;
    fields.validate().map_err(Error::validation)?;
    if fields.is_empty() {
        return Err(Error::validation("Document must set at least one field"));
    }
    Ok(fields)
}

fn to_record<F: DocumentFields>(fields: &F) -> Result<Record> {
    match serde_json::to_value(fields) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(other) => Err(Error::Internal {
            operation: format!("encode document fields: expected an object, got {other}"),
        }),
        Err(e) => Err(Error::Internal {
            operation: format!("encode document fields: {e}"),
        }),
    }
}
