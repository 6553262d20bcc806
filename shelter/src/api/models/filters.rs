//! Query-string filters shared by every collection route.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    db::query::QueryFilter,
    errors::{Error, Result},
};

/// Raw filter parameters. Values are parsed and checked by [`TryFrom`], so a bad value
/// produces a precise validation message. Parameters that do not apply to the target
/// collection, and unknown parameters, are ignored.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FilterParams {
    /// Maximum number of records to return (default: 1, must be positive)
    #[param(value_type = Option<i64>, minimum = 1, default = 1)]
    pub length: Option<String>,
    /// Public `ID` of the record
    pub id: Option<String>,
    pub name: Option<String>,
    /// Users only
    pub last_name: Option<String>,
    /// Dogs only. Accepts true/false, 1/0, yes/no, on/off
    #[param(value_type = Option<bool>)]
    pub is_adopted: Option<String>,
    /// Dogs only: `ID` of the owning user
    pub id_user: Option<String>,
}

fn parse_length(raw: &str) -> Result<i64> {
    let length: i64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::validation(format!("length must be an integer, got '{raw}'")))?;
    if length <= 0 {
        return Err(Error::validation(format!("length must be greater than 0, got {length}")));
    }
    Ok(length)
}

fn parse_bool(field: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::validation(format!("{field} must be a boolean, got '{raw}'"))),
    }
}

impl TryFrom<FilterParams> for QueryFilter {
    type Error = Error;

    fn try_from(params: FilterParams) -> Result<Self> {
        Ok(QueryFilter {
            limit: params.length.as_deref().map(parse_length).transpose()?,
            id: params.id,
            name: params.name,
            last_name: params.last_name,
            is_adopted: params.is_adopted.as_deref().map(|raw| parse_bool("is_adopted", raw)).transpose()?,
            id_user: params.id_user,
        })
    }
}
