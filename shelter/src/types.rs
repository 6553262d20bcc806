//! Common type definitions.
//!
//! - [`DocumentId`]: the store-native identifier of a stored document
//! - [`Record`]: a document as returned to callers (field name to value)
//! - [`Filter`]: an equality filter over record fields
//! - [`abbrev_uuid`]: abbreviate UUIDs to first 8 chars for logging

use serde_json::{Map, Value};
use uuid::Uuid;

/// Store-native identifier. Never exposed to callers; the public `ID` field is derived from it.
pub type DocumentId = Uuid;

/// A document: mapping of field name to JSON value.
pub type Record = Map<String, Value>;

/// Flat equality filter: a record matches when it holds an equal value for every key.
pub type Filter = Map<String, Value>;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Returns true when `record` holds an equal value for every key of `filter`.
pub fn matches_filter(record: &Record, filter: &Filter) -> bool {
    filter.iter().all(|(key, expected)| record.get(key) == Some(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_abbrev_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let record = json!({"name": "Zeus"}).as_object().unwrap().clone();
        assert!(matches_filter(&record, &Filter::new()));
    }

    #[test]
    fn test_filter_requires_every_key() {
        let record = json!({"name": "Zeus", "is_adopted": false}).as_object().unwrap().clone();

        let hit = json!({"name": "Zeus", "is_adopted": false}).as_object().unwrap().clone();
        let miss = json!({"name": "Zeus", "is_adopted": true}).as_object().unwrap().clone();
        let absent = json!({"id_user": "u1"}).as_object().unwrap().clone();

        assert!(matches_filter(&record, &hit));
        assert!(!matches_filter(&record, &miss));
        assert!(!matches_filter(&record, &absent));
    }

    #[test]
    fn test_null_in_record_does_not_match_missing_value() {
        let record = json!({"email": null}).as_object().unwrap().clone();
        let filter = json!({"email": "a@b.co"}).as_object().unwrap().clone();
        assert!(!matches_filter(&record, &filter));
    }
}
