// Input/output transformation between logical auth records and stored
// documents.
//
// Input: logical keys → storage names, relationship ids coerced to the
// store's id type, nulls dropped.
// Output: storage names → logical keys, ids stringified, renamed relationships
// written under both names, ISO-8601 strings normalized to UTC.

use better_auth_core::db::schema::FieldType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

use crate::config::{FieldTransforms, IdType};
use crate::registry::CollectionSchemaMap;

/// Coerce an id-valued input to the store's representation.
///
/// * `Number`: numeric-looking strings become numbers.
/// * `Text`: numbers become strings.
/// * Arrays are coerced element-wise; anything else passes through.
pub fn coerce_id(value: &Value, id_type: IdType) -> Value {
    match (value, id_type) {
        (Value::Array(items), _) => items.iter().map(|v| coerce_id(v, id_type)).collect(),
        (Value::String(s), IdType::Number) => parse_number(s).map(Value::Number).unwrap_or_else(|| value.clone()),
        (Value::Number(n), IdType::Text) => Value::String(n.to_string()),
        _ => value.clone(),
    }
}

fn parse_number(s: &str) -> Option<Number> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(Number::from(n));
    }
    trimmed.parse::<f64>().ok().and_then(Number::from_f64)
}

/// String form of a stored id. Non-scalar values are returned unchanged.
pub fn id_to_string(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        Value::Object(obj) => obj.get("id").map(id_to_string).unwrap_or_else(|| value.clone()),
        other => other.clone(),
    }
}

/// A relationship read back from the store, split into the value the auth
/// engine sees and the value the store holds.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipValue {
    /// String id(s), written under the logical field key.
    pub logical: Value,
    /// Store-native id(s), written under the storage field name.
    pub native: Value,
}

impl RelationshipValue {
    /// Split a stored relationship value.
    ///
    /// Primitives keep their native form; populated documents contribute
    /// their `id`; arrays are split element-wise.
    pub fn from_native(value: &Value) -> Self {
        match value {
            Value::Array(items) => {
                let (logical, native) = items
                    .iter()
                    .map(Self::from_native)
                    .map(|r| (r.logical, r.native))
                    .unzip::<_, _, Vec<_>, Vec<_>>();
                Self {
                    logical: Value::Array(logical),
                    native: Value::Array(native),
                }
            }
            Value::Object(obj) => match obj.get("id") {
                Some(id) => Self::from_native(id),
                None => Self {
                    logical: value.clone(),
                    native: value.clone(),
                },
            },
            other => Self {
                logical: id_to_string(other),
                native: other.clone(),
            },
        }
    }
}

/// Parse an ISO-8601 timestamp and render it as canonical UTC with
/// millisecond precision. Bare dates are accepted only when `date_only` is set.
pub fn normalize_timestamp(s: &str, date_only: bool) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            date_only
                .then(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .flatten()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })?;
    Some(parsed.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Converts records for one adapter instance.
#[derive(Debug, Clone, Copy)]
pub struct Transformer<'a> {
    registry: &'a CollectionSchemaMap,
    id_type: IdType,
    transforms: &'a FieldTransforms,
}

impl<'a> Transformer<'a> {
    pub fn new(
        registry: &'a CollectionSchemaMap,
        id_type: IdType,
        transforms: &'a FieldTransforms,
    ) -> Self {
        Self {
            registry,
            id_type,
            transforms,
        }
    }

    /// Logical payload → store document.
    pub fn input(&self, model: &str, payload: &Value) -> Value {
        let Value::Object(fields) = payload else {
            return payload.clone();
        };
        let mut out = Map::with_capacity(fields.len());
        for (key, value) in fields {
            if value.is_null() {
                continue;
            }
            let value = match self.transforms.get(model, key).and_then(|t| t.input.as_ref()) {
                Some(f) => f(value.clone()),
                None => value.clone(),
            };
            let value = if key == "id" || self.registry.is_reference_field(model, key) {
                coerce_id(&value, self.id_type)
            } else {
                value
            };
            let name = self.registry.resolve_field_name(model, key);
            out.insert(name.to_string(), value);
        }
        Value::Object(out)
    }

    /// Store document → logical record.
    pub fn output(&self, model: &str, record: Value) -> Value {
        let Value::Object(fields) = record else {
            return record;
        };
        let mut out = Map::with_capacity(fields.len());
        for (name, value) in fields {
            let key = self.registry.resolve_field_key(model, &name).to_string();
            if key == "id" {
                out.insert(key, id_to_string(&value));
                continue;
            }
            let descriptor = self.registry.descriptor(model, &key);
            let logical = match descriptor {
                Some(field) if field.is_reference() => {
                    let relation = RelationshipValue::from_native(&value);
                    if field.is_renamed() {
                        out.insert(name, relation.native);
                    }
                    relation.logical
                }
                _ => {
                    let date_only = descriptor.is_some_and(|f| f.field_type == FieldType::Date);
                    materialize_date(value, date_only)
                }
            };
            let logical = match self.transforms.get(model, &key).and_then(|t| t.output.as_ref()) {
                Some(f) => f(logical),
                None => logical,
            };
            out.insert(key, logical);
        }
        Value::Object(out)
    }
}

fn materialize_date(value: Value, date_only: bool) -> Value {
    match &value {
        Value::String(s) => normalize_timestamp(s, date_only)
            .map(Value::String)
            .unwrap_or(value),
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use better_auth_core::db::schema::AuthSchema;
    use serde_json::json;

    use crate::config::ModelOverride;

    fn registry() -> CollectionSchemaMap {
        let mut overrides = HashMap::new();
        overrides.insert("session".to_string(), ModelOverride::slug("sessions").field("userId", "user"));
        overrides.insert("user".to_string(), ModelOverride::default().field("emailVerified", "verified"));
        CollectionSchemaMap::build_default(&AuthSchema::core_schema(), &overrides).unwrap()
    }

    #[test]
    fn test_coerce_id() {
        assert_eq!(coerce_id(&json!("42"), IdType::Number), json!(42));
        assert_eq!(coerce_id(&json!(42), IdType::Text), json!("42"));
        assert_eq!(coerce_id(&json!(["1", "x"]), IdType::Number), json!([1, "x"]));
        assert_eq!(coerce_id(&json!([1, 2]), IdType::Text), json!(["1", "2"]));
        assert_eq!(coerce_id(&json!("abc"), IdType::Number), json!("abc"));
        assert_eq!(coerce_id(&json!("42"), IdType::Text), json!("42"));
        assert_eq!(coerce_id(&json!(true), IdType::Number), json!(true));
    }

    #[test]
    fn test_relationship_value() {
        let rel = RelationshipValue::from_native(&json!(5));
        assert_eq!(rel.logical, json!("5"));
        assert_eq!(rel.native, json!(5));

        let rel = RelationshipValue::from_native(&json!({"id": 5, "email": "a@b.com"}));
        assert_eq!(rel.logical, json!("5"));
        assert_eq!(rel.native, json!(5));

        let rel = RelationshipValue::from_native(&json!([1, {"id": "abc"}]));
        assert_eq!(rel.logical, json!(["1", "abc"]));
        assert_eq!(rel.native, json!([1, "abc"]));
    }

    #[test]
    fn test_normalize_timestamp() {
        assert_eq!(
            normalize_timestamp("2024-05-01T10:00:00+02:00", false).as_deref(),
            Some("2024-05-01T08:00:00.000Z")
        );
        assert_eq!(
            normalize_timestamp("2024-05-01T10:00:00.5", false).as_deref(),
            Some("2024-05-01T10:00:00.500Z")
        );
        assert_eq!(normalize_timestamp("2024-05-01", false), None);
        assert_eq!(
            normalize_timestamp("2024-05-01", true).as_deref(),
            Some("2024-05-01T00:00:00.000Z")
        );
        assert_eq!(normalize_timestamp("hello", true), None);
    }

    #[test]
    fn test_session_user_scenario() {
        let registry = registry();
        let transforms = FieldTransforms::default();
        let t = Transformer::new(&registry, IdType::Number, &transforms);

        let stored = t.input("session", &json!({"userId": "5", "token": "abc", "ipAddress": null}));
        assert_eq!(stored, json!({"user": 5, "token": "abc"}));

        let record = t.output("session", json!({"id": 7, "user": 5, "token": "abc"}));
        assert_eq!(record, json!({"id": "7", "userId": "5", "user": 5, "token": "abc"}));
    }

    #[test]
    fn test_storage_name_reference_is_coerced() {
        let registry = registry();
        let transforms = FieldTransforms::default();
        let t = Transformer::new(&registry, IdType::Number, &transforms);
        assert_eq!(t.input("session", &json!({"user": "5"})), json!({"user": 5}));

        let t = Transformer::new(&registry, IdType::Text, &transforms);
        assert_eq!(t.input("session", &json!({"user": 5})), json!({"user": "5"}));
    }

    #[test]
    fn test_unrenamed_reference_output() {
        let registry = registry();
        let transforms = FieldTransforms::default();
        let t = Transformer::new(&registry, IdType::Number, &transforms);
        let record = t.output("account", json!({"id": 1, "userId": {"id": 5, "name": "A"}}));
        assert_eq!(record, json!({"id": "1", "userId": "5"}));
    }

    #[test]
    fn test_round_trip_plain_fields() {
        let registry = registry();
        let transforms = FieldTransforms::default();
        let t = Transformer::new(&registry, IdType::Text, &transforms);
        let payload = json!({"name": "Alice", "email": "a@b.com", "emailVerified": true, "role": "admin"});
        let stored = t.input("user", &payload);
        assert_eq!(stored["verified"], json!(true));
        assert!(stored.get("emailVerified").is_none());
        assert_eq!(t.output("user", stored), payload);
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let registry = registry();
        let transforms = FieldTransforms::default();
        let t = Transformer::new(&registry, IdType::Number, &transforms);
        let stored = t.input("session", &json!({"role": "admin", "deviceName": "phone"}));
        assert_eq!(stored, json!({"role": "admin", "deviceName": "phone"}));
    }

    #[test]
    fn test_dates_materialized_on_output() {
        let registry = registry();
        let transforms = FieldTransforms::default();
        let t = Transformer::new(&registry, IdType::Text, &transforms);
        let record = t.output(
            "session",
            json!({"id": "s1", "expiresAt": "2030-01-01T00:00:00Z", "token": "2030-01-01"}),
        );
        assert_eq!(record["expiresAt"], json!("2030-01-01T00:00:00.000Z"));
        assert_eq!(record["token"], json!("2030-01-01"));
    }

    #[test]
    fn test_field_transforms_applied() {
        let registry = registry();
        let transforms = FieldTransforms::new()
            .on_input("user", "email", |v| json!(v.as_str().unwrap_or_default().to_lowercase()))
            .on_output("user", "name", |v| json!(format!("{}!", v.as_str().unwrap_or_default())));
        let t = Transformer::new(&registry, IdType::Text, &transforms);
        let stored = t.input("user", &json!({"email": "A@B.COM"}));
        assert_eq!(stored["email"], json!("a@b.com"));
        let record = t.output("user", json!({"name": "Alice"}));
        assert_eq!(record["name"], json!("Alice!"));
    }
}
