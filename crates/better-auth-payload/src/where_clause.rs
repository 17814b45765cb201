// Where-clause compiler — converts better-auth `WhereClause` lists into the
// document store's filter tree.
//
// The store's vocabulary is the Payload where syntax:
//   { field: { equals: v } }
//   { AND: [ ... ], OR: [ ... ] }
// Only one level of grouping is produced. A clause list cannot express deeper
// nesting, and none is inferred.

use better_auth_core::db::adapter::{Connector, Operator, WhereClause};
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::config::IdType;
use crate::registry::CollectionSchemaMap;
use crate::transform::coerce_id;

/// Comparison operators understood by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    Contains,
    In,
    /// SQL-style pattern with `%` wildcards.
    Like,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanEqual => "greater_than_equal",
            Self::LessThan => "less_than",
            Self::LessThanEqual => "less_than_equal",
            Self::Contains => "contains",
            Self::In => "in",
            Self::Like => "like",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "equals" => Self::Equals,
            "not_equals" => Self::NotEquals,
            "greater_than" => Self::GreaterThan,
            "greater_than_equal" => Self::GreaterThanEqual,
            "less_than" => Self::LessThan,
            "less_than_equal" => Self::LessThanEqual,
            "contains" => Self::Contains,
            "in" => Self::In,
            "like" => Self::Like,
            _ => return None,
        })
    }
}

/// A condition on a single storage field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Value,
}

/// Compiled filter tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StorageFilter {
    /// No restriction.
    #[default]
    All,
    Field(FieldFilter),
    /// Every `and` entry must match, and at least one `or` entry when any.
    Group {
        and: Vec<StorageFilter>,
        or: Vec<StorageFilter>,
    },
}

impl StorageFilter {
    pub fn field(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self::Field(FieldFilter {
            field: field.into(),
            operator,
            value,
        })
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Render the filter in the store's JSON where syntax.
    pub fn to_json(&self) -> Value {
        match self {
            Self::All => json!({}),
            Self::Field(f) => {
                let mut condition = Map::new();
                condition.insert(f.operator.as_str().to_string(), f.value.clone());
                let mut map = Map::new();
                map.insert(f.field.clone(), Value::Object(condition));
                Value::Object(map)
            }
            Self::Group { and, or } => {
                let mut map = Map::new();
                if !and.is_empty() {
                    map.insert("AND".into(), and.iter().map(Self::to_json).collect());
                }
                if !or.is_empty() {
                    map.insert("OR".into(), or.iter().map(Self::to_json).collect());
                }
                Value::Object(map)
            }
        }
    }
}

impl Serialize for StorageFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Map a better-auth operator onto the store's operator and value.
fn map_operator(operator: Operator, value: Value) -> (FilterOperator, Value) {
    match operator {
        Operator::Eq => (FilterOperator::Equals, value),
        Operator::Ne => (FilterOperator::NotEquals, value),
        Operator::Gt => (FilterOperator::GreaterThan, value),
        Operator::Gte => (FilterOperator::GreaterThanEqual, value),
        Operator::Lt => (FilterOperator::LessThan, value),
        Operator::Lte => (FilterOperator::LessThanEqual, value),
        Operator::Contains => (FilterOperator::Contains, value),
        Operator::In => (FilterOperator::In, value),
        Operator::StartsWith => (FilterOperator::Like, json!(format!("{}%", pattern_text(&value)))),
        Operator::EndsWith => (FilterOperator::Like, json!(format!("%{}", pattern_text(&value)))),
        Operator::Unknown => (FilterOperator::Equals, value),
    }
}

/// Literal text for a `like` pattern, with `\`, `%` and `_` escaped.
fn pattern_text(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Coerce a where value aimed at an id-valued field.
///
/// Bare scalars and `{ id }` objects are coerced per `id_type`; arrays are
/// coerced element-wise.
fn coerce_where_id(value: &Value, id_type: IdType) -> Value {
    match value {
        Value::Object(obj) => match obj.get("id") {
            Some(id) => coerce_id(id, id_type),
            None => value.clone(),
        },
        Value::Array(items) => items.iter().map(|v| coerce_where_id(v, id_type)).collect(),
        other => coerce_id(other, id_type),
    }
}

fn compile_clause(
    registry: &CollectionSchemaMap,
    model: &str,
    clause: &WhereClause,
    id_type: IdType,
) -> StorageFilter {
    let field_name = registry.resolve_field_name(model, &clause.field);
    let id_valued = field_name == "id" || registry.is_reference_field(model, &clause.field);
    let value = if id_valued {
        coerce_where_id(&clause.value, id_type)
    } else {
        clause.value.clone()
    };
    let (operator, value) = map_operator(clause.operator, value);
    StorageFilter::field(field_name, operator, value)
}

/// Compile a clause list for `model` into a store filter.
///
/// * empty → [`StorageFilter::All`]
/// * one clause → a single field condition
/// * more → `AND`/`OR` groups split on each clause's connector
///   (missing connector counts as AND); empty groups are omitted.
pub fn compile(
    registry: &CollectionSchemaMap,
    model: &str,
    clauses: &[WhereClause],
    id_type: IdType,
) -> StorageFilter {
    match clauses {
        [] => StorageFilter::All,
        [single] => compile_clause(registry, model, single, id_type),
        many => {
            let (or, and): (Vec<&WhereClause>, Vec<&WhereClause>) = many
                .iter()
                .partition(|c| c.connector == Some(Connector::Or));
            StorageFilter::Group {
                and: and
                    .into_iter()
                    .map(|c| compile_clause(registry, model, c, id_type))
                    .collect(),
                or: or
                    .into_iter()
                    .map(|c| compile_clause(registry, model, c, id_type))
                    .collect(),
            }
        }
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_))
}

/// Detect a bare "primary key equals X" filter.
///
/// Matches `{id: {equals: x}}` and `{id: {contains: [x]}}` only; grouped
/// forms never qualify.
pub fn single_id(filter: &StorageFilter) -> Option<Value> {
    let StorageFilter::Field(f) = filter else {
        return None;
    };
    if f.field != "id" {
        return None;
    }
    match (f.operator, &f.value) {
        (FilterOperator::Equals, v) if is_scalar(v) => Some(v.clone()),
        (FilterOperator::Contains, Value::Array(items)) if items.len() == 1 && is_scalar(&items[0]) => {
            Some(items[0].clone())
        }
        _ => None,
    }
}
