// Database adapter trait — the core abstraction that all database backends implement.
//
// Maps to: packages/core/src/db/adapter/index.ts
// This is the central interface: create, findOne, findMany, update, delete, count,
// plus transaction support. All query filter operators are preserved.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::db::schema::AuthSchema;
use crate::error::BetterAuthError;

/// Result type for adapter operations.
pub type AdapterResult<T> = std::result::Result<T, BetterAuthError>;

// ─── Where Clause ────────────────────────────────────────────────

/// Comparison operators for WHERE clauses.
/// Matches the TypeScript `Operator` union type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Equal (default).
    #[default]
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Value is in the given list.
    In,
    /// String contains substring.
    Contains,
    /// String starts with prefix.
    StartsWith,
    /// String ends with suffix.
    EndsWith,
    /// Any operator name this version does not recognize.
    /// Backends treat it as equality.
    #[serde(other)]
    Unknown,
}

/// A single WHERE condition.
/// Maps to the TypeScript `Where` type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    /// The field name to filter on.
    pub field: String,
    /// The comparison value.
    pub value: serde_json::Value,
    /// The comparison operator (default: Eq).
    #[serde(default)]
    pub operator: Operator,
    /// Connector joining this clause to the rest. None is treated as AND.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector: Option<Connector>,
}

/// Logical connector between WHERE clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connector {
    And,
    Or,
}

impl WhereClause {
    /// Filter with an explicit operator.
    pub fn new(
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            operator,
            connector: None,
        }
    }

    /// Simple equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    /// Add an AND connector.
    pub fn and(mut self) -> Self {
        self.connector = Some(Connector::And);
        self
    }

    /// Add an OR connector.
    pub fn or(mut self) -> Self {
        self.connector = Some(Connector::Or);
        self
    }
}

// ─── Sort / Select / Pagination ──────────────────────────────────

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort specification (field + direction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    pub direction: SortDirection,
}

impl SortBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

// ─── Join Configuration ──────────────────────────────────────────

/// Per-model join request. Maps to `true | { limit?: number }` in TypeScript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JoinConfig {
    /// `true` joins with backend defaults, `false` disables the join.
    Enabled(bool),
    /// Join with options.
    Options {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<i64>,
    },
}

impl JoinConfig {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Enabled(false))
    }

    pub fn limit(&self) -> Option<i64> {
        match self {
            Self::Options { limit } => *limit,
            Self::Enabled(_) => None,
        }
    }
}

/// Joins keyed by the related model name.
pub type JoinOption = BTreeMap<String, JoinConfig>;

// ─── Find Many Query ─────────────────────────────────────────────

/// Query parameters for `find_many`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindManyQuery {
    #[serde(default)]
    pub where_clauses: Vec<WhereClause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join: Option<JoinOption>,
}

// ─── Schema Generation ───────────────────────────────────────────

/// Result of a schema comparison or generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SchemaStatus {
    /// Schema matches — no changes needed.
    UpToDate,
    /// Schema needs changes. Contains the statements or generated definitions.
    NeedsMigration {
        statements: Vec<String>,
    },
}

/// Options for schema creation/generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaOptions {
    /// Where to write a generated schema artifact, for backends that emit one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

// ─── Adapter Trait ───────────────────────────────────────────────

/// The core database adapter trait.
///
/// Every database backend implements this trait. The adapter works with
/// `serde_json::Value` to be schema-agnostic; logical model and field names
/// go in, logical records come out.
///
/// Maps to: `Adapter` in `packages/core/src/db/adapter/index.ts`
#[async_trait]
pub trait Adapter: Send + Sync + fmt::Debug {
    /// Create a new record in the given model/table.
    /// Returns the created record (with auto-generated fields like `id`),
    /// or `None` when the backend could not create it.
    async fn create(
        &self,
        model: &str,
        data: serde_json::Value,
        select: Option<&[String]>,
    ) -> AdapterResult<Option<serde_json::Value>>;

    /// Find a single record matching the WHERE clauses.
    /// Returns `None` if no match found.
    async fn find_one(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        select: Option<&[String]>,
        join: Option<&JoinOption>,
    ) -> AdapterResult<Option<serde_json::Value>>;

    /// Find multiple records matching the query parameters.
    async fn find_many(
        &self,
        model: &str,
        query: FindManyQuery,
    ) -> AdapterResult<Vec<serde_json::Value>>;

    /// Count records matching the WHERE clauses.
    async fn count(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
    ) -> AdapterResult<i64>;

    /// Update a single record matching the WHERE clauses.
    /// Returns the updated record, or `None` if no match was found.
    async fn update(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: serde_json::Value,
    ) -> AdapterResult<Option<serde_json::Value>>;

    /// Update multiple records matching the WHERE clauses.
    /// Returns the number of affected rows.
    async fn update_many(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: serde_json::Value,
    ) -> AdapterResult<i64>;

    /// Delete a single record matching the WHERE clauses.
    async fn delete(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
    ) -> AdapterResult<()>;

    /// Delete multiple records matching the WHERE clauses.
    /// Returns the number of deleted rows.
    async fn delete_many(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
    ) -> AdapterResult<i64>;

    /// Check or generate the backend schema for the given auth schema.
    async fn create_schema(
        &self,
        schema: &AuthSchema,
        options: &SchemaOptions,
    ) -> AdapterResult<SchemaStatus>;

    /// Begin a new database transaction.
    /// Returns a transactional adapter that implements the same `Adapter` trait.
    async fn begin_transaction(&self) -> AdapterResult<Box<dyn TransactionAdapter>>;
}

/// Extension of [`Adapter`] for transaction contexts.
/// Provides commit/rollback on top of the standard CRUD operations.
#[async_trait]
pub trait TransactionAdapter: Adapter {
    /// Commit the transaction.
    async fn commit(self: Box<Self>) -> AdapterResult<()>;

    /// Rollback the transaction.
    async fn rollback(self: Box<Self>) -> AdapterResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_where_clause_deserialize_defaults() {
        let clause: WhereClause = serde_json::from_value(json!({
            "field": "email",
            "value": "a@b.com"
        }))
        .unwrap();
        assert_eq!(clause.operator, Operator::Eq);
        assert!(clause.connector.is_none());
    }

    #[test]
    fn test_operator_unknown() {
        let clause: WhereClause = serde_json::from_value(json!({
            "field": "email",
            "value": "a@b.com",
            "operator": "regex"
        }))
        .unwrap();
        assert_eq!(clause.operator, Operator::Unknown);
    }

    #[test]
    fn test_operator_snake_case() {
        let op: Operator = serde_json::from_value(json!("starts_with")).unwrap();
        assert_eq!(op, Operator::StartsWith);
        let connector: Connector = serde_json::from_value(json!("OR")).unwrap();
        assert_eq!(connector, Connector::Or);
    }

    #[test]
    fn test_join_config_shapes() {
        let join: JoinOption = serde_json::from_value(json!({
            "account": true,
            "session": { "limit": 5 },
            "verification": false
        }))
        .unwrap();
        assert_eq!(join["account"], JoinConfig::Enabled(true));
        assert_eq!(join["session"].limit(), Some(5));
        assert!(!join["verification"].is_enabled());
    }

    #[test]
    fn test_clause_builders() {
        let clause = WhereClause::eq("name", "Alice").or();
        assert_eq!(clause.connector, Some(Connector::Or));
        assert_eq!(clause.value, json!("Alice"));
        assert_eq!(SortBy::desc("createdAt").direction, SortDirection::Desc);
    }
}
