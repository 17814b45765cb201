// Document store seam — the operations the adapter needs from a Payload-style
// backend, plus the collection metadata it reads during synchronization.
//
// Implement `DocumentStore` for a real backend; `MemoryDocumentStore` is the
// in-process reference implementation used by tests.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use better_auth_core::error::HttpStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::where_clause::StorageFilter;

/// Failure reported by a document store. Carries an HTTP-style status so the
/// adapter can tell "not found" apart from real failures.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{status}: {message}")]
pub struct StoreError {
    pub status: HttpStatus,
    pub message: String,
}

impl StoreError {
    pub fn new(status: HttpStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(HttpStatus::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(HttpStatus::InternalServerError, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.status.is_not_found()
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A field on a concrete collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionField {
    pub name: String,
    /// Auth field key this field was generated from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_key: Option<String>,
    /// Target collection slug for relationship fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_to: Option<String>,
    #[serde(default)]
    pub has_many: bool,
    /// Value the store fills in when a created document omits the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl CollectionField {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn tagged(mut self, field_key: &str) -> Self {
        self.field_key = Some(field_key.to_string());
        self
    }

    pub fn relation(mut self, slug: &str) -> Self {
        self.relation_to = Some(slug.to_string());
        self
    }

    pub fn many(mut self) -> Self {
        self.has_many = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// A virtual "join" field: documents of `collection` whose `on` field points
/// back at this document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinField {
    pub name: String,
    pub collection: String,
    pub on: String,
}

/// Final configuration of a collection as the store sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfig {
    pub slug: String,
    /// Auth model key this collection was generated from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_key: Option<String>,
    #[serde(default)]
    pub fields: Vec<CollectionField>,
    #[serde(default)]
    pub join_fields: Vec<JoinField>,
}

impl CollectionConfig {
    pub fn new(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            ..Default::default()
        }
    }

    pub fn tagged(mut self, model_key: &str) -> Self {
        self.model_key = Some(model_key.to_string());
        self
    }

    pub fn field(mut self, field: CollectionField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn join(mut self, join: JoinField) -> Self {
        self.join_fields.push(join);
        self
    }

    pub fn field_named(&self, name: &str) -> Option<&CollectionField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn join_named(&self, name: &str) -> Option<&JoinField> {
        self.join_fields.iter().find(|j| j.name == name)
    }

    pub fn has_join(&self, name: &str) -> bool {
        self.join_named(name).is_some()
    }
}

/// Options for one requested join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

/// Join field name → options.
pub type JoinArgs = BTreeMap<String, JoinQuery>;

/// Arguments for [`DocumentStore::find`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindArgs {
    pub filter: StorageFilter,
    /// Storage field names to return. `None` returns every field.
    pub select: Option<Vec<String>>,
    /// Field name, `-` prefixed for descending.
    pub sort: Option<String>,
    pub joins: JoinArgs,
    pub limit: i64,
    /// 1-based page number.
    pub page: i64,
    pub depth: u32,
}

/// One page of documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaginatedDocs {
    pub docs: Vec<Value>,
    pub total_docs: i64,
}

/// Which documents an update or delete applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Id(Value),
    Where(StorageFilter),
}

/// Documents returned by an update or delete.
#[derive(Debug, Clone, PartialEq)]
pub enum Written {
    Doc(Value),
    Docs(Vec<Value>),
}

impl Written {
    pub fn into_docs(self) -> Vec<Value> {
        match self {
            Self::Doc(doc) => vec![doc],
            Self::Docs(docs) => docs,
        }
    }
}

/// Storage operations required by the adapter.
///
/// Documents are JSON objects keyed by storage field names. Relationship
/// values are raw ids at depth 0 and may be populated documents at depth 1+.
#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug {
    /// Final configuration of one collection.
    fn collection(&self, slug: &str) -> Option<CollectionConfig>;

    /// Final configuration of every collection.
    fn collections(&self) -> Vec<CollectionConfig>;

    async fn create(
        &self,
        collection: &str,
        data: Value,
        select: Option<&[String]>,
        depth: u32,
    ) -> StoreResult<Value>;

    /// Fails with a 404 when the document does not exist.
    async fn find_by_id(
        &self,
        collection: &str,
        id: &Value,
        select: Option<&[String]>,
        joins: &JoinArgs,
        depth: u32,
    ) -> StoreResult<Value>;

    async fn find(&self, collection: &str, args: FindArgs) -> StoreResult<PaginatedDocs>;

    /// Id targets fail with a 404 when the document does not exist.
    async fn update(
        &self,
        collection: &str,
        target: Target,
        data: Value,
        depth: u32,
    ) -> StoreResult<Written>;

    /// Id targets fail with a 404 when the document does not exist.
    async fn delete(&self, collection: &str, target: Target, depth: u32) -> StoreResult<Written>;

    async fn count(&self, collection: &str, filter: &StorageFilter) -> StoreResult<i64>;
}

/// Factory producing a store handle on demand.
pub type StoreFactory = Arc<dyn Fn() -> Arc<dyn DocumentStore> + Send + Sync>;

/// Where the adapter gets its store from.
#[derive(Clone)]
pub enum StoreSource {
    /// A ready store handle.
    Handle(Arc<dyn DocumentStore>),
    /// Resolved on every operation, for stores that are set up lazily.
    Factory(StoreFactory),
}

impl StoreSource {
    pub fn handle(store: Arc<dyn DocumentStore>) -> Self {
        Self::Handle(store)
    }

    pub fn factory<F>(f: F) -> Self
    where
        F: Fn() -> Arc<dyn DocumentStore> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(f))
    }

    pub fn resolve(&self) -> Arc<dyn DocumentStore> {
        match self {
            Self::Handle(store) => Arc::clone(store),
            Self::Factory(f) => f(),
        }
    }
}

impl fmt::Debug for StoreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handle(store) => f.debug_tuple("Handle").field(store).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

impl<S: DocumentStore + 'static> From<Arc<S>> for StoreSource {
    fn from(store: Arc<S>) -> Self {
        Self::Handle(store)
    }
}
