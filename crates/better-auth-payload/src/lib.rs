// better-auth-payload — Payload-style document store adapter for better-auth.
//
// Translates better-auth's model/field/where-clause queries into collection
// operations on a `DocumentStore`:
// - model keys → collection slugs, field keys → storage field names
// - where clauses → Payload where trees (`equals`, `like`, `AND`/`OR`)
// - relationship ids coerced to the store's id type (number | text)
// - offset pagination mapped onto page-based pagination
//
// The registry is built in two explicit phases (`build_default`, then
// `synchronize` against the store's collections) and is immutable after.

pub mod adapter;
pub mod config;
pub mod memory_store;
pub mod registry;
pub mod resolver;
pub mod schema_gen;
pub mod store;
pub mod transform;
pub mod where_clause;

pub use adapter::{PayloadAdapter, PayloadTransaction};
pub use config::{ErrorPolicy, FieldTransforms, IdType, ModelOverride, PayloadAdapterConfig};
pub use memory_store::MemoryDocumentStore;
pub use registry::{CollectionSchemaMap, SyncIssue, SyncReport};
pub use store::{CollectionConfig, CollectionField, DocumentStore, StoreError, StoreSource};
pub use where_clause::StorageFilter;
