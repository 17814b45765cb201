pub mod adapter;
pub mod schema;

pub use adapter::Adapter;
pub use schema::{AuthSchema, AuthTable, FieldReference, FieldType, SchemaField};
