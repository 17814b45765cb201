// Name resolution on top of the schema registry.
//
// Every lookup is a hash hit and never fails: unknown models and fields fall
// back to the name the caller passed in, so plugin fields that were never
// registered still reach the store untouched.

use crate::registry::{CollectionSchemaMap, FieldDescriptor, ModelSchema};

impl CollectionSchemaMap {
    /// Model key for a name that may be either a model key or a collection slug.
    pub fn resolve_model_key<'a>(&'a self, name: &'a str) -> &'a str {
        if self.model(name).is_some() {
            return name;
        }
        self.model_for_slug(name).unwrap_or(name)
    }

    fn lookup(&self, model: &str) -> Option<&ModelSchema> {
        self.model(self.resolve_model_key(model))
    }

    pub fn resolve_collection_slug<'a>(&'a self, model: &'a str) -> &'a str {
        self.lookup(model)
            .map(|m| m.collection_slug.as_str())
            .unwrap_or(model)
    }

    /// Storage field name for a logical field. `id` is never renamed.
    pub fn resolve_field_name<'a>(&'a self, model: &str, field: &'a str) -> &'a str {
        if field == "id" {
            return "id";
        }
        self.descriptor(model, field)
            .map(|f| f.field_name.as_str())
            .unwrap_or(field)
    }

    /// Logical field key for a storage field name; the inverse of
    /// [`resolve_field_name`](Self::resolve_field_name).
    pub fn resolve_field_key<'a>(&'a self, model: &str, field_name: &'a str) -> &'a str {
        if field_name == "id" {
            return "id";
        }
        self.lookup(model)
            .and_then(|m| m.field_by_name(field_name))
            .map(|f| f.field_key.as_str())
            .unwrap_or(field_name)
    }

    pub fn descriptor(&self, model: &str, field: &str) -> Option<&FieldDescriptor> {
        self.lookup(model).and_then(|m| m.field(field))
    }

    /// True when `field` names a reference field, by field key or by
    /// storage name.
    pub fn is_reference_field(&self, model: &str, field: &str) -> bool {
        self.lookup(model)
            .and_then(|m| m.field(field).or_else(|| m.field_by_name(field)))
            .is_some_and(FieldDescriptor::is_reference)
    }
}
