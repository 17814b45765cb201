// Collection generation — derives Payload-style collection definitions from
// the schema registry.
//
// Every generated collection and field carries the auth model/field key it
// came from in `custom`, so a later synchronization can match them up even
// after the user renames slugs or fields.

use better_auth_core::db::schema::FieldType;
use serde_json::{json, Map, Value};

use crate::registry::{CollectionSchemaMap, FieldDescriptor, ModelSchema};
use crate::store::{CollectionConfig, CollectionField, JoinField};

/// Join fields to declare on `target`: one per collection referencing it,
/// named after the referencing slug. The first reference field wins.
fn joins_for(map: &CollectionSchemaMap, target: &ModelSchema) -> Vec<JoinField> {
    let mut joins: Vec<JoinField> = Vec::new();
    for model in map.models_ordered() {
        for field in model.reference_fields() {
            let points_here = field
                .references
                .as_ref()
                .is_some_and(|r| r.model == target.collection_slug);
            if points_here && !joins.iter().any(|j| j.name == model.collection_slug) {
                joins.push(JoinField {
                    name: model.collection_slug.clone(),
                    collection: model.collection_slug.clone(),
                    on: field.field_name.clone(),
                });
            }
        }
    }
    joins
}

fn collection_field(field: &FieldDescriptor) -> CollectionField {
    let mut out = CollectionField::new(&field.field_name).tagged(&field.field_key);
    if let Some(reference) = &field.references {
        out = out.relation(&reference.model);
    }
    if field.has_many() {
        out = out.many();
    }
    if let Some(default) = &field.default_value {
        out = out.with_default(default.clone());
    }
    out
}

/// Collection configs as a store built from this registry would report them.
pub fn collection_configs(map: &CollectionSchemaMap) -> Vec<CollectionConfig> {
    map.models_ordered()
        .into_iter()
        .map(|model| {
            let config = model
                .fields
                .values()
                .fold(CollectionConfig::new(&model.collection_slug).tagged(&model.model_key), |c, f| {
                    c.field(collection_field(f))
                });
            joins_for(map, model).into_iter().fold(config, CollectionConfig::join)
        })
        .collect()
}

fn field_type_name(field: &FieldDescriptor) -> &'static str {
    if field.is_reference() {
        return "relationship";
    }
    match field.field_type {
        FieldType::String | FieldType::StringArray => "text",
        FieldType::Number | FieldType::NumberArray => "number",
        FieldType::Boolean => "checkbox",
        FieldType::Date => "date",
    }
}

fn field_definition(field: &FieldDescriptor) -> Value {
    let mut def = Map::new();
    def.insert("name".into(), json!(field.field_name));
    def.insert("type".into(), json!(field_type_name(field)));
    def.insert("required".into(), json!(field.required));
    if field.unique {
        def.insert("unique".into(), json!(true));
    }
    if let Some(reference) = &field.references {
        def.insert("relationTo".into(), json!(reference.model));
    }
    if field.has_many() {
        def.insert("hasMany".into(), json!(true));
    }
    if let Some(default) = &field.default_value {
        def.insert("defaultValue".into(), default.clone());
    }
    def.insert("custom".into(), json!({ "betterAuthFieldKey": field.field_key }));
    Value::Object(def)
}

/// One collection definition per model.
pub fn collection_definitions(map: &CollectionSchemaMap) -> Vec<Value> {
    map.models_ordered()
        .into_iter()
        .map(|model| {
            let mut fields: Vec<Value> = model.fields.values().map(field_definition).collect();
            fields.extend(joins_for(map, model).into_iter().map(|j| {
                json!({ "name": j.name, "type": "join", "collection": j.collection, "on": j.on })
            }));
            json!({
                "slug": model.collection_slug,
                "custom": { "betterAuthModelKey": model.model_key },
                "fields": fields,
            })
        })
        .collect()
}

/// Pretty-printed collection definitions, one string per model.
pub fn render_collections(map: &CollectionSchemaMap) -> Vec<String> {
    collection_definitions(map)
        .iter()
        .map(|def| format!("{def:#}"))
        .collect()
}
