// Schema registry — the canonical mapping from auth model/field keys to
// collection slugs and storage field names.
//
// Construction is two-phase and explicit:
//   1. `CollectionSchemaMap::build_default` from the auth schema + overrides
//   2. `CollectionSchemaMap::synchronize` against the store's final collections
// After that the map is shared read-only (`Arc`) by every adapter call.

use std::collections::{BTreeMap, HashMap};

use better_auth_core::db::schema::{AuthSchema, FieldType};
use better_auth_core::error::BetterAuthError;
use serde::Serialize;

use crate::config::ModelOverride;
use crate::store::CollectionConfig;

/// The model that always carries a `role` field.
pub const USER_MODEL: &str = "user";
pub const ROLE_FIELD: &str = "role";

/// Relationship pointer on a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelReference {
    /// Collection slug of the referenced model. Kept in sync with renames.
    pub model: String,
    /// Referenced field key, usually `id`.
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub field_key: String,
    pub field_name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<ModelReference>,
}

impl FieldDescriptor {
    /// A reference field is a relationship no matter its declared scalar type.
    pub fn is_reference(&self) -> bool {
        self.references.is_some()
    }

    pub fn is_renamed(&self) -> bool {
        self.field_key != self.field_name
    }

    /// Relationship fields declared with an array type hold many ids.
    pub fn has_many(&self) -> bool {
        self.field_type.is_array()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSchema {
    pub model_key: String,
    pub collection_slug: String,
    /// Field key → descriptor. `id` is never listed; it is never renamed.
    pub fields: BTreeMap<String, FieldDescriptor>,
    pub order: i32,
    /// Storage field name → field key.
    #[serde(skip)]
    by_name: HashMap<String, String>,
}

impl ModelSchema {
    pub fn field(&self, field_key: &str) -> Option<&FieldDescriptor> {
        self.fields.get(field_key)
    }

    /// Look a field up by its storage name.
    pub fn field_by_name(&self, field_name: &str) -> Option<&FieldDescriptor> {
        self.by_name
            .get(field_name)
            .and_then(|key| self.fields.get(key))
    }

    pub fn reference_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values().filter(|f| f.is_reference())
    }

    fn reindex(&mut self) {
        self.by_name = self
            .fields
            .values()
            .map(|f| (f.field_name.clone(), f.field_key.clone()))
            .collect();
    }
}

/// One problem found while synchronizing against concrete collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncIssue {
    /// A collection is tagged with a model key the registry does not know.
    UnknownModel { model_key: String, slug: String },
    /// A field is tagged with a field key the model does not declare.
    UnknownField {
        model_key: String,
        slug: String,
        field_key: String,
        field_name: String,
    },
    /// No concrete collection carries this model's tag.
    MissingCollection { model_key: String },
    /// Two models ended up on the same collection slug.
    DuplicateSlug { slug: String, model_keys: Vec<String> },
}

impl std::fmt::Display for SyncIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownModel { model_key, slug } => {
                write!(f, "collection '{slug}' is tagged with unknown model '{model_key}'")
            }
            Self::UnknownField {
                model_key,
                slug,
                field_key,
                field_name,
            } => write!(
                f,
                "field '{field_name}' on collection '{slug}' is tagged with unknown field '{field_key}' of model '{model_key}'"
            ),
            Self::MissingCollection { model_key } => {
                write!(f, "no collection is tagged with model '{model_key}'")
            }
            Self::DuplicateSlug { slug, model_keys } => {
                write!(f, "models {model_keys:?} share collection slug '{slug}'")
            }
        }
    }
}

/// Outcome of a synchronization pass. Issues are integration bugs; the
/// offending entries were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub issues: Vec<SyncIssue>,
    /// Old slug → new slug for every renamed collection.
    pub renamed: BTreeMap<String, String>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// The canonical model table. Immutable once built and synchronized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionSchemaMap {
    models: HashMap<String, ModelSchema>,
    /// Collection slug → model key.
    #[serde(skip)]
    by_slug: HashMap<String, String>,
}

impl CollectionSchemaMap {
    /// Phase one: derive the map from the auth schema and user overrides.
    ///
    /// Slug precedence: override, table `model_name`, model key.
    /// Field name precedence: override, schema `field_name`, field key.
    /// Fails when two models resolve to the same slug.
    pub fn build_default(
        schema: &AuthSchema,
        overrides: &HashMap<String, ModelOverride>,
    ) -> Result<Self, BetterAuthError> {
        let mut tables: Vec<_> = schema.tables.values().collect();
        tables.sort_by(|a, b| {
            a.order
                .unwrap_or(i32::MAX)
                .cmp(&b.order.unwrap_or(i32::MAX))
                .then_with(|| a.name.cmp(&b.name))
        });

        let slug_of = |model_key: &str| -> String {
            overrides
                .get(model_key)
                .and_then(|o| o.slug.clone())
                .or_else(|| {
                    schema
                        .tables
                        .get(model_key)
                        .and_then(|t| t.model_name.clone())
                })
                .unwrap_or_else(|| model_key.to_string())
        };

        let mut map = Self::default();
        for (index, table) in tables.into_iter().enumerate() {
            let model_key = table.name.clone();
            let model_override = overrides.get(&model_key);
            let mut fields = BTreeMap::new();

            for (field_key, field) in &table.fields {
                if field_key == "id" {
                    continue;
                }
                let field_name = model_override
                    .and_then(|o| o.fields.get(field_key).cloned())
                    .or_else(|| field.field_name.clone())
                    .unwrap_or_else(|| field_key.clone());
                let references = field.references.as_ref().map(|r| ModelReference {
                    model: slug_of(&r.model),
                    field: r.field.clone(),
                });
                fields.insert(
                    field_key.clone(),
                    FieldDescriptor {
                        field_key: field_key.clone(),
                        field_name,
                        field_type: field.field_type,
                        required: field.required,
                        unique: field.unique,
                        default_value: field.default_value.clone(),
                        references,
                    },
                );
            }

            if model_key == USER_MODEL && !fields.contains_key(ROLE_FIELD) {
                let field_name = model_override
                    .and_then(|o| o.fields.get(ROLE_FIELD).cloned())
                    .unwrap_or_else(|| ROLE_FIELD.to_string());
                fields.insert(
                    ROLE_FIELD.to_string(),
                    FieldDescriptor {
                        field_key: ROLE_FIELD.to_string(),
                        field_name,
                        field_type: FieldType::String,
                        required: false,
                        unique: false,
                        default_value: Some(serde_json::Value::String("user".into())),
                        references: None,
                    },
                );
            }

            let collection_slug = slug_of(&model_key);
            if let Some(existing) = map.by_slug.get(&collection_slug) {
                return Err(BetterAuthError::Config(format!(
                    "models '{existing}' and '{model_key}' both map to collection '{collection_slug}'"
                )));
            }

            let mut model = ModelSchema {
                model_key: model_key.clone(),
                collection_slug: collection_slug.clone(),
                fields,
                order: table.order.unwrap_or(index as i32),
                by_name: HashMap::new(),
            };
            model.reindex();
            map.by_slug.insert(collection_slug, model_key.clone());
            map.models.insert(model_key, model);
        }

        Ok(map)
    }

    /// Phase two: rewrite slugs and field names to match the concrete
    /// collections, using the model/field tags each collection carries.
    ///
    /// All new slugs are decided first; a single pass then rewrites every
    /// `references.model` that still points at an old slug, so the order
    /// collections are visited in does not matter.
    pub fn synchronize(mut self, collections: &[CollectionConfig]) -> (Self, SyncReport) {
        let mut report = SyncReport::default();
        let mut seen = Vec::new();

        for collection in collections {
            let Some(model_key) = collection.model_key.as_deref() else {
                continue;
            };
            let Some(model) = self.models.get_mut(model_key) else {
                report.issues.push(SyncIssue::UnknownModel {
                    model_key: model_key.to_string(),
                    slug: collection.slug.clone(),
                });
                continue;
            };
            seen.push(model_key.to_string());

            if model.collection_slug != collection.slug {
                report
                    .renamed
                    .insert(model.collection_slug.clone(), collection.slug.clone());
                model.collection_slug = collection.slug.clone();
            }

            for field in &collection.fields {
                let Some(field_key) = field.field_key.as_deref() else {
                    continue;
                };
                if field_key == "id" {
                    continue;
                }
                match model.fields.get_mut(field_key) {
                    Some(descriptor) => descriptor.field_name = field.name.clone(),
                    None => report.issues.push(SyncIssue::UnknownField {
                        model_key: model_key.to_string(),
                        slug: collection.slug.clone(),
                        field_key: field_key.to_string(),
                        field_name: field.name.clone(),
                    }),
                }
            }
        }

        for model in self.models.values_mut() {
            for field in model.fields.values_mut() {
                if let Some(reference) = field.references.as_mut() {
                    if let Some(new_slug) = report.renamed.get(&reference.model) {
                        reference.model = new_slug.clone();
                    }
                }
            }
            model.reindex();
        }

        let mut missing: Vec<_> = self
            .models
            .keys()
            .filter(|key| !seen.contains(key))
            .cloned()
            .collect();
        missing.sort();
        report.issues.extend(
            missing
                .into_iter()
                .map(|model_key| SyncIssue::MissingCollection { model_key }),
        );

        self.rebuild_slug_index(&mut report);

        for issue in &report.issues {
            match issue {
                SyncIssue::MissingCollection { .. } => tracing::warn!("[Payload Adapter] {issue}"),
                _ => tracing::error!("[Payload Adapter] {issue}"),
            }
        }

        (self, report)
    }

    fn rebuild_slug_index(&mut self, report: &mut SyncReport) {
        let mut by_slug: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for model in self.models_ordered() {
            by_slug
                .entry(model.collection_slug.clone())
                .or_default()
                .push(model.model_key.clone());
        }
        self.by_slug.clear();
        for (slug, model_keys) in by_slug {
            // First-seen model keeps the slug for reverse lookups.
            self.by_slug.insert(slug.clone(), model_keys[0].clone());
            if model_keys.len() > 1 {
                report
                    .issues
                    .push(SyncIssue::DuplicateSlug { slug, model_keys });
            }
        }
    }

    pub fn model(&self, model_key: &str) -> Option<&ModelSchema> {
        self.models.get(model_key)
    }

    /// Model key owning the given collection slug.
    pub fn model_for_slug(&self, slug: &str) -> Option<&str> {
        self.by_slug.get(slug).map(String::as_str)
    }

    /// Models sorted by `order`, then key.
    pub fn models_ordered(&self) -> Vec<&ModelSchema> {
        let mut models: Vec<_> = self.models.values().collect();
        models.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.model_key.cmp(&b.model_key))
        });
        models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use better_auth_core::db::schema::{AuthTable, SchemaField};

    use crate::store::{CollectionConfig, CollectionField};

    fn overrides() -> HashMap<String, ModelOverride> {
        HashMap::new()
    }

    #[test]
    fn test_build_default_identity() {
        let map = CollectionSchemaMap::build_default(&AuthSchema::core_schema(), &overrides())
            .unwrap();
        assert_eq!(map.len(), 4);
        let session = map.model("session").unwrap();
        assert_eq!(session.collection_slug, "session");
        let user_id = session.field("userId").unwrap();
        assert_eq!(user_id.field_name, "userId");
        assert_eq!(user_id.references.as_ref().unwrap().model, "user");
        assert_eq!(map.model_for_slug("session"), Some("session"));
    }

    #[test]
    fn test_build_default_adds_role() {
        let map = CollectionSchemaMap::build_default(&AuthSchema::core_schema(), &overrides())
            .unwrap();
        let role = map.model("user").unwrap().field(ROLE_FIELD).unwrap();
        assert_eq!(role.field_type, FieldType::String);
        assert_eq!(role.default_value, Some(serde_json::json!("user")));
        assert!(map.model("session").unwrap().field(ROLE_FIELD).is_none());
    }

    #[test]
    fn test_build_default_keeps_declared_role() {
        let schema = AuthSchema::new().table(
            AuthTable::new("user").field("role", SchemaField::required_string().with_field_name("roles")),
        );
        let map = CollectionSchemaMap::build_default(&schema, &overrides()).unwrap();
        let role = map.model("user").unwrap().field(ROLE_FIELD).unwrap();
        assert_eq!(role.field_name, "roles");
        assert!(role.required);
    }

    #[test]
    fn test_build_default_overrides() {
        let mut overrides = overrides();
        overrides.insert(
            "user".into(),
            ModelOverride::slug("users").field("emailVerified", "verified"),
        );
        overrides.insert("session".into(), ModelOverride::default().field("userId", "user"));
        let map = CollectionSchemaMap::build_default(&AuthSchema::core_schema(), &overrides)
            .unwrap();

        let user = map.model("user").unwrap();
        assert_eq!(user.collection_slug, "users");
        assert_eq!(user.field("emailVerified").unwrap().field_name, "verified");
        assert_eq!(user.field_by_name("verified").unwrap().field_key, "emailVerified");

        let session = map.model("session").unwrap();
        let user_id = session.field("userId").unwrap();
        assert_eq!(user_id.field_name, "user");
        assert!(user_id.is_renamed());
        assert_eq!(user_id.references.as_ref().unwrap().model, "users");
    }

    #[test]
    fn test_build_default_rejects_duplicate_slug() {
        let mut overrides = overrides();
        overrides.insert("account".into(), ModelOverride::slug("session"));
        let err = CollectionSchemaMap::build_default(&AuthSchema::core_schema(), &overrides)
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_build_default_skips_id_field() {
        let schema = AuthSchema::new().table(
            AuthTable::new("verification")
                .field("id", SchemaField::required_string().with_field_name("_id"))
                .field("value", SchemaField::required_string()),
        );
        let map = CollectionSchemaMap::build_default(&schema, &overrides()).unwrap();
        assert!(map.model("verification").unwrap().field("id").is_none());
    }

    fn concrete(slug: &str, model: &str, fields: &[(&str, &str)]) -> CollectionConfig {
        fields.iter().fold(CollectionConfig::new(slug).tagged(model), |c, (name, key)| {
            c.field(CollectionField::new(name).tagged(key))
        })
    }

    #[test]
    fn test_synchronize_renames_slugs_and_references() {
        let mut overrides = overrides();
        overrides.insert("user".into(), ModelOverride::slug("users"));
        let map = CollectionSchemaMap::build_default(&AuthSchema::core_schema(), &overrides)
            .unwrap();

        // Referencing models come before their target on purpose.
        let collections = vec![
            concrete("sessions", "session", &[("user", "userId"), ("token", "token")]),
            concrete("accounts", "account", &[("user", "userId")]),
            concrete("app_users", "user", &[("email", "email")]),
            concrete("verifications", "verification", &[]),
        ];
        let (map, report) = map.synchronize(&collections);

        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(report.renamed["users"], "app_users");
        assert_eq!(map.model("user").unwrap().collection_slug, "app_users");
        assert_eq!(map.model_for_slug("app_users"), Some("user"));
        assert_eq!(map.model_for_slug("users"), None);

        for model in map.models_ordered() {
            for field in model.reference_fields() {
                assert_eq!(field.references.as_ref().unwrap().model, "app_users");
            }
        }
        let session = map.model("session").unwrap();
        assert_eq!(session.field("userId").unwrap().field_name, "user");
        assert_eq!(session.field_by_name("user").unwrap().field_key, "userId");
    }

    #[test]
    fn test_synchronize_reports_unmatched_tags() {
        let map = CollectionSchemaMap::build_default(&AuthSchema::core_schema(), &overrides())
            .unwrap();
        let collections = vec![
            concrete("user", "user", &[("nickname", "nickName")]),
            concrete("session", "session", &[]),
            concrete("account", "account", &[]),
            concrete("verification", "verification", &[]),
            concrete("posts", "post", &[]),
            CollectionConfig::new("media"),
        ];
        let (map, report) = map.synchronize(&collections);

        assert_eq!(report.issues.len(), 2);
        assert!(report.issues.contains(&SyncIssue::UnknownModel {
            model_key: "post".into(),
            slug: "posts".into(),
        }));
        assert!(matches!(
            &report.issues[0],
            SyncIssue::UnknownField { field_key, .. } if field_key == "nickName"
        ));
        // Unmatched entries are skipped, the rest is untouched.
        assert_eq!(map.model("user").unwrap().field("name").unwrap().field_name, "name");
    }

    #[test]
    fn test_synchronize_reports_missing_and_duplicates() {
        let map = CollectionSchemaMap::build_default(&AuthSchema::core_schema(), &overrides())
            .unwrap();
        let collections = vec![
            concrete("shared", "session", &[]),
            concrete("shared", "account", &[]),
            concrete("user", "user", &[]),
        ];
        let (map, report) = map.synchronize(&collections);
        assert!(report
            .issues
            .contains(&SyncIssue::MissingCollection { model_key: "verification".into() }));
        assert!(report.issues.iter().any(|i| matches!(
            i,
            SyncIssue::DuplicateSlug { slug, model_keys } if slug == "shared" && model_keys.len() == 2
        )));
        // session has the lower order, so it keeps the reverse lookup.
        assert_eq!(map.model_for_slug("shared"), Some("session"));
    }

    #[test]
    fn test_synchronize_is_idempotent() {
        let map = CollectionSchemaMap::build_default(&AuthSchema::core_schema(), &overrides())
            .unwrap();
        let collections = vec![
            concrete("app_users", "user", &[]),
            concrete("session", "session", &[("user", "userId")]),
            concrete("account", "account", &[]),
            concrete("verification", "verification", &[]),
        ];
        let (once, _) = map.synchronize(&collections);
        let (twice, report) = once.clone().synchronize(&collections);
        assert_eq!(once, twice);
        assert!(report.renamed.is_empty());
    }
}
