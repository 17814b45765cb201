// Adapter configuration — id representation, logging, error policy and
// per-model renames.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Environment variable that turns on debug logs regardless of config.
pub const DEBUG_ENV_VAR: &str = "BETTER_AUTH_PAYLOAD_DEBUG";

/// How the document store represents primary keys and relationship values.
///
/// Fixed for the lifetime of an adapter. Values read back from the store are
/// always handed to the auth engine as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdType {
    /// Auto-incrementing numeric ids (SQL-backed stores).
    Number,
    /// Opaque string ids (document stores, UUIDs).
    #[default]
    Text,
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => write!(f, "number"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// What to do with store failures that are not a plain "not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log and return the empty result for the operation (null, `[]`, `0`).
    #[default]
    Absorb,
    /// Log and return `BetterAuthError::Database`.
    Propagate,
}

/// User renames for one model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelOverride {
    /// Collection slug to use instead of the model key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Field key → storage field name.
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

impl ModelOverride {
    pub fn slug(slug: &str) -> Self {
        Self {
            slug: Some(slug.to_string()),
            fields: HashMap::new(),
        }
    }

    pub fn field(mut self, field_key: &str, field_name: &str) -> Self {
        self.fields
            .insert(field_key.to_string(), field_name.to_string());
        self
    }
}

/// Signature of a per-field value transform.
pub type FieldTransformFn = Arc<dyn Fn(serde_json::Value) -> serde_json::Value + Send + Sync>;

/// Input and output transforms for a single field.
#[derive(Clone, Default)]
pub struct FieldTransform {
    /// Applied to the logical value before it is written.
    pub input: Option<FieldTransformFn>,
    /// Applied to the logical value after it is read.
    pub output: Option<FieldTransformFn>,
}

/// Per-field transforms keyed by `(model key, field key)`.
///
/// Built once with the adapter; lookups never allocate.
#[derive(Clone, Default)]
pub struct FieldTransforms {
    by_model: HashMap<String, HashMap<String, FieldTransform>>,
}

impl FieldTransforms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input transform for `model.field`.
    pub fn on_input<F>(mut self, model: &str, field: &str, f: F) -> Self
    where
        F: Fn(serde_json::Value) -> serde_json::Value + Send + Sync + 'static,
    {
        self.entry(model, field).input = Some(Arc::new(f));
        self
    }

    /// Register an output transform for `model.field`.
    pub fn on_output<F>(mut self, model: &str, field: &str, f: F) -> Self
    where
        F: Fn(serde_json::Value) -> serde_json::Value + Send + Sync + 'static,
    {
        self.entry(model, field).output = Some(Arc::new(f));
        self
    }

    pub fn get(&self, model: &str, field: &str) -> Option<&FieldTransform> {
        self.by_model.get(model).and_then(|fields| fields.get(field))
    }

    pub fn is_empty(&self) -> bool {
        self.by_model.is_empty()
    }

    fn entry(&mut self, model: &str, field: &str) -> &mut FieldTransform {
        self.by_model
            .entry(model.to_string())
            .or_default()
            .entry(field.to_string())
            .or_default()
    }
}

impl fmt::Debug for FieldTransforms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .by_model
            .iter()
            .flat_map(|(model, fields)| fields.keys().map(move |field| format!("{model}.{field}")))
            .collect();
        keys.sort();
        f.debug_struct("FieldTransforms").field("fields", &keys).finish()
    }
}

/// Configuration for the Payload adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadAdapterConfig {
    /// Id representation used by the store.
    ///
    /// Default: text
    #[serde(default)]
    pub id_type: IdType,

    /// Enable debug logs for every adapter operation.
    ///
    /// Default: false
    #[serde(default)]
    pub debug_logs: bool,

    /// Default: absorb
    #[serde(default)]
    pub error_policy: ErrorPolicy,

    /// Page size used by `find_many` when the caller gives no limit.
    ///
    /// Default: 10
    #[serde(default = "default_find_many_limit")]
    pub default_find_many_limit: i64,

    /// Population depth for reads.
    ///
    /// Default: 1
    #[serde(default = "default_read_depth")]
    pub read_depth: u32,

    /// Population depth for create/update/delete responses. Kept shallow so
    /// writes do not drag related documents along.
    ///
    /// Default: 0
    #[serde(default)]
    pub write_depth: u32,

    /// Per-model renames keyed by model key.
    #[serde(default)]
    pub models: HashMap<String, ModelOverride>,

    /// Per-field value transforms. Registered in code.
    #[serde(skip)]
    pub field_transforms: FieldTransforms,
}

fn default_find_many_limit() -> i64 {
    10
}

fn default_read_depth() -> u32 {
    1
}

impl Default for PayloadAdapterConfig {
    fn default() -> Self {
        Self {
            id_type: IdType::default(),
            debug_logs: false,
            error_policy: ErrorPolicy::default(),
            default_find_many_limit: default_find_many_limit(),
            read_depth: default_read_depth(),
            write_depth: 0,
            models: HashMap::new(),
            field_transforms: FieldTransforms::default(),
        }
    }
}

impl PayloadAdapterConfig {
    pub fn with_id_type(mut self, id_type: IdType) -> Self {
        self.id_type = id_type;
        self
    }

    pub fn with_model(mut self, model: &str, model_override: ModelOverride) -> Self {
        self.models.insert(model.to_string(), model_override);
        self
    }

    pub fn with_field_transforms(mut self, transforms: FieldTransforms) -> Self {
        self.field_transforms = transforms;
        self
    }

    /// Apply environment overrides (`BETTER_AUTH_PAYLOAD_DEBUG`).
    pub fn with_env(mut self) -> Self {
        if better_auth_core::env::env_flag(DEBUG_ENV_VAR) {
            self.debug_logs = true;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = PayloadAdapterConfig::default();
        assert_eq!(config.id_type, IdType::Text);
        assert_eq!(config.error_policy, ErrorPolicy::Absorb);
        assert_eq!(config.default_find_many_limit, 10);
        assert_eq!(config.read_depth, 1);
        assert_eq!(config.write_depth, 0);
        assert!(!config.debug_logs);
        assert!(config.field_transforms.is_empty());
    }

    #[test]
    fn test_deserialize_config() {
        let config: PayloadAdapterConfig = serde_json::from_value(json!({
            "idType": "number",
            "errorPolicy": "propagate",
            "models": {
                "user": { "slug": "users", "fields": { "emailVerified": "verified" } }
            }
        }))
        .unwrap();
        assert_eq!(config.id_type, IdType::Number);
        assert_eq!(config.error_policy, ErrorPolicy::Propagate);
        assert_eq!(config.default_find_many_limit, 10);
        let user = &config.models["user"];
        assert_eq!(user.slug.as_deref(), Some("users"));
        assert_eq!(user.fields["emailVerified"], "verified");
    }

    #[test]
    fn test_field_transforms_lookup() {
        let transforms = FieldTransforms::new()
            .on_input("user", "email", |v| json!(v.as_str().unwrap_or_default().to_lowercase()))
            .on_output("user", "email", |v| v);
        let t = transforms.get("user", "email").unwrap();
        let f = t.input.as_ref().unwrap();
        assert_eq!(f(json!("A@B.COM")), json!("a@b.com"));
        assert!(t.output.is_some());
        assert!(transforms.get("user", "name").is_none());
        assert_eq!(format!("{transforms:?}"), "FieldTransforms { fields: [\"user.email\"] }");
    }

    #[test]
    fn test_id_type_display() {
        assert_eq!(IdType::Number.to_string(), "number");
        assert_eq!(IdType::Text.to_string(), "text");
    }
}
