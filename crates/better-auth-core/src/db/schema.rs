// Schema definition types — maps to packages/core/src/db/type.ts
// Defines the schema DSL used to describe auth tables and plugin-added fields.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Field types supported by the schema system.
/// Maps to `FieldType` in TypeScript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "string[]")]
    StringArray,
    #[serde(rename = "number[]")]
    NumberArray,
}

impl FieldType {
    pub fn is_array(&self) -> bool {
        matches!(self, Self::StringArray | Self::NumberArray)
    }
}

/// A single field definition within a table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    /// The field's data type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the field is required (non-nullable).
    #[serde(default)]
    pub required: bool,
    /// Whether the field must be unique across records.
    #[serde(default)]
    pub unique: bool,
    /// Default value for the field (as JSON).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    /// Reference to another table (foreign key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<FieldReference>,
    /// Custom physical field name override (maps to TS `fieldName`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
}

impl SchemaField {
    /// Create a field of the given type with no constraints.
    pub fn of(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            unique: false,
            default_value: None,
            references: None,
            field_name: None,
        }
    }

    /// Create a required string field.
    pub fn required_string() -> Self {
        Self::of(FieldType::String).required()
    }

    /// Create an optional string field.
    pub fn optional_string() -> Self {
        Self::of(FieldType::String)
    }

    /// Create a boolean field with a default value.
    pub fn boolean(default: bool) -> Self {
        Self::of(FieldType::Boolean).with_default(serde_json::Value::Bool(default))
    }

    /// Create a required date field.
    pub fn required_date() -> Self {
        Self::of(FieldType::Date).required()
    }

    /// Create an optional date field.
    pub fn optional_date() -> Self {
        Self::of(FieldType::Date)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_reference(mut self, model: &str, field: &str) -> Self {
        self.references = Some(FieldReference {
            model: model.to_string(),
            field: field.to_string(),
            on_delete: None,
        });
        self
    }

    pub fn with_field_name(mut self, name: &str) -> Self {
        self.field_name = Some(name.to_string());
        self
    }
}

/// Foreign key reference configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    /// Logical model name (e.g. "user").
    pub model: String,
    /// Field name in the referenced table (usually "id").
    pub field: String,
    /// ON DELETE action (cascade, set null, etc.).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
}

/// A complete table definition within the auth schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTable {
    /// The logical model name.
    pub name: String,
    /// Optional physical name override (collection or table name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Map of field name → field definition.
    pub fields: HashMap<String, SchemaField>,
    /// Ordering hint for deterministic iteration.
    #[serde(default)]
    pub order: Option<i32>,
}

impl AuthTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            model_name: None,
            fields: HashMap::new(),
            order: None,
        }
    }

    pub fn field(mut self, name: &str, schema_field: SchemaField) -> Self {
        self.fields.insert(name.to_string(), schema_field);
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }
}

/// The complete auth database schema — a collection of tables keyed by model name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthSchema {
    pub tables: HashMap<String, AuthTable>,
}

impl AuthSchema {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Add a table. A table with an already-registered name merges its
    /// fields into the existing one; existing fields win.
    pub fn table(mut self, table: AuthTable) -> Self {
        match self.tables.get_mut(&table.name) {
            Some(existing) => {
                for (name, field) in table.fields {
                    existing.fields.entry(name).or_insert(field);
                }
            }
            None => {
                self.tables.insert(table.name.clone(), table);
            }
        }
        self
    }

    /// Build the default core auth schema (user, session, account, verification).
    pub fn core_schema() -> Self {
        let user = AuthTable::new("user")
            .with_order(1)
            .field("name", SchemaField::required_string())
            .field("email", SchemaField::required_string().with_unique())
            .field("emailVerified", SchemaField::boolean(false).required())
            .field("image", SchemaField::optional_string())
            .field("createdAt", SchemaField::required_date())
            .field("updatedAt", SchemaField::required_date());

        let session = AuthTable::new("session")
            .with_order(2)
            .field("token", SchemaField::required_string().with_unique())
            .field("expiresAt", SchemaField::required_date())
            .field("ipAddress", SchemaField::optional_string())
            .field("userAgent", SchemaField::optional_string())
            .field(
                "userId",
                SchemaField::required_string().with_reference("user", "id"),
            )
            .field("createdAt", SchemaField::required_date())
            .field("updatedAt", SchemaField::required_date());

        let account = AuthTable::new("account")
            .with_order(3)
            .field("accountId", SchemaField::required_string())
            .field("providerId", SchemaField::required_string())
            .field(
                "userId",
                SchemaField::required_string().with_reference("user", "id"),
            )
            .field("accessToken", SchemaField::optional_string())
            .field("refreshToken", SchemaField::optional_string())
            .field("idToken", SchemaField::optional_string())
            .field("accessTokenExpiresAt", SchemaField::optional_date())
            .field("refreshTokenExpiresAt", SchemaField::optional_date())
            .field("scope", SchemaField::optional_string())
            .field("password", SchemaField::optional_string())
            .field("createdAt", SchemaField::required_date())
            .field("updatedAt", SchemaField::required_date());

        let verification = AuthTable::new("verification")
            .with_order(4)
            .field("identifier", SchemaField::required_string())
            .field("value", SchemaField::required_string())
            .field("expiresAt", SchemaField::required_date())
            .field("createdAt", SchemaField::optional_date())
            .field("updatedAt", SchemaField::optional_date());

        Self::new()
            .table(user)
            .table(session)
            .table(account)
            .table(verification)
    }
}
