// In-memory document store — HashMap-based `DocumentStore` for tests and
// local development.
//
// Documents live in `HashMap<slug, Vec<Value>>` behind a `tokio::sync::RwLock`.
// Evaluates the full filter tree, paginates by page/limit, populates
// relationships at depth >= 1 and resolves declared join fields.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use better_auth_core::error::HttpStatus;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;

use crate::config::IdType;
use crate::registry::CollectionSchemaMap;
use crate::schema_gen;
use crate::store::{
    CollectionConfig, DocumentStore, FindArgs, JoinArgs, PaginatedDocs, StoreError, StoreResult,
    Target, Written,
};
use crate::where_clause::{FieldFilter, FilterOperator, StorageFilter};

/// Join page size when the request carries no limit.
const DEFAULT_JOIN_LIMIT: i64 = 10;

#[derive(Debug, Default, Clone)]
struct State {
    docs: HashMap<String, Vec<Value>>,
    next_id: HashMap<String, i64>,
}

/// In-memory document store.
///
/// Cloning shares the same data. Data is lost when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct MemoryDocumentStore {
    collections: Arc<Vec<CollectionConfig>>,
    id_type: IdType,
    state: Arc<RwLock<State>>,
}

impl MemoryDocumentStore {
    pub fn new(collections: Vec<CollectionConfig>, id_type: IdType) -> Self {
        Self {
            collections: Arc::new(collections),
            id_type,
            state: Arc::new(RwLock::new(State::default())),
        }
    }

    /// A store whose collections are generated from the registry.
    pub fn from_registry(registry: &CollectionSchemaMap, id_type: IdType) -> Self {
        Self::new(schema_gen::collection_configs(registry), id_type)
    }

    /// Raw documents of one collection, as stored.
    pub async fn documents(&self, slug: &str) -> Vec<Value> {
        self.state
            .read()
            .await
            .docs
            .get(slug)
            .cloned()
            .unwrap_or_default()
    }

    fn config(&self, slug: &str) -> StoreResult<&CollectionConfig> {
        self.collections
            .iter()
            .find(|c| c.slug == slug)
            .ok_or_else(|| StoreError::new(HttpStatus::BadRequest, format!("collection '{slug}' not found")))
    }

    fn next_id(&self, state: &mut State, slug: &str) -> Value {
        match self.id_type {
            IdType::Number => {
                let counter = state.next_id.entry(slug.to_string()).or_insert(0);
                *counter += 1;
                json!(*counter)
            }
            IdType::Text => json!(nanoid::nanoid!()),
        }
    }

    /// Populate, join and project a stored document for output.
    fn render(
        &self,
        state: &State,
        config: &CollectionConfig,
        doc: &Value,
        select: Option<&[String]>,
        joins: &JoinArgs,
        depth: u32,
    ) -> Value {
        let mut out = doc.clone();
        if depth > 0 {
            populate(state, config, &mut out);
        }
        for (name, query) in joins {
            let Some(join) = config.join_named(name) else {
                continue;
            };
            let limit = query.limit.unwrap_or(DEFAULT_JOIN_LIMIT).max(1) as usize;
            let id = doc.get("id").cloned().unwrap_or(Value::Null);
            let related: Vec<Value> = state
                .docs
                .get(&join.collection)
                .map(|docs| {
                    docs.iter()
                        .filter(|d| d.get(&join.on).is_some_and(|v| references(v, &id)))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            let has_next_page = related.len() > limit;
            let page: Vec<Value> = related.into_iter().take(limit).collect();
            if let Some(obj) = out.as_object_mut() {
                obj.insert(
                    name.clone(),
                    json!({ "docs": page, "hasNextPage": has_next_page }),
                );
            }
        }
        project(out, select)
    }
}

fn now() -> Value {
    json!(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}

/// Ids compare by their string form so `5` and `"5"` name the same document.
fn same_id(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::String(y)) | (Value::String(y), Value::Number(x)) => x.to_string() == *y,
        _ => a == b,
    }
}

/// Whether a relationship value (id, populated doc or array) points at `id`.
fn references(value: &Value, id: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().any(|v| references(v, id)),
        Value::Object(obj) => obj.get("id").is_some_and(|v| same_id(v, id)),
        other => same_id(other, id),
    }
}

fn populate(state: &State, config: &CollectionConfig, doc: &mut Value) {
    let Some(obj) = doc.as_object_mut() else {
        return;
    };
    for field in &config.fields {
        let Some(target) = field.relation_to.as_deref() else {
            continue;
        };
        let Some(value) = obj.get_mut(&field.name) else {
            continue;
        };
        let Some(related) = state.docs.get(target) else {
            continue;
        };
        let lookup = |id: &Value| -> Value {
            related
                .iter()
                .find(|d| d.get("id").is_some_and(|v| same_id(v, id)))
                .cloned()
                .unwrap_or_else(|| id.clone())
        };
        *value = match &*value {
            Value::Array(ids) => Value::Array(ids.iter().map(lookup).collect()),
            Value::Null => Value::Null,
            id => lookup(id),
        };
    }
}

fn project(doc: Value, select: Option<&[String]>) -> Value {
    match (doc, select) {
        (Value::Object(obj), Some(fields)) if !fields.is_empty() => {
            let kept: Map<String, Value> = obj
                .into_iter()
                .filter(|(k, _)| k == "id" || fields.iter().any(|f| f == k))
                .collect();
            Value::Object(kept)
        }
        (doc, _) => doc,
    }
}

/// Evaluate a filter tree against a stored document.
pub fn matches(doc: &Value, filter: &StorageFilter) -> bool {
    match filter {
        StorageFilter::All => true,
        StorageFilter::Field(f) => match_field(doc.get(&f.field).unwrap_or(&Value::Null), f),
        StorageFilter::Group { and, or } => {
            and.iter().all(|f| matches(doc, f)) && (or.is_empty() || or.iter().any(|f| matches(doc, f)))
        }
    }
}

fn match_field(field_val: &Value, filter: &FieldFilter) -> bool {
    let target = &filter.value;
    match filter.operator {
        FilterOperator::Equals => equals(field_val, target),
        FilterOperator::NotEquals => !equals(field_val, target),
        FilterOperator::GreaterThan => compare_json(field_val, target) == Some(Ordering::Greater),
        FilterOperator::GreaterThanEqual => {
            matches!(compare_json(field_val, target), Some(Ordering::Greater | Ordering::Equal))
        }
        FilterOperator::LessThan => compare_json(field_val, target) == Some(Ordering::Less),
        FilterOperator::LessThanEqual => {
            matches!(compare_json(field_val, target), Some(Ordering::Less | Ordering::Equal))
        }
        FilterOperator::In => match target {
            Value::Array(options) => options.iter().any(|o| equals(field_val, o)),
            _ => false,
        },
        FilterOperator::Contains => match (field_val, target) {
            (Value::String(s), Value::String(t)) => s.to_lowercase().contains(&t.to_lowercase()),
            (_, Value::Array(options)) => options.iter().any(|o| equals(field_val, o)),
            (Value::Array(items), t) => items.iter().any(|i| equals(i, t)),
            _ => false,
        },
        FilterOperator::Like => match (field_val, target) {
            (Value::String(s), Value::String(p)) => like(&s.to_lowercase(), &p.to_lowercase()),
            _ => false,
        },
    }
}

/// Equality where has-many arrays match any of their elements.
fn equals(field_val: &Value, target: &Value) -> bool {
    match field_val {
        Value::Array(items) if !target.is_array() => items.iter().any(|i| same_id(i, target)),
        _ => same_id(field_val, target),
    }
}

fn compare_json(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

enum LikeToken {
    Literal(char),
    AnyRun,
    AnyChar,
}

fn like_tokens(pattern: &str) -> Vec<LikeToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '\\' => LikeToken::Literal(chars.next().unwrap_or('\\')),
            '%' => LikeToken::AnyRun,
            '_' => LikeToken::AnyChar,
            c => LikeToken::Literal(c),
        });
    }
    tokens
}

/// SQL `LIKE`: `%` matches any run, `_` one character, `\` escapes.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    // reachable[i]: the tokens seen so far can consume exactly text[..i]
    let mut reachable = vec![false; text.len() + 1];
    reachable[0] = true;
    for token in like_tokens(pattern) {
        let mut next = vec![false; text.len() + 1];
        match token {
            LikeToken::AnyRun => {
                let mut seen = false;
                for (i, slot) in next.iter_mut().enumerate() {
                    seen |= reachable[i];
                    *slot = seen;
                }
            }
            LikeToken::AnyChar => {
                for i in 0..text.len() {
                    next[i + 1] = reachable[i];
                }
            }
            LikeToken::Literal(c) => {
                for i in 0..text.len() {
                    next[i + 1] = reachable[i] && text[i] == c;
                }
            }
        }
        reachable = next;
    }
    reachable[text.len()]
}

fn sort_docs(docs: &mut [Value], sort: Option<&str>) {
    let Some(sort) = sort else {
        return;
    };
    let (field, descending) = match sort.strip_prefix('-') {
        Some(field) => (field, true),
        None => (sort, false),
    };
    docs.sort_by(|a, b| {
        let ordering = match (a.get(field), b.get(field)) {
            (Some(x), Some(y)) => compare_json(x, y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn merge(doc: &mut Value, data: &Value) {
    if let (Some(target), Some(fields)) = (doc.as_object_mut(), data.as_object()) {
        for (k, v) in fields {
            if k != "id" {
                target.insert(k.clone(), v.clone());
            }
        }
    }
}

fn apply_defaults(config: &CollectionConfig, doc: &mut Value) {
    let Some(obj) = doc.as_object_mut() else {
        return;
    };
    for field in &config.fields {
        if let Some(default) = &field.default_value {
            obj.entry(field.name.clone()).or_insert_with(|| default.clone());
        }
    }
}

fn touch(config: &CollectionConfig, doc: &mut Value, created: bool) {
    let Some(obj) = doc.as_object_mut() else {
        return;
    };
    let stamp = now();
    if created && config.field_named("createdAt").is_some() && !obj.contains_key("createdAt") {
        obj.insert("createdAt".into(), stamp.clone());
    }
    if config.field_named("updatedAt").is_some() && (!created || !obj.contains_key("updatedAt")) {
        obj.insert("updatedAt".into(), stamp);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn collection(&self, slug: &str) -> Option<CollectionConfig> {
        self.config(slug).ok().cloned()
    }

    fn collections(&self) -> Vec<CollectionConfig> {
        self.collections.as_ref().clone()
    }

    async fn create(
        &self,
        collection: &str,
        data: Value,
        select: Option<&[String]>,
        depth: u32,
    ) -> StoreResult<Value> {
        let config = self.config(collection)?;
        let Value::Object(_) = data else {
            return Err(StoreError::new(HttpStatus::BadRequest, "document must be an object"));
        };
        let mut doc = data;
        let mut state = self.state.write().await;
        if doc.get("id").map_or(true, Value::is_null) {
            let id = self.next_id(&mut state, collection);
            if let Some(obj) = doc.as_object_mut() {
                obj.insert("id".into(), id);
            }
        }
        apply_defaults(config, &mut doc);
        touch(config, &mut doc, true);
        state
            .docs
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(self.render(&state, config, &doc, select, &JoinArgs::new(), depth))
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &Value,
        select: Option<&[String]>,
        joins: &JoinArgs,
        depth: u32,
    ) -> StoreResult<Value> {
        let config = self.config(collection)?;
        let state = self.state.read().await;
        let doc = state
            .docs
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.get("id").is_some_and(|v| same_id(v, id))))
            .ok_or_else(|| StoreError::not_found(format!("{collection} {id} not found")))?;
        Ok(self.render(&state, config, doc, select, joins, depth))
    }

    async fn find(&self, collection: &str, args: FindArgs) -> StoreResult<PaginatedDocs> {
        let config = self.config(collection)?;
        let state = self.state.read().await;
        let mut docs: Vec<Value> = state
            .docs
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches(d, &args.filter)).cloned().collect())
            .unwrap_or_default();
        sort_docs(&mut docs, args.sort.as_deref());

        let total_docs = docs.len() as i64;
        let limit = args.limit.max(1);
        let skip = (args.page.max(1) - 1).saturating_mul(limit);
        let docs = docs
            .iter()
            .skip(skip as usize)
            .take(limit as usize)
            .map(|d| self.render(&state, config, d, args.select.as_deref(), &args.joins, args.depth))
            .collect();
        Ok(PaginatedDocs { docs, total_docs })
    }

    async fn update(
        &self,
        collection: &str,
        target: Target,
        data: Value,
        depth: u32,
    ) -> StoreResult<Written> {
        let config = self.config(collection)?;
        let mut state = self.state.write().await;
        let docs = state.docs.entry(collection.to_string()).or_default();
        let mut updated = Vec::new();
        match &target {
            Target::Id(id) => {
                let doc = docs
                    .iter_mut()
                    .find(|d| d.get("id").is_some_and(|v| same_id(v, id)))
                    .ok_or_else(|| StoreError::not_found(format!("{collection} {id} not found")))?;
                merge(doc, &data);
                touch(config, doc, false);
                updated.push(doc.clone());
            }
            Target::Where(filter) => {
                for doc in docs.iter_mut().filter(|d| matches(d, filter)) {
                    merge(doc, &data);
                    touch(config, doc, false);
                    updated.push(doc.clone());
                }
            }
        }
        let mut rendered: Vec<Value> = updated
            .iter()
            .map(|d| self.render(&state, config, d, None, &JoinArgs::new(), depth))
            .collect();
        Ok(match target {
            Target::Id(_) => Written::Doc(rendered.remove(0)),
            Target::Where(_) => Written::Docs(rendered),
        })
    }

    async fn delete(&self, collection: &str, target: Target, depth: u32) -> StoreResult<Written> {
        let config = self.config(collection)?;
        let mut state = self.state.write().await;
        let docs = state.docs.entry(collection.to_string()).or_default();
        let removed: Vec<Value> = match &target {
            Target::Id(id) => {
                let pos = docs
                    .iter()
                    .position(|d| d.get("id").is_some_and(|v| same_id(v, id)))
                    .ok_or_else(|| StoreError::not_found(format!("{collection} {id} not found")))?;
                vec![docs.remove(pos)]
            }
            Target::Where(filter) => {
                let (removed, kept): (Vec<Value>, Vec<Value>) =
                    docs.drain(..).partition(|d| matches(d, filter));
                *docs = kept;
                removed
            }
        };
        let mut rendered: Vec<Value> = removed
            .iter()
            .map(|d| self.render(&state, config, d, None, &JoinArgs::new(), depth))
            .collect();
        Ok(match target {
            Target::Id(_) => Written::Doc(rendered.remove(0)),
            Target::Where(_) => Written::Docs(rendered),
        })
    }

    async fn count(&self, collection: &str, filter: &StorageFilter) -> StoreResult<i64> {
        self.config(collection)?;
        let state = self.state.read().await;
        Ok(state
            .docs
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches(d, filter)).count() as i64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CollectionField, JoinField, JoinQuery};

    fn store(id_type: IdType) -> MemoryDocumentStore {
        MemoryDocumentStore::new(
            vec![
                CollectionConfig::new("users")
                    .field(CollectionField::new("email"))
                    .field(CollectionField::new("role").with_default(json!("user")))
                    .field(CollectionField::new("createdAt"))
                    .field(CollectionField::new("updatedAt"))
                    .join(JoinField {
                        name: "sessions".into(),
                        collection: "sessions".into(),
                        on: "user".into(),
                    }),
                CollectionConfig::new("sessions")
                    .field(CollectionField::new("token"))
                    .field(CollectionField::new("user").relation("users")),
            ],
            id_type,
        )
    }

    fn eq(field: &str, value: Value) -> StorageFilter {
        StorageFilter::field(field, FilterOperator::Equals, value)
    }

    #[tokio::test]
    async fn test_create_assigns_numeric_ids_and_timestamps() {
        let store = store(IdType::Number);
        let a = store.create("users", json!({"email": "a@x.io"}), None, 0).await.unwrap();
        let b = store.create("users", json!({"email": "b@x.io"}), None, 0).await.unwrap();
        assert_eq!(a["id"], json!(1));
        assert_eq!(b["id"], json!(2));
        assert!(a["createdAt"].is_string());
        assert_eq!(a["role"], "user");
        assert!(a["updatedAt"].is_string());

        let s = store.create("sessions", json!({"token": "t"}), None, 0).await.unwrap();
        assert_eq!(s["id"], json!(1));
        assert!(s.get("createdAt").is_none());
    }

    #[tokio::test]
    async fn test_create_assigns_text_ids() {
        let store = store(IdType::Text);
        let a = store.create("users", json!({"email": "a@x.io"}), None, 0).await.unwrap();
        assert_eq!(a["id"].as_str().unwrap().len(), 21);
    }

    #[tokio::test]
    async fn test_unknown_collection() {
        let store = store(IdType::Number);
        let err = store.count("posts", &StorageFilter::All).await.unwrap_err();
        assert_eq!(err.status, HttpStatus::BadRequest);
        assert!(store.collection("posts").is_none());
    }

    #[tokio::test]
    async fn test_find_by_id_and_not_found() {
        let store = store(IdType::Number);
        store.create("users", json!({"email": "a@x.io"}), None, 0).await.unwrap();
        let found = store.find_by_id("users", &json!("1"), None, &JoinArgs::new(), 0).await.unwrap();
        assert_eq!(found["email"], "a@x.io");
        let err = store.find_by_id("users", &json!(9), None, &JoinArgs::new(), 0).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_find_filters_sorts_and_paginates() {
        let store = store(IdType::Number);
        for i in 1..=5 {
            store
                .create("users", json!({"email": format!("user{i}@x.io")}), None, 0)
                .await
                .unwrap();
        }
        let page = store
            .find(
                "users",
                FindArgs {
                    filter: StorageFilter::field("email", FilterOperator::Like, json!("user%@x.io")),
                    sort: Some("-email".into()),
                    limit: 2,
                    page: 2,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total_docs, 5);
        let emails: Vec<_> = page.docs.iter().map(|d| d["email"].clone()).collect();
        assert_eq!(emails, vec![json!("user3@x.io"), json!("user2@x.io")]);
    }

    #[test]
    fn test_filter_operators() {
        let doc = json!({"id": 3, "email": "Admin@Corp.io", "age": 30, "tags": ["a", "b"]});
        assert!(matches(&doc, &eq("id", json!("3"))));
        assert!(matches(&doc, &StorageFilter::field("email", FilterOperator::Contains, json!("corp"))));
        assert!(matches(&doc, &StorageFilter::field("email", FilterOperator::Like, json!("admin%"))));
        assert!(matches(&doc, &StorageFilter::field("email", FilterOperator::Like, json!("%.io"))));
        assert!(!matches(&doc, &StorageFilter::field("email", FilterOperator::Like, json!("%.com"))));
        assert!(matches(&doc, &StorageFilter::field("age", FilterOperator::GreaterThanEqual, json!(30))));
        assert!(!matches(&doc, &StorageFilter::field("age", FilterOperator::LessThan, json!(30))));
        assert!(matches(&doc, &StorageFilter::field("id", FilterOperator::In, json!([1, 3]))));
        assert!(matches(&doc, &StorageFilter::field("id", FilterOperator::Contains, json!([3]))));
        assert!(matches(&doc, &eq("tags", json!("b"))));
        assert!(matches(&doc, &StorageFilter::field("missing", FilterOperator::NotEquals, json!("x"))));

        let group = StorageFilter::Group {
            and: vec![eq("age", json!(30))],
            or: vec![eq("id", json!(1)), eq("id", json!(3))],
        };
        assert!(matches(&doc, &group));
        let miss = StorageFilter::Group {
            and: vec![eq("age", json!(30))],
            or: vec![eq("id", json!(1))],
        };
        assert!(!matches(&doc, &miss));
    }

    #[test]
    fn test_like_patterns() {
        assert!(like("hello", "hello"));
        assert!(like("hello", "h%o"));
        assert!(like("hello", "%ll%"));
        assert!(!like("hello", "%x%"));
        assert!(!like("ab", "ab%ab"));
        assert!(like("hello", "h_llo"));
        assert!(!like("hllo", "h_llo"));
        assert!(like("100%off", "100\\%%"));
        assert!(!like("100xyz", "100\\%%"));
        assert!(like("a_b", "a\\_b"));
        assert!(!like("axb", "a\\_b"));
        assert!(like("c:\\dir", "c:\\\\%"));
    }

    #[tokio::test]
    async fn test_update_and_delete_by_id_and_where() {
        let store = store(IdType::Number);
        store.create("sessions", json!({"token": "a", "user": 1}), None, 0).await.unwrap();
        store.create("sessions", json!({"token": "b", "user": 1}), None, 0).await.unwrap();

        let written = store
            .update("sessions", Target::Id(json!(1)), json!({"token": "a2"}), 0)
            .await
            .unwrap();
        assert_eq!(written, Written::Doc(json!({"id": 1, "token": "a2", "user": 1})));

        let err = store
            .update("sessions", Target::Id(json!(99)), json!({}), 0)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let written = store
            .update("sessions", Target::Where(eq("user", json!(1))), json!({"token": "z"}), 0)
            .await
            .unwrap();
        assert_eq!(written.into_docs().len(), 2);

        let deleted = store
            .delete("sessions", Target::Where(eq("token", json!("z"))), 0)
            .await
            .unwrap();
        assert_eq!(deleted.into_docs().len(), 2);
        assert!(store.documents("sessions").await.is_empty());
        assert!(store
            .delete("sessions", Target::Id(json!(1)), 0)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_depth_population_and_joins() {
        let store = store(IdType::Number);
        store.create("users", json!({"email": "a@x.io"}), None, 0).await.unwrap();
        for token in ["s1", "s2", "s3"] {
            store.create("sessions", json!({"token": token, "user": 1}), None, 0).await.unwrap();
        }

        let shallow = store.find_by_id("sessions", &json!(1), None, &JoinArgs::new(), 0).await.unwrap();
        assert_eq!(shallow["user"], json!(1));
        let deep = store.find_by_id("sessions", &json!(1), None, &JoinArgs::new(), 1).await.unwrap();
        assert_eq!(deep["user"]["email"], "a@x.io");

        let mut joins = JoinArgs::new();
        joins.insert("sessions".into(), JoinQuery { limit: Some(2) });
        joins.insert("accounts".into(), JoinQuery::default());
        let user = store.find_by_id("users", &json!(1), None, &joins, 0).await.unwrap();
        assert_eq!(user["sessions"]["docs"].as_array().unwrap().len(), 2);
        assert_eq!(user["sessions"]["hasNextPage"], json!(true));
        assert!(user.get("accounts").is_none());
    }

    #[tokio::test]
    async fn test_select_keeps_id() {
        let store = store(IdType::Number);
        let select = vec!["email".to_string()];
        let doc = store
            .create("users", json!({"email": "a@x.io"}), Some(&select), 0)
            .await
            .unwrap();
        assert_eq!(doc, json!({"id": 1, "email": "a@x.io"}));
        let stored = &store.documents("users").await[0];
        assert_eq!(stored["role"], "user");
    }
}
