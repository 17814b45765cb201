// PayloadAdapter — implementation of the core Adapter trait on top of a
// Payload-style document store.
//
// Every operation follows the same flow:
//   resolve collection → validate it exists → compile filter / transform
//   payload → execute against the store → transform the result
//
// Unknown collections are configuration errors and always returned.
// A 404 from the store is an empty result. Other store failures are logged
// and then handled per `ErrorPolicy`.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{json, Value};

use better_auth_core::db::adapter::{
    Adapter, AdapterResult, FindManyQuery, JoinOption, SchemaOptions, SchemaStatus, SortBy,
    SortDirection, TransactionAdapter, WhereClause,
};
use better_auth_core::db::schema::AuthSchema;
use better_auth_core::error::BetterAuthError;

use crate::config::{ErrorPolicy, PayloadAdapterConfig};
use crate::registry::{CollectionSchemaMap, SyncReport};
use crate::schema_gen;
use crate::store::{
    CollectionConfig, DocumentStore, FindArgs, JoinArgs, JoinQuery, StoreError, StoreSource,
    Target,
};
use crate::transform::Transformer;
use crate::where_clause::{self, StorageFilter};

/// Joins honored for one call: `(requested model, join field name)`.
type JoinPlan = Vec<(String, String)>;

/// better-auth adapter for Payload-style document stores.
///
/// Cheap to clone; the registry and config are shared.
///
/// # Usage
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use better_auth_core::db::schema::AuthSchema;
/// use better_auth_payload::{MemoryDocumentStore, PayloadAdapter, PayloadAdapterConfig};
///
/// let store = Arc::new(MemoryDocumentStore::new(collections, IdType::Number));
/// let adapter = PayloadAdapter::from_store(
///     store,
///     PayloadAdapterConfig::default().with_env(),
///     &AuthSchema::core_schema(),
/// )?;
/// ```
#[derive(Debug, Clone)]
pub struct PayloadAdapter {
    source: StoreSource,
    config: Arc<PayloadAdapterConfig>,
    registry: Arc<CollectionSchemaMap>,
    sync_report: Arc<SyncReport>,
}

impl PayloadAdapter {
    /// Create an adapter around a registry that is already final.
    pub fn new(
        source: impl Into<StoreSource>,
        config: PayloadAdapterConfig,
        registry: CollectionSchemaMap,
    ) -> Self {
        Self {
            source: source.into(),
            config: Arc::new(config),
            registry: Arc::new(registry),
            sync_report: Arc::new(SyncReport::default()),
        }
    }

    /// Build the registry from the auth schema and config overrides, then
    /// synchronize it against the collections the store reports.
    ///
    /// Fails only on structural conflicts (two models on one slug).
    /// Synchronization issues are logged and kept in [`sync_report`](Self::sync_report).
    pub fn from_store(
        source: impl Into<StoreSource>,
        config: PayloadAdapterConfig,
        schema: &AuthSchema,
    ) -> Result<Self, BetterAuthError> {
        let source = source.into();
        let registry = CollectionSchemaMap::build_default(schema, &config.models)?;
        let (registry, report) = registry.synchronize(&source.resolve().collections());

        if config.debug_logs {
            tracing::debug!(
                "[Payload Adapter] synchronized {} models ({} renamed collections, {} issues)",
                registry.len(),
                report.renamed.len(),
                report.issues.len()
            );
        }

        Ok(Self {
            source,
            config: Arc::new(config),
            registry: Arc::new(registry),
            sync_report: Arc::new(report),
        })
    }

    pub fn registry(&self) -> &CollectionSchemaMap {
        &self.registry
    }

    pub fn config(&self) -> &PayloadAdapterConfig {
        &self.config
    }

    pub fn sync_report(&self) -> &SyncReport {
        &self.sync_report
    }

    /// Run `f` with this adapter. Writes are not isolated; the store owns
    /// transactional guarantees.
    pub async fn transaction<F, Fut, T>(&self, f: F) -> AdapterResult<T>
    where
        F: FnOnce(PayloadAdapter) -> Fut,
        Fut: Future<Output = AdapterResult<T>>,
    {
        if self.config.debug_logs {
            tracing::debug!("[Payload Adapter] TRANSACTION (passthrough)");
        }
        f(self.clone()).await
    }

    fn transformer(&self) -> Transformer<'_> {
        Transformer::new(
            &self.registry,
            self.config.id_type,
            &self.config.field_transforms,
        )
    }

    fn log_op(&self, op: &str, model: &str, slug: &str) {
        if self.config.debug_logs {
            tracing::debug!("[Payload Adapter] {} on '{}' (collection: '{}')", op, model, slug);
        }
    }

    fn resolve_collection(
        &self,
        store: &dyn DocumentStore,
        model: &str,
    ) -> AdapterResult<CollectionConfig> {
        let slug = self.registry.resolve_collection_slug(model);
        store.collection(slug).ok_or_else(|| {
            tracing::error!("[Payload Adapter] collection '{}' for model '{}' does not exist", slug, model);
            BetterAuthError::Config(format!(
                "collection '{slug}' for model '{model}' does not exist in the document store"
            ))
        })
    }

    fn compile(&self, model: &str, where_clauses: &[WhereClause]) -> StorageFilter {
        where_clause::compile(&self.registry, model, where_clauses, self.config.id_type)
    }

    /// Turn a store failure into the operation's result.
    fn fail<T>(
        &self,
        op: &str,
        slug: &str,
        context: &Value,
        started: Instant,
        err: StoreError,
        empty: T,
    ) -> AdapterResult<T> {
        if err.is_not_found() {
            if self.config.debug_logs {
                tracing::debug!("[Payload Adapter] {} on '{}' found nothing: {}", op, slug, err);
            }
            return Ok(empty);
        }

        tracing::error!(
            collection = %slug,
            context = %context,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "[Payload Adapter] {} failed: {}",
            op,
            err
        );
        match self.config.error_policy {
            ErrorPolicy::Absorb => Ok(empty),
            ErrorPolicy::Propagate => Err(BetterAuthError::Database(format!(
                "{op} on collection '{slug}' failed: {err}"
            ))),
        }
    }

    /// Storage names for a logical select list. `id` and requested join
    /// fields are always kept.
    fn select_fields(
        &self,
        model: &str,
        select: Option<&[String]>,
        plan: &JoinPlan,
    ) -> Option<Vec<String>> {
        let fields = select.filter(|s| !s.is_empty())?;
        let mut names: Vec<String> = fields
            .iter()
            .map(|f| self.registry.resolve_field_name(model, f).to_string())
            .collect();
        names.extend(plan.iter().map(|(_, name)| name.clone()));
        if !names.iter().any(|n| n == "id") {
            names.push("id".to_string());
        }
        Some(names)
    }

    fn sort_field(&self, model: &str, sort: &SortBy) -> String {
        let name = self.registry.resolve_field_name(model, &sort.field);
        match sort.direction {
            SortDirection::Asc => name.to_string(),
            SortDirection::Desc => format!("-{name}"),
        }
    }

    /// Keep only joins the collection declares; pass through the limit only.
    fn plan_joins(
        &self,
        collection: &CollectionConfig,
        join: Option<&JoinOption>,
    ) -> (JoinArgs, JoinPlan) {
        let mut args = JoinArgs::new();
        let mut plan = JoinPlan::new();
        for (related, options) in join.into_iter().flatten() {
            if !options.is_enabled() {
                continue;
            }
            let name = self.registry.resolve_collection_slug(related);
            if !collection.has_join(name) {
                tracing::warn!(
                    "[Payload Adapter] collection '{}' declares no join '{}', skipping",
                    collection.slug,
                    name
                );
                continue;
            }
            args.insert(name.to_string(), JoinQuery { limit: options.limit() });
            plan.push((related.clone(), name.to_string()));
        }
        (args, plan)
    }

    /// Transform a stored document, moving joined pages under the related
    /// model names the caller asked for.
    fn shape(&self, model: &str, mut doc: Value, plan: &JoinPlan) -> Value {
        let mut joined = Vec::with_capacity(plan.len());
        if let Some(obj) = doc.as_object_mut() {
            for (related, name) in plan {
                if let Some(value) = obj.remove(name) {
                    joined.push((related, value));
                }
            }
        }

        let transformer = self.transformer();
        let mut out = transformer.output(model, doc);
        if let Some(obj) = out.as_object_mut() {
            for (related, value) in joined {
                let related_key = self.registry.resolve_model_key(related);
                let docs = match value {
                    Value::Object(mut page) => page.remove("docs").unwrap_or_default(),
                    other => other,
                };
                let docs: Vec<Value> = match docs {
                    Value::Array(items) => items
                        .into_iter()
                        .map(|d| transformer.output(related_key, d))
                        .collect(),
                    _ => Vec::new(),
                };
                obj.insert(related.clone(), Value::Array(docs));
            }
        }
        out
    }

    fn target(filter: &StorageFilter) -> Target {
        match where_clause::single_id(filter) {
            Some(id) => Target::Id(id),
            None => Target::Where(filter.clone()),
        }
    }
}

#[async_trait]
impl Adapter for PayloadAdapter {
    async fn create(
        &self,
        model: &str,
        data: Value,
        select: Option<&[String]>,
    ) -> AdapterResult<Option<Value>> {
        let started = Instant::now();
        let store = self.source.resolve();
        let collection = self.resolve_collection(store.as_ref(), model)?;
        let model_key = self.registry.resolve_model_key(model);
        self.log_op("CREATE", model, &collection.slug);

        let doc = self.transformer().input(model_key, &data);
        let select = self.select_fields(model_key, select, &JoinPlan::new());
        match store
            .create(&collection.slug, doc.clone(), select.as_deref(), self.config.write_depth)
            .await
        {
            Ok(created) => Ok(Some(self.transformer().output(model_key, created))),
            Err(err) => self.fail("CREATE", &collection.slug, &doc, started, err, None),
        }
    }

    async fn find_one(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        select: Option<&[String]>,
        join: Option<&JoinOption>,
    ) -> AdapterResult<Option<Value>> {
        let started = Instant::now();
        let store = self.source.resolve();
        let collection = self.resolve_collection(store.as_ref(), model)?;
        let model_key = self.registry.resolve_model_key(model);
        self.log_op("FIND_ONE", model, &collection.slug);

        let filter = self.compile(model_key, where_clauses);
        let (joins, plan) = self.plan_joins(&collection, join);
        let select = self.select_fields(model_key, select, &plan);
        let depth = self.config.read_depth;

        let found = match where_clause::single_id(&filter) {
            Some(id) => store
                .find_by_id(&collection.slug, &id, select.as_deref(), &joins, depth)
                .await
                .map(Some),
            None => store
                .find(
                    &collection.slug,
                    FindArgs {
                        filter: filter.clone(),
                        select,
                        sort: None,
                        joins,
                        limit: 1,
                        page: 1,
                        depth,
                    },
                )
                .await
                .map(|page| page.docs.into_iter().next()),
        };

        match found {
            Ok(doc) => Ok(doc.map(|d| self.shape(model_key, d, &plan))),
            Err(err) => self.fail("FIND_ONE", &collection.slug, &filter.to_json(), started, err, None),
        }
    }

    async fn find_many(&self, model: &str, query: FindManyQuery) -> AdapterResult<Vec<Value>> {
        let started = Instant::now();
        let store = self.source.resolve();
        let collection = self.resolve_collection(store.as_ref(), model)?;
        let model_key = self.registry.resolve_model_key(model);
        self.log_op("FIND_MANY", model, &collection.slug);

        let limit = query
            .limit
            .unwrap_or(self.config.default_find_many_limit)
            .max(1);
        let offset = query.offset.unwrap_or(0).max(0);
        let filter = self.compile(model_key, &query.where_clauses);
        let (joins, plan) = self.plan_joins(&collection, query.join.as_ref());
        let select = self.select_fields(model_key, query.select.as_deref(), &plan);
        let depth = self.config.read_depth;

        if let Some(id) = where_clause::single_id(&filter) {
            return match store
                .find_by_id(&collection.slug, &id, select.as_deref(), &joins, depth)
                .await
            {
                Ok(doc) => Ok(std::iter::once(doc)
                    .skip(offset as usize)
                    .take(limit as usize)
                    .map(|d| self.shape(model_key, d, &plan))
                    .collect()),
                Err(err) => {
                    self.fail("FIND_MANY", &collection.slug, &filter.to_json(), started, err, Vec::new())
                }
            };
        }

        // Page-based store: fetch enough rows from the page containing
        // `offset` to cover it, then drop the leading remainder.
        let page = offset / limit + 1;
        let remainder = offset % limit;
        let args = FindArgs {
            filter: filter.clone(),
            select,
            sort: query.sort_by.as_ref().map(|s| self.sort_field(model_key, s)),
            joins,
            limit: limit.saturating_add(remainder),
            page,
            depth,
        };

        match store.find(&collection.slug, args).await {
            Ok(result) => Ok(result
                .docs
                .into_iter()
                .skip(remainder as usize)
                .take(limit as usize)
                .map(|d| self.shape(model_key, d, &plan))
                .collect()),
            Err(err) => {
                self.fail("FIND_MANY", &collection.slug, &filter.to_json(), started, err, Vec::new())
            }
        }
    }

    async fn count(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<i64> {
        let started = Instant::now();
        let store = self.source.resolve();
        let collection = self.resolve_collection(store.as_ref(), model)?;
        let model_key = self.registry.resolve_model_key(model);
        self.log_op("COUNT", model, &collection.slug);

        let filter = self.compile(model_key, where_clauses);
        match store.count(&collection.slug, &filter).await {
            Ok(total) => Ok(total),
            Err(err) => self.fail("COUNT", &collection.slug, &filter.to_json(), started, err, 0),
        }
    }

    async fn update(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: Value,
    ) -> AdapterResult<Option<Value>> {
        let started = Instant::now();
        let store = self.source.resolve();
        let collection = self.resolve_collection(store.as_ref(), model)?;
        let model_key = self.registry.resolve_model_key(model);
        self.log_op("UPDATE", model, &collection.slug);

        let filter = self.compile(model_key, where_clauses);
        let doc = self.transformer().input(model_key, &data);
        match store
            .update(&collection.slug, Self::target(&filter), doc.clone(), self.config.write_depth)
            .await
        {
            Ok(written) => Ok(written
                .into_docs()
                .into_iter()
                .next()
                .map(|d| self.transformer().output(model_key, d))),
            Err(err) => {
                let context = json!({ "where": filter, "data": doc });
                self.fail("UPDATE", &collection.slug, &context, started, err, None)
            }
        }
    }

    async fn update_many(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: Value,
    ) -> AdapterResult<i64> {
        let started = Instant::now();
        let store = self.source.resolve();
        let collection = self.resolve_collection(store.as_ref(), model)?;
        let model_key = self.registry.resolve_model_key(model);
        self.log_op("UPDATE_MANY", model, &collection.slug);

        let filter = self.compile(model_key, where_clauses);
        let doc = self.transformer().input(model_key, &data);
        match store
            .update(
                &collection.slug,
                Target::Where(filter.clone()),
                doc.clone(),
                self.config.write_depth,
            )
            .await
        {
            Ok(written) => Ok(written.into_docs().len() as i64),
            Err(err) => {
                let context = json!({ "where": filter, "data": doc });
                self.fail("UPDATE_MANY", &collection.slug, &context, started, err, 0)
            }
        }
    }

    async fn delete(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<()> {
        let started = Instant::now();
        let store = self.source.resolve();
        let collection = self.resolve_collection(store.as_ref(), model)?;
        let model_key = self.registry.resolve_model_key(model);
        self.log_op("DELETE", model, &collection.slug);

        let filter = self.compile(model_key, where_clauses);
        match store
            .delete(&collection.slug, Self::target(&filter), self.config.write_depth)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => self.fail("DELETE", &collection.slug, &filter.to_json(), started, err, ()),
        }
    }

    async fn delete_many(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<i64> {
        let started = Instant::now();
        let store = self.source.resolve();
        let collection = self.resolve_collection(store.as_ref(), model)?;
        let model_key = self.registry.resolve_model_key(model);
        self.log_op("DELETE_MANY", model, &collection.slug);

        let filter = self.compile(model_key, where_clauses);
        match store
            .delete(
                &collection.slug,
                Target::Where(filter.clone()),
                self.config.write_depth,
            )
            .await
        {
            Ok(written) => Ok(written.into_docs().len() as i64),
            Err(err) => self.fail("DELETE_MANY", &collection.slug, &filter.to_json(), started, err, 0),
        }
    }

    async fn create_schema(
        &self,
        schema: &AuthSchema,
        options: &SchemaOptions,
    ) -> AdapterResult<SchemaStatus> {
        let registry = CollectionSchemaMap::build_default(schema, &self.config.models)?;
        let existing = self.source.resolve().collections();
        let missing = registry
            .models_ordered()
            .into_iter()
            .filter(|model| {
                !existing.iter().any(|c| {
                    c.model_key.as_deref() == Some(model.model_key.as_str())
                        || c.slug == model.collection_slug
                })
            })
            .count();

        if missing == 0 && options.file.is_none() {
            return Ok(SchemaStatus::UpToDate);
        }

        let statements = schema_gen::render_collections(&registry);
        if let Some(path) = &options.file {
            let artifact = Value::Array(schema_gen::collection_definitions(&registry));
            tokio::fs::write(path, format!("{artifact:#}\n")).await?;
            tracing::info!(
                "[Payload Adapter] wrote {} collection definitions to {}",
                statements.len(),
                path.display()
            );
        }
        Ok(SchemaStatus::NeedsMigration { statements })
    }

    async fn begin_transaction(&self) -> AdapterResult<Box<dyn TransactionAdapter>> {
        if self.config.debug_logs {
            tracing::debug!("[Payload Adapter] BEGIN (passthrough)");
        }
        Ok(Box::new(PayloadTransaction {
            adapter: self.clone(),
        }))
    }
}

// ─── Transaction Adapter ─────────────────────────────────────────

/// Passthrough transaction. Operations are applied to the store immediately;
/// commit and rollback only end the scope.
#[derive(Debug, Clone)]
pub struct PayloadTransaction {
    adapter: PayloadAdapter,
}

#[async_trait]
impl Adapter for PayloadTransaction {
    async fn create(
        &self,
        model: &str,
        data: Value,
        select: Option<&[String]>,
    ) -> AdapterResult<Option<Value>> {
        self.adapter.create(model, data, select).await
    }

    async fn find_one(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        select: Option<&[String]>,
        join: Option<&JoinOption>,
    ) -> AdapterResult<Option<Value>> {
        self.adapter.find_one(model, where_clauses, select, join).await
    }

    async fn find_many(&self, model: &str, query: FindManyQuery) -> AdapterResult<Vec<Value>> {
        self.adapter.find_many(model, query).await
    }

    async fn count(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<i64> {
        self.adapter.count(model, where_clauses).await
    }

    async fn update(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: Value,
    ) -> AdapterResult<Option<Value>> {
        self.adapter.update(model, where_clauses, data).await
    }

    async fn update_many(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: Value,
    ) -> AdapterResult<i64> {
        self.adapter.update_many(model, where_clauses, data).await
    }

    async fn delete(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<()> {
        self.adapter.delete(model, where_clauses).await
    }

    async fn delete_many(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<i64> {
        self.adapter.delete_many(model, where_clauses).await
    }

    async fn create_schema(
        &self,
        schema: &AuthSchema,
        options: &SchemaOptions,
    ) -> AdapterResult<SchemaStatus> {
        self.adapter.create_schema(schema, options).await
    }

    async fn begin_transaction(&self) -> AdapterResult<Box<dyn TransactionAdapter>> {
        self.adapter.begin_transaction().await
    }
}

#[async_trait]
impl TransactionAdapter for PayloadTransaction {
    async fn commit(self: Box<Self>) -> AdapterResult<()> {
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AdapterResult<()> {
        tracing::warn!("[Payload Adapter] rollback requested; writes were already applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use better_auth_core::db::adapter::JoinConfig;

    use crate::config::{IdType, ModelOverride};
    use crate::memory_store::MemoryDocumentStore;

    fn adapter() -> (PayloadAdapter, Arc<MemoryDocumentStore>) {
        let config = PayloadAdapterConfig::default()
            .with_id_type(IdType::Number)
            .with_model("session", ModelOverride::slug("sessions").field("userId", "user"));
        let registry =
            CollectionSchemaMap::build_default(&AuthSchema::core_schema(), &config.models).unwrap();
        let store = Arc::new(MemoryDocumentStore::from_registry(&registry, IdType::Number));
        let adapter = PayloadAdapter::from_store(store.clone(), config, &AuthSchema::core_schema()).unwrap();
        (adapter, store)
    }

    #[test]
    fn test_from_store_is_clean() {
        let (adapter, _) = adapter();
        assert!(adapter.sync_report().is_clean());
        assert_eq!(adapter.registry().resolve_collection_slug("session"), "sessions");
    }

    #[test]
    fn test_select_fields_keeps_id() {
        let (adapter, _) = adapter();
        let select = vec!["userId".to_string(), "token".to_string()];
        let names = adapter.select_fields("session", Some(&select), &JoinPlan::new()).unwrap();
        assert_eq!(names, vec!["user", "token", "id"]);
        assert!(adapter.select_fields("session", None, &JoinPlan::new()).is_none());
    }

    #[test]
    fn test_sort_field() {
        let (adapter, _) = adapter();
        assert_eq!(adapter.sort_field("session", &SortBy::desc("userId")), "-user");
        assert_eq!(adapter.sort_field("session", &SortBy::asc("expiresAt")), "expiresAt");
    }

    #[test]
    fn test_plan_joins_skips_undeclared() {
        let (adapter, store) = adapter();
        let user = store.collection("user").unwrap();
        let mut join = JoinOption::new();
        join.insert("session".into(), JoinConfig::Options { limit: Some(3) });
        join.insert("verification".into(), JoinConfig::Enabled(true));
        join.insert("account".into(), JoinConfig::Enabled(false));
        let (args, plan) = adapter.plan_joins(&user, Some(&join));
        assert_eq!(args.len(), 1);
        assert_eq!(args["sessions"].limit, Some(3));
        assert_eq!(plan, vec![("session".to_string(), "sessions".to_string())]);
    }

    #[tokio::test]
    async fn test_unknown_collection_is_config_error() {
        let (adapter, _) = adapter();
        let err = adapter.count("passkey", &[]).await.unwrap_err();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_transaction_passthrough() {
        let (adapter, store) = adapter();
        let created = adapter
            .transaction(|tx| async move {
                tx.create("verification", json!({"identifier": "a", "value": "b", "expiresAt": "2030-01-01T00:00:00Z"}), None)
                    .await
            })
            .await
            .unwrap();
        assert_eq!(created.unwrap()["id"], "1");
        assert_eq!(store.documents("verification").await.len(), 1);

        let tx = adapter.begin_transaction().await.unwrap();
        assert_eq!(tx.count("verification", &[]).await.unwrap(), 1);
        tx.rollback().await.unwrap();
    }
}
