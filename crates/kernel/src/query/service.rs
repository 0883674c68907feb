//! Query service.
//!
//! One service per entity type. It registers the entity's fields on first
//! use, compiles each request against the registry, and runs a single
//! over-fetched page query (`size + 1` rows) so `has_next` needs no count.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use sift_sdk::{FieldDefinition, FieldDefinitionValue, QueryRequest, Searchable, Slice};
use tracing::debug;

use super::compiler::FilterCompiler;
use super::detector;
use super::error::{QueryError, QueryResult};
use super::registry::{FieldCatalog, FieldRegistry};
use super::store::{EntityStore, FetchRequest, PredicateBuilder};
use super::values::FieldValueProvider;

/// Largest LIMIT or OFFSET a store accepts (PostgreSQL `bigint`).
pub const MAX_ROW_BOUND: u64 = i64::MAX.unsigned_abs();

/// Over-fetching `(limit, offset)` of a page, capped at [`MAX_ROW_BOUND`].
pub fn page_window(page: u64, size: u64) -> (u64, u64) {
    let limit = size.saturating_add(1).min(MAX_ROW_BOUND);
    let offset = page.saturating_mul(size).min(MAX_ROW_BOUND);
    (limit, offset)
}

pub struct QueryService<E, S> {
    registry: Arc<FieldRegistry>,
    store: Arc<S>,
    values: FieldValueProvider<S>,
    /// Appended to the detected fields at registration.
    custom_fields: Vec<FieldDefinition>,
    /// Physical path and direction, used when a request has no sorts.
    default_order: Vec<(String, bool)>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S> QueryService<E, S>
where
    E: Searchable + DeserializeOwned,
    S: EntityStore,
{
    pub fn new(registry: Arc<FieldRegistry>, store: Arc<S>) -> Self {
        Self {
            registry,
            values: FieldValueProvider::new(Arc::clone(&store)),
            store,
            custom_fields: Vec::new(),
            default_order: Vec::new(),
            _entity: PhantomData,
        }
    }

    /// Register extra fields alongside the detected ones.
    pub fn with_custom_fields(mut self, fields: Vec<FieldDefinition>) -> Self {
        self.custom_fields.extend(fields);
        self
    }

    /// Order by a physical column when the request names no sorts.
    pub fn with_default_order(mut self, path: &str, ascending: bool) -> Self {
        self.default_order.push((path.to_string(), ascending));
        self
    }

    /// Run one search/filter/sort/paginate request.
    pub async fn query(&self, request: &QueryRequest) -> QueryResult<Slice<E>> {
        let page = request.normalized_page();
        let size = request.normalized_size();
        let catalog = self.catalog()?;
        let builder = self.store.predicates();
        let compiler = FilterCompiler::new(&catalog, builder);

        let mut clauses = Vec::new();
        if let Some(text) = request.search_text()
            && let Some(search) = compiler.search(text)
        {
            clauses.push(search);
        }
        if let Some(node) = &request.where_clause {
            clauses.push(compiler.compile(Some(node))?);
        }
        let predicate = builder.and(clauses);

        let order = if request.sorts.is_empty() {
            self.default_order
                .iter()
                .map(|(path, ascending)| builder.order_by(path, *ascending))
                .collect()
        } else {
            compiler.sorts(&request.sorts)?
        };

        let (limit, offset) = page_window(page, size);
        let fetch = FetchRequest {
            table: E::TABLE,
            predicate,
            order,
            limit,
            offset,
        };
        debug!(
            entity_type = %E::ENTITY_TYPE,
            page,
            size,
            "running query"
        );

        let rows = self.store.fetch(fetch).await.map_err(QueryError::Store)?;
        let entities = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<E>, _>>()
            .map_err(|e| {
                QueryError::Store(
                    anyhow::Error::new(e)
                        .context(format!("failed to decode {} row", E::ENTITY_TYPE)),
                )
            })?;

        Ok(Slice::from_overfetched(entities, page, size))
    }

    /// All registered fields, in registration order.
    pub fn fields(&self) -> QueryResult<Vec<FieldDefinition>> {
        Ok(self.catalog()?.fields().to_vec())
    }

    pub fn filterable_fields(&self) -> QueryResult<Vec<FieldDefinition>> {
        self.fields_where(|f| f.filterable)
    }

    pub fn searchable_fields(&self) -> QueryResult<Vec<FieldDefinition>> {
        self.fields_where(|f| f.searchable)
    }

    pub fn resolve_field(&self, name: &str) -> QueryResult<Option<FieldDefinition>> {
        Ok(self.catalog()?.resolve(name).cloned())
    }

    /// Known values of a field. An unknown name yields no values.
    pub async fn field_definition_values(&self, name: &str) -> QueryResult<FieldDefinitionValue> {
        let Some(field) = self.resolve_field(name)? else {
            return Ok(FieldDefinitionValue::empty(name));
        };
        Ok(self.values.values(E::TABLE, &field).await)
    }

    fn fields_where(
        &self,
        keep: impl Fn(&FieldDefinition) -> bool,
    ) -> QueryResult<Vec<FieldDefinition>> {
        Ok(self
            .catalog()?
            .fields()
            .iter()
            .filter(|f| keep(f))
            .cloned()
            .collect())
    }

    fn catalog(&self) -> QueryResult<Arc<FieldCatalog>> {
        self.registry.ensure_registered(E::ENTITY_TYPE, || {
            let mut fields = detector::detect::<E>();
            fields.extend(self.custom_fields.iter().cloned());
            fields
        })
    }
}
