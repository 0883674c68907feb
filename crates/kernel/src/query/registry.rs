//! Field registry.
//!
//! Per-entity-type catalog of field definitions with case-insensitive
//! resolution by canonical name or synonym. A catalog is built once, then
//! published as an immutable `Arc` so readers never lock.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use sift_sdk::{EntityType, FieldDefinition};
use tracing::{debug, info, warn};

use super::error::{QueryError, QueryResult};

/// Immutable field catalog of one entity type.
#[derive(Debug, Default)]
pub struct FieldCatalog {
    fields: Vec<FieldDefinition>,
    /// Lower-cased name or synonym to index in `fields`.
    by_name: HashMap<String, usize>,
}

impl FieldCatalog {
    fn build(fields: Vec<FieldDefinition>) -> Self {
        let mut by_name = HashMap::new();

        for (index, field) in fields.iter().enumerate() {
            let names = std::iter::once(&field.name).chain(field.synonyms.iter());
            for name in names {
                let key = name.to_lowercase();
                if let Some(previous) = by_name.insert(key, index)
                    && previous != index
                {
                    warn!(
                        entity_type = %field.entity_type,
                        name = %name,
                        replaced = %fields[previous].name,
                        by = %field.name,
                        "field name collision; later field wins"
                    );
                }
            }
        }

        Self { fields, by_name }
    }

    /// Definitions in registration order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Case-insensitive lookup by canonical name or synonym.
    pub fn resolve(&self, name: &str) -> Option<&FieldDefinition> {
        self.by_name
            .get(&name.to_lowercase())
            .and_then(|&index| self.fields.get(index))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Registry of field catalogs, keyed by entity type.
///
/// Shared behind an `Arc` by every query service. Reads go through the
/// `DashMap` without locking; populating a catalog holds `registration` for
/// the whole check-then-insert sequence so concurrent first access detects
/// and registers exactly once.
#[derive(Default)]
pub struct FieldRegistry {
    catalogs: DashMap<EntityType, Arc<FieldCatalog>>,
    registration: Mutex<()>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the fields of an entity type.
    ///
    /// Does nothing when `fields` is empty or the type is already populated.
    /// Fails without registering anything if any field belongs to a
    /// different entity type.
    pub fn register_fields(
        &self,
        entity_type: EntityType,
        fields: Vec<FieldDefinition>,
    ) -> QueryResult<()> {
        let _guard = self.registration.lock();
        self.register_locked(entity_type, fields)
    }

    /// Return the catalog for `entity_type`, running `detect` to populate it
    /// on first access.
    pub fn ensure_registered<F>(
        &self,
        entity_type: EntityType,
        detect: F,
    ) -> QueryResult<Arc<FieldCatalog>>
    where
        F: FnOnce() -> Vec<FieldDefinition>,
    {
        if let Some(catalog) = self.populated(entity_type) {
            return Ok(catalog);
        }

        let _guard = self.registration.lock();
        if let Some(catalog) = self.populated(entity_type) {
            return Ok(catalog);
        }

        self.register_locked(entity_type, detect())?;
        Ok(self.catalog(entity_type))
    }

    /// The catalog for `entity_type`, empty if nothing is registered.
    pub fn catalog(&self, entity_type: EntityType) -> Arc<FieldCatalog> {
        self.populated(entity_type).unwrap_or_default()
    }

    /// Registered definitions in insertion order.
    pub fn fields(&self, entity_type: EntityType) -> Vec<FieldDefinition> {
        self.catalog(entity_type).fields().to_vec()
    }

    pub fn resolve(&self, entity_type: EntityType, name: &str) -> Option<FieldDefinition> {
        self.populated(entity_type)?.resolve(name).cloned()
    }

    pub fn is_registered(&self, entity_type: EntityType) -> bool {
        self.populated(entity_type).is_some()
    }

    fn populated(&self, entity_type: EntityType) -> Option<Arc<FieldCatalog>> {
        self.catalogs
            .get(&entity_type)
            .map(|entry| Arc::clone(entry.value()))
            .filter(|catalog| !catalog.is_empty())
    }

    /// Caller must hold `registration`.
    fn register_locked(
        &self,
        entity_type: EntityType,
        fields: Vec<FieldDefinition>,
    ) -> QueryResult<()> {
        if fields.is_empty() {
            debug!(%entity_type, "no fields to register");
            return Ok(());
        }
        if self.populated(entity_type).is_some() {
            debug!(%entity_type, "fields already registered");
            return Ok(());
        }

        if let Some(field) = fields.iter().find(|f| f.entity_type != entity_type) {
            return Err(QueryError::EntityTypeMismatch {
                field: field.name.clone(),
                declared: field.entity_type,
                target: entity_type,
            });
        }

        let catalog = FieldCatalog::build(fields);
        info!(%entity_type, count = catalog.len(), "registered fields");
        self.catalogs.insert(entity_type, Arc::new(catalog));
        Ok(())
    }
}
