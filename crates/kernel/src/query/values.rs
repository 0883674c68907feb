//! Known values of a field, for populating filter UIs.
//!
//! Never fails: unsupported fields and store errors yield an empty list.

use std::sync::Arc;

use sift_sdk::{FieldDefinition, FieldDefinitionValue, FieldType, ValueSourceType};
use tracing::{error, warn};

use super::store::{EntityStore, Projection};

/// Maximum number of distinct values read from the store.
pub const MAX_DISTINCT_VALUES: u64 = 1000;

pub struct FieldValueProvider<S> {
    store: Arc<S>,
}

impl<S: EntityStore> FieldValueProvider<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Values of `field`, read from `table` for database-sourced fields.
    pub async fn values(&self, table: &str, field: &FieldDefinition) -> FieldDefinitionValue {
        let values = match field.value_source_type {
            ValueSourceType::Database => self.database_values(table, field).await,
            ValueSourceType::Enum => enum_values(field),
        };
        FieldDefinitionValue::new(&field.name, values)
    }

    async fn database_values(&self, table: &str, field: &FieldDefinition) -> Vec<String> {
        let projection = match field.field_type {
            FieldType::String => Projection::Raw,
            FieldType::Integer | FieldType::DateString => Projection::Text,
            FieldType::Boolean => {
                warn!(
                    field = %field.name,
                    field_type = ?field.field_type,
                    "unsupported field type for database values"
                );
                return Vec::new();
            }
        };

        match self
            .store
            .distinct_values(table, &field.entity_path, projection, MAX_DISTINCT_VALUES)
            .await
        {
            Ok(values) => values
                .into_iter()
                .filter(|v| !v.trim().is_empty())
                .collect(),
            Err(e) => {
                error!(
                    field = %field.name,
                    table,
                    error = %e,
                    "failed to retrieve field values"
                );
                Vec::new()
            }
        }
    }
}

fn enum_values(field: &FieldDefinition) -> Vec<String> {
    match field.enum_class {
        Some(enum_class) => enum_class.values(),
        None => {
            warn!(field = %field.name, "enum-sourced field has no enum class");
            Vec::new()
        }
    }
}
