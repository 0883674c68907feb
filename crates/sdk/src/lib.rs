//! Sift SDK
//!
//! Types shared between the query engine and the code that declares entities:
//! the query DSL (`QueryRequest`, `FilterNode`, ...), field capability
//! descriptors, and the metadata traits produced by the derive macros.

// Derive output refers to `::sift_sdk`; make that path valid inside this crate too.
extern crate self as sift_sdk;

pub mod filter;
pub mod types;

pub use filter::{Filter, FilterNode, LogicalOperator, Operation, QueryRequest, SortSpec};
pub use types::{
    ClosedSet, DeclaredField, DeclaresFields, EntityType, EnumClass, FieldCapability,
    FieldDefinition, FieldDefinitionValue, FieldType, Searchable, Slice, ValueSourceType,
};

// Re-export proc macros
pub use sift_sdk_macros::{ClosedSet, Searchable};

pub mod prelude {
    pub use crate::filter::*;
    pub use crate::types::*;
    pub use crate::{ClosedSet, Searchable};
}
